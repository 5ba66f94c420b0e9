use super::config::ConfigError;
use crate::core::container::side::Side;
use std::fmt;
use std::str::FromStr;

/// Behavior of one face of the simulation box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryCondition {
    /// Particles crossing the face are deleted.
    #[default]
    Outflow,
    /// Particles close to the face are pushed back by a mirrored ghost particle.
    Reflective,
    /// Particles crossing the face re-enter through the opposite face, and pairs
    /// interact across it.
    Periodic,
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryCondition::Outflow => "outflow",
            BoundaryCondition::Reflective => "reflective",
            BoundaryCondition::Periodic => "periodic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BoundaryCondition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outflow" => Ok(BoundaryCondition::Outflow),
            "reflective" | "reflecting" => Ok(BoundaryCondition::Reflective),
            "periodic" => Ok(BoundaryCondition::Periodic),
            _ => Err(()),
        }
    }
}

/// One [`BoundaryCondition`] per [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryConditions([BoundaryCondition; 6]);

impl BoundaryConditions {
    /// Conditions indexed by [`Side::index`].
    pub fn new(conditions: [BoundaryCondition; 6]) -> Self {
        Self(conditions)
    }

    pub fn uniform(condition: BoundaryCondition) -> Self {
        Self([condition; 6])
    }

    pub fn get(&self, side: Side) -> BoundaryCondition {
        self.0[side.index()]
    }

    pub fn set(&mut self, side: Side, condition: BoundaryCondition) {
        self.0[side.index()] = condition;
    }

    pub fn with(mut self, side: Side, condition: BoundaryCondition) -> Self {
        self.set(side, condition);
        self
    }

    /// Iterates over `(side, condition)` for the sides active in `dimensions`.
    pub fn active(&self, dimensions: usize) -> impl Iterator<Item = (Side, BoundaryCondition)> + '_ {
        Side::ALL
            .into_iter()
            .filter(move |side| side.axis() < dimensions)
            .map(move |side| (side, self.get(side)))
    }

    /// Returns `true` if any side active in `dimensions` uses `condition`.
    pub fn any(&self, condition: BoundaryCondition, dimensions: usize) -> bool {
        self.active(dimensions).any(|(_, c)| c == condition)
    }

    /// Per axis, whether the axis wraps around.
    pub fn periodic_axes(&self, dimensions: usize) -> [bool; 3] {
        let mut axes = [false; 3];
        for (axis, periodic) in axes.iter_mut().enumerate().take(dimensions) {
            let lower = self.0[2 * axis];
            *periodic = lower == BoundaryCondition::Periodic;
        }
        axes
    }

    /// Checks that periodic faces come in opposite pairs on every active axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnpairedPeriodic`] naming the first offending axis.
    pub fn validate(&self, dimensions: usize) -> Result<(), ConfigError> {
        for axis in 0..dimensions.min(3) {
            let lower = self.0[2 * axis] == BoundaryCondition::Periodic;
            let upper = self.0[2 * axis + 1] == BoundaryCondition::Periodic;
            if lower != upper {
                return Err(ConfigError::UnpairedPeriodic {
                    axis: ['x', 'y', 'z'][axis],
                });
            }
        }
        Ok(())
    }
}
