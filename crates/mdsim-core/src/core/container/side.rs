use std::fmt;
use std::str::FromStr;

/// One of the six faces of the simulation box.
///
/// `Left`/`Right` bound the x axis, `Bottom`/`Top` the y axis and `Front`/`Back` the
/// z axis; the first of each pair lies at coordinate zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 6] = [
        Side::Left,
        Side::Right,
        Side::Bottom,
        Side::Top,
        Side::Front,
        Side::Back,
    ];

    /// Position of the side in [`Side::ALL`], used to index per-side tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis perpendicular to the face (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// `true` for the face at coordinate zero.
    #[inline]
    pub fn is_lower(self) -> bool {
        self.index() % 2 == 0
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Top => "top",
            Side::Front => "front",
            Side::Back => "back",
        };
        f.write_str(name)
    }
}

impl FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            "bottom" => Ok(Side::Bottom),
            "top" => Ok(Side::Top),
            "front" => Ok(Side::Front),
            "back" => Ok(Side::Back),
            _ => Err(()),
        }
    }
}
