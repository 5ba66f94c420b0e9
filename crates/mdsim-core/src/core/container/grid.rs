use super::error::ContainerError;
use super::side::Side;
use itertools::iproduct;
use nalgebra::Vector3;

/// Half of the 26 neighbor offsets of a cell, chosen so that for every pair of adjacent
/// cells exactly one of the two sees the other as a forward neighbor.
///
/// The first four entries lie in the `dz == 0` plane and form the 2D subset.
static FORWARD_OFFSETS: [[isize; 3]; 13] = [
    [1, 0, 0],
    [-1, 1, 0],
    [0, 1, 0],
    [1, 1, 0],
    [-1, -1, 1],
    [0, -1, 1],
    [1, -1, 1],
    [-1, 0, 1],
    [0, 0, 1],
    [1, 0, 1],
    [-1, 1, 1],
    [0, 1, 1],
    [1, 1, 1],
];
const PLANAR_FORWARD_OFFSETS: usize = 4;

/// A domain cell whose forward neighbor lies outside the domain, paired with the domain
/// cell that neighbor becomes once wrapped around the periodic faces it crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicRelation {
    pub cell: usize,
    pub partner: usize,
    /// Per axis: `-1` if the neighbor lies below the domain, `1` if above, `0` if inside.
    pub wrap: [i8; 3],
}

impl PeriodicRelation {
    /// Whether every axis crossed by this relation wraps around.
    #[inline]
    pub fn is_active(&self, periodic_axes: [bool; 3]) -> bool {
        (0..3).all(|axis| self.wrap[axis] == 0 || periodic_axes[axis])
    }

    /// Translation that moves a particle of `partner` to its image next to `cell`.
    #[inline]
    pub fn shift(&self, domain_size: [f64; 3]) -> Vector3<f64> {
        Vector3::from_fn(|axis, _| f64::from(self.wrap[axis]) * domain_size[axis])
    }
}

/// Geometry and precomputed index tables of a flattened linked-cells grid.
///
/// The grid covers the domain `[0, extent)` on every axis with one layer of halo cells
/// on each side. Cells are stored in a single sequence indexed by
/// `x + nX·y + nX·nY·z`. A domain with a z extent of exactly zero is two-dimensional:
/// it has a single z layer and no halo on the front/back sides.
///
/// All index tables are built once in [`CellGrid::new`] and never change afterwards.
#[derive(Debug, Clone)]
pub struct CellGrid {
    domain_size: [f64; 3],
    cutoff_radius: f64,
    dims: [usize; 3],
    cell_size: [f64; 3],
    two_dimensional: bool,
    /// Outermost cell layer per side, indexed by [`Side::index`].
    halo_cells: [Vec<usize>; 6],
    /// Innermost non-halo layer per side, indexed by [`Side::index`].
    boundary_cells: [Vec<usize>; 6],
    /// Per domain cell: its own index followed by its forward neighbors inside the domain.
    iteration_scheme: Vec<Vec<usize>>,
    /// Domain cells in iteration order.
    domain_cells: Vec<usize>,
    /// Forward neighbor relations that cross at least one face, edge or corner.
    periodic_relations: Vec<PeriodicRelation>,
    halo_mask: Vec<bool>,
}

impl CellGrid {
    /// Builds the grid for the given domain and cutoff radius.
    ///
    /// Each axis receives `floor(extent / cutoff) + 2` cells, with at least one
    /// interior cell even when the extent is smaller than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidCutoff`] for a non-positive or NaN cutoff and
    /// [`ContainerError::InvalidDomain`] for negative, NaN or infinite extents, or when the
    /// x or y extent is zero.
    pub fn new(domain_size: [f64; 3], cutoff_radius: f64) -> Result<Self, ContainerError> {
        if !(cutoff_radius > 0.0) || cutoff_radius.is_infinite() {
            return Err(ContainerError::InvalidCutoff(cutoff_radius));
        }
        if domain_size.iter().any(|e| e.is_nan() || *e < 0.0) {
            return Err(ContainerError::InvalidDomain {
                domain_size,
                reason: "extents must be non-negative numbers",
            });
        }
        if domain_size.iter().any(|e| e.is_infinite()) {
            return Err(ContainerError::InvalidDomain {
                domain_size,
                reason: "extents must be finite",
            });
        }
        if domain_size[0] == 0.0 || domain_size[1] == 0.0 {
            return Err(ContainerError::InvalidDomain {
                domain_size,
                reason: "only the z extent may be zero",
            });
        }

        let two_dimensional = domain_size[2] == 0.0;
        let mut dims = [1usize; 3];
        let mut cell_size = [0.0; 3];
        for axis in 0..3 {
            if axis == 2 && two_dimensional {
                continue;
            }
            let interior = ((domain_size[axis] / cutoff_radius).floor() as usize).max(1);
            dims[axis] = interior + 2;
            cell_size[axis] = domain_size[axis] / interior as f64;
        }

        let mut grid = Self {
            domain_size,
            cutoff_radius,
            dims,
            cell_size,
            two_dimensional,
            halo_cells: Default::default(),
            boundary_cells: Default::default(),
            iteration_scheme: Vec::new(),
            domain_cells: Vec::new(),
            periodic_relations: Vec::new(),
            halo_mask: vec![false; dims[0] * dims[1] * dims[2]],
        };
        grid.precompute_halo_cells();
        grid.precompute_boundary_cells();
        grid.precompute_iteration_scheme();
        grid.precompute_periodic_relations();
        Ok(grid)
    }

    #[inline]
    pub fn three_d_to_one_d(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * y + self.dims[0] * self.dims[1] * z
    }

    #[inline]
    pub fn one_d_to_three_d(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Maps a position to the index of the cell that owns it.
    ///
    /// Coordinates below zero or at/above the extent of an axis clamp to that axis's
    /// halo layer. In a two-dimensional grid the z coordinate is ignored.
    ///
    /// # Return
    ///
    /// Returns `None` if any coordinate is NaN.
    #[inline]
    pub fn cell_index(&self, position: &Vector3<f64>) -> Option<usize> {
        if position.iter().any(|c| c.is_nan()) {
            return None;
        }
        Some(self.three_d_to_one_d(
            self.axis_cell(0, position.x),
            self.axis_cell(1, position.y),
            self.axis_cell(2, position.z),
        ))
    }

    #[inline]
    fn axis_cell(&self, axis: usize, coord: f64) -> usize {
        if axis == 2 && self.two_dimensional {
            return 0;
        }
        let n = self.dims[axis];
        if coord < 0.0 {
            0
        } else if coord >= self.domain_size[axis] {
            n - 1
        } else {
            ((coord / self.cell_size[axis]) as usize + 1).min(n - 2)
        }
    }

    /// Inclusive range of interior cell coordinates along an axis.
    #[inline]
    fn interior_range(&self, axis: usize) -> (usize, usize) {
        if axis == 2 && self.two_dimensional {
            (0, 0)
        } else {
            (1, self.dims[axis] - 2)
        }
    }

    fn is_halo_coords(&self, coords: [usize; 3]) -> bool {
        (0..3).any(|axis| {
            let (lo, hi) = self.interior_range(axis);
            coords[axis] < lo || coords[axis] > hi
        })
    }

    fn precompute_halo_cells(&mut self) {
        let [nx, ny, nz] = self.dims;
        for (z, y, x) in iproduct!(0..nz, 0..ny, 0..nx) {
            let index = self.three_d_to_one_d(x, y, z);
            let coords = [x, y, z];
            for side in Side::ALL {
                let axis = side.axis();
                if axis == 2 && self.two_dimensional {
                    continue;
                }
                let layer = if side.is_lower() { 0 } else { self.dims[axis] - 1 };
                if coords[axis] == layer {
                    self.halo_cells[side.index()].push(index);
                }
            }
            let halo = self.is_halo_coords(coords);
            self.halo_mask[index] = halo;
        }
    }

    fn precompute_boundary_cells(&mut self) {
        let [nx, ny, nz] = self.dims;
        for (z, y, x) in iproduct!(0..nz, 0..ny, 0..nx) {
            let coords = [x, y, z];
            if self.is_halo_coords(coords) {
                continue;
            }
            let index = self.three_d_to_one_d(x, y, z);
            for side in Side::ALL {
                let axis = side.axis();
                if axis == 2 && self.two_dimensional {
                    continue;
                }
                let (lo, hi) = self.interior_range(axis);
                let layer = if side.is_lower() { lo } else { hi };
                if coords[axis] == layer {
                    self.boundary_cells[side.index()].push(index);
                }
            }
        }
    }

    fn forward_offsets(&self) -> &'static [[isize; 3]] {
        if self.two_dimensional {
            &FORWARD_OFFSETS[..PLANAR_FORWARD_OFFSETS]
        } else {
            &FORWARD_OFFSETS[..]
        }
    }

    fn precompute_iteration_scheme(&mut self) {
        let offsets = self.forward_offsets();
        let [nx, ny, nz] = self.dims;
        for (z, y, x) in iproduct!(0..nz, 0..ny, 0..nx) {
            if self.is_halo_coords([x, y, z]) {
                continue;
            }
            let index = self.three_d_to_one_d(x, y, z);
            let mut group = Vec::with_capacity(offsets.len() + 1);
            group.push(index);
            for offset in offsets {
                if let Some(neighbor) = self.offset_coords([x, y, z], *offset) {
                    if !self.is_halo_coords(neighbor) {
                        group.push(self.three_d_to_one_d(neighbor[0], neighbor[1], neighbor[2]));
                    }
                }
            }
            self.domain_cells.push(index);
            self.iteration_scheme.push(group);
        }
    }

    /// Wraps every forward neighbor that leaves the domain. Together with the iteration
    /// scheme this lists each pair of cells adjacent on the torus exactly once.
    fn precompute_periodic_relations(&mut self) {
        let mut relations = Vec::new();
        for &cell in &self.domain_cells {
            let coords = self.one_d_to_three_d(cell);
            for offset in self.forward_offsets() {
                let mut partner = [0usize; 3];
                let mut wrap = [0i8; 3];
                for axis in 0..3 {
                    let (lo, hi) = self.interior_range(axis);
                    let value = coords[axis] as isize + offset[axis];
                    partner[axis] = if value < lo as isize {
                        wrap[axis] = -1;
                        hi
                    } else if value > hi as isize {
                        wrap[axis] = 1;
                        lo
                    } else {
                        value as usize
                    };
                }
                if wrap != [0; 3] {
                    relations.push(PeriodicRelation {
                        cell,
                        partner: self.three_d_to_one_d(partner[0], partner[1], partner[2]),
                        wrap,
                    });
                }
            }
        }
        self.periodic_relations = relations;
    }

    fn offset_coords(&self, coords: [usize; 3], offset: [isize; 3]) -> Option<[usize; 3]> {
        let mut result = [0usize; 3];
        for axis in 0..3 {
            let value = coords[axis] as isize + offset[axis];
            if value < 0 || value >= self.dims[axis] as isize {
                return None;
            }
            result[axis] = value as usize;
        }
        Some(result)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_count(&self) -> usize {
        self.halo_mask.len()
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    pub fn domain_size(&self) -> [f64; 3] {
        self.domain_size
    }

    pub fn cutoff_radius(&self) -> f64 {
        self.cutoff_radius
    }

    pub fn is_two_dimensional(&self) -> bool {
        self.two_dimensional
    }

    /// Number of spatial dimensions simulated (2 or 3).
    pub fn dimensions(&self) -> usize {
        if self.two_dimensional { 2 } else { 3 }
    }

    pub fn halo_cells(&self, side: Side) -> &[usize] {
        &self.halo_cells[side.index()]
    }

    pub fn boundary_cells(&self, side: Side) -> &[usize] {
        &self.boundary_cells[side.index()]
    }

    pub fn iteration_scheme(&self) -> &[Vec<usize>] {
        &self.iteration_scheme
    }

    pub fn domain_cells(&self) -> &[usize] {
        &self.domain_cells
    }

    pub fn periodic_relations(&self) -> &[PeriodicRelation] {
        &self.periodic_relations
    }

    #[inline]
    pub fn is_halo(&self, index: usize) -> bool {
        self.halo_mask[index]
    }
}
