use super::error::ContainerError;
use super::grid::CellGrid;
use super::side::Side;
use super::{NeighborKind, ParticleContainer, for_each_pair_in, pair_mut};
use crate::core::models::ids::ParticleId;
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Position of a particle inside the cell storage: `(cell index, slot in cell)`.
type Slot = (usize, usize);

/// Linked-cells particle container.
///
/// Particles are bucketed into cells of side length at least the cutoff radius, so that
/// every interacting pair lives in the same cell or in two adjacent cells. Pair iteration
/// then only touches each cell and its forward neighbors, which makes a force sweep
/// linear in the number of particles.
///
/// Particles that leave the domain are kept in the surrounding halo layer until a
/// boundary condition removes ([`clear_halo_cells`](Self::clear_halo_cells)) or wraps
/// ([`teleport_halo_particles`](Self::teleport_halo_particles)) them.
#[derive(Debug, Clone)]
pub struct LinkedCellsContainer {
    grid: CellGrid,
    cells: Vec<Vec<Particle>>,
    particle_count: usize,
}

impl LinkedCellsContainer {
    /// Creates an empty container covering `[0, domain_size)` with the given cutoff.
    ///
    /// # Errors
    ///
    /// Propagates grid validation failures, see [`CellGrid::new`].
    pub fn new(domain_size: [f64; 3], cutoff_radius: f64) -> Result<Self, ContainerError> {
        let grid = CellGrid::new(domain_size, cutoff_radius)?;
        let cells = vec![Vec::new(); grid.cell_count()];
        debug!(
            dims = ?grid.dims(),
            cell_size = ?grid.cell_size(),
            dimensions = grid.dimensions(),
            "Linked-cells grid created."
        );
        Ok(Self {
            grid,
            cells,
            particle_count: 0,
        })
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Particles currently stored in the cell with the given flattened index.
    pub fn cell(&self, index: usize) -> &[Particle] {
        &self.cells[index]
    }

    fn locate(&self, particle: &Particle) -> Result<usize, ContainerError> {
        self.grid
            .cell_index(&particle.position)
            .ok_or(ContainerError::NanPosition { id: particle.id() })
    }

    fn insert(&mut self, particle: Particle) -> Result<(), ContainerError> {
        let index = self.locate(&particle)?;
        self.cells[index].push(particle);
        Ok(())
    }

    /// Re-buckets every domain particle whose position no longer matches its cell.
    ///
    /// Particles in halo cells are left in place; they are handled by the boundary
    /// conditions. The particle count never changes.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NanPosition`] for the first particle found with a NaN
    /// position. The particle stays in its old cell and all other moves still happen.
    pub fn update_cells(&mut self) -> Result<(), ContainerError> {
        let mut moved: Vec<(usize, Particle)> = Vec::new();
        let mut failure = None;

        for &cell_index in self.grid.domain_cells() {
            let cell = &mut self.cells[cell_index];
            let mut slot = 0;
            while slot < cell.len() {
                match self.grid.cell_index(&cell[slot].position) {
                    Some(target) if target == cell_index => slot += 1,
                    Some(target) => moved.push((target, cell.swap_remove(slot))),
                    None => {
                        if failure.is_none() {
                            failure = Some(ContainerError::NanPosition {
                                id: cell[slot].id(),
                            });
                        }
                        slot += 1;
                    }
                }
            }
        }

        if !moved.is_empty() {
            trace!(count = moved.len(), "Re-bucketing particles.");
        }
        for (target, particle) in moved {
            self.cells[target].push(particle);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Removes all particles from the halo cells of one side.
    ///
    /// # Return
    ///
    /// Returns the number of particles removed.
    pub fn clear_halo_cells(&mut self, side: Side) -> usize {
        let mut removed = 0;
        for &index in self.grid.halo_cells(side) {
            removed += self.cells[index].len();
            self.cells[index].clear();
        }
        self.particle_count -= removed;
        if removed > 0 {
            debug!(%side, removed, "Particles left the domain.");
        }
        removed
    }

    /// Calls `f` for every particle in the boundary cells of `side` whose distance to
    /// that face is positive and at most `threshold`.
    ///
    /// The second argument is the particle position mirrored across the face.
    pub fn apply_to_all_boundary_particles<F>(&mut self, side: Side, threshold: f64, mut f: F)
    where
        F: FnMut(&mut Particle, Vector3<f64>),
    {
        let axis = side.axis();
        let extent = self.grid.domain_size()[axis];
        for &index in self.grid.boundary_cells(side) {
            for particle in self.cells[index].iter_mut() {
                let coord = particle.position[axis];
                let distance = if side.is_lower() { coord } else { extent - coord };
                if distance > 0.0 && distance <= threshold {
                    let mut ghost = particle.position;
                    ghost[axis] = if side.is_lower() {
                        -coord
                    } else {
                        2.0 * extent - coord
                    };
                    f(particle, ghost);
                }
            }
        }
    }

    /// Wraps every particle found in a halo cell of a periodic axis back into the domain.
    ///
    /// All periodic axes are wrapped at once, so a particle leaving through a corner
    /// lands in the opposite corner.
    ///
    /// # Return
    ///
    /// Returns the number of particles moved.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NanPosition`] if a displaced particle cannot be
    /// re-bucketed. That particle is dropped from the container.
    pub fn teleport_halo_particles(
        &mut self,
        periodic_axes: [bool; 3],
    ) -> Result<usize, ContainerError> {
        let mut displaced = Vec::new();
        for side in Side::ALL {
            if !periodic_axes[side.axis()] {
                continue;
            }
            for &index in self.grid.halo_cells(side) {
                displaced.append(&mut self.cells[index]);
            }
        }

        let moved = displaced.len();
        let domain = self.grid.domain_size();
        let dimensions = self.grid.dimensions();
        let mut failure = None;

        for mut particle in displaced {
            for axis in (0..dimensions).filter(|&axis| periodic_axes[axis]) {
                let extent = domain[axis];
                let coord = &mut particle.position[axis];
                if *coord < 0.0 {
                    *coord += extent;
                } else if *coord >= extent {
                    *coord -= extent;
                }
            }
            if let Err(err) = self.insert(particle) {
                self.particle_count -= 1;
                failure.get_or_insert(err);
            }
        }

        if moved > 0 {
            trace!(moved, "Wrapped particles across periodic boundaries.");
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(moved),
        }
    }

    /// Calls `f` for every pair of particles that interact across a periodic boundary.
    ///
    /// Images reached through faces, edges and corners are all visited, each unordered
    /// interaction once. The third argument is the translation to apply to the second
    /// particle so that it becomes the image nearest to the first one.
    pub fn apply_to_periodic_pairs<F>(&mut self, periodic_axes: [bool; 3], mut f: F)
    where
        F: FnMut(&mut Particle, &mut Particle, &Vector3<f64>),
    {
        let cutoff = self.grid.cutoff_radius();
        let cutoff_sq = cutoff * cutoff;
        let domain = self.grid.domain_size();

        for relation in self.grid.periodic_relations() {
            if !relation.is_active(periodic_axes) {
                continue;
            }
            let shift = relation.shift(domain);
            let within = |p: &Particle, q: &Particle| {
                (q.position + shift - p.position).norm_squared() <= cutoff_sq
            };

            if relation.cell == relation.partner {
                let cell = &mut self.cells[relation.cell];
                for i in 0..cell.len() {
                    for j in (0..cell.len()).filter(|&j| j != i) {
                        let (p, q) = pair_mut(&mut cell[..], i, j);
                        if within(p, q) {
                            f(p, q, &shift);
                        }
                    }
                }
            } else {
                let (near, far) = pair_mut(&mut self.cells, relation.cell, relation.partner);
                for p in near.iter_mut() {
                    for q in far.iter_mut() {
                        if within(p, q) {
                            f(p, q, &shift);
                        }
                    }
                }
            }
        }
    }

    /// Accumulates pair forces into `Particle::force` using all rayon worker threads.
    ///
    /// `force` returns the force on its first argument; the negation is applied to the
    /// second. Each worker sums into a private buffer and the buffers are reduced before
    /// being written back, so the result matches the serial sweep up to summation order.
    #[cfg(feature = "parallel")]
    pub fn par_accumulate_pair_forces<F>(&mut self, force: F)
    where
        F: Fn(&Particle, &Particle) -> Vector3<f64> + Sync,
    {
        let mut offsets = Vec::with_capacity(self.cells.len() + 1);
        let mut total = 0;
        for cell in &self.cells {
            offsets.push(total);
            total += cell.len();
        }
        offsets.push(total);

        let cutoff = self.grid.cutoff_radius();
        let cutoff_sq = cutoff * cutoff;
        let cells = &self.cells;
        let offsets_ref = &offsets;
        let force_ref = &force;

        let accumulated: Vec<Vector3<f64>> = self
            .grid
            .iteration_scheme()
            .par_iter()
            .fold(
                || vec![Vector3::zeros(); total],
                |mut acc, group| {
                    let primary = group[0];
                    let own = &cells[primary];
                    let base = offsets_ref[primary];
                    for i in 0..own.len() {
                        for j in (i + 1)..own.len() {
                            if (own[j].position - own[i].position).norm_squared() <= cutoff_sq {
                                let f = force_ref(&own[i], &own[j]);
                                acc[base + i] += f;
                                acc[base + j] -= f;
                            }
                        }
                    }
                    for &neighbor in &group[1..] {
                        let other = &cells[neighbor];
                        let other_base = offsets_ref[neighbor];
                        for (i, p) in own.iter().enumerate() {
                            for (j, q) in other.iter().enumerate() {
                                if (q.position - p.position).norm_squared() <= cutoff_sq {
                                    let f = force_ref(p, q);
                                    acc[base + i] += f;
                                    acc[other_base + j] -= f;
                                }
                            }
                        }
                    }
                    acc
                },
            )
            .reduce(
                || vec![Vector3::zeros(); total],
                |mut left, right| {
                    for (l, r) in left.iter_mut().zip(right) {
                        *l += r;
                    }
                    left
                },
            );

        for (cell, &base) in self.cells.iter_mut().zip(&offsets) {
            for (i, particle) in cell.iter_mut().enumerate() {
                particle.force += accumulated[base + i];
            }
        }
    }

    /// Parallel counterpart of [`ParticleContainer::apply_to_each_particle_in_domain`].
    #[cfg(feature = "parallel")]
    pub fn par_apply_to_each_particle_in_domain<F>(&mut self, f: F)
    where
        F: Fn(&mut Particle) + Sync + Send,
    {
        let grid = &self.grid;
        self.cells
            .par_iter_mut()
            .enumerate()
            .filter(|(index, _)| !grid.is_halo(*index))
            .for_each(|(_, cell)| cell.iter_mut().for_each(&f));
    }
}

fn particle_pair_mut(cells: &mut [Vec<Particle>], a: Slot, b: Slot) -> (&mut Particle, &mut Particle) {
    if a.0 == b.0 {
        pair_mut(&mut cells[a.0][..], a.1, b.1)
    } else {
        let (first, second) = pair_mut(cells, a.0, b.0);
        (&mut first[a.1], &mut second[b.1])
    }
}

impl ParticleContainer for LinkedCellsContainer {
    fn add(&mut self, particle: Particle) -> Result<(), ContainerError> {
        if self.grid.is_two_dimensional() && particle.has_z_component() {
            return Err(ContainerError::DimensionMismatch { id: particle.id() });
        }
        self.insert(particle)?;
        self.particle_count += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.particle_count
    }

    fn dimensions(&self) -> usize {
        self.grid.dimensions()
    }

    fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.cells.iter().flatten()
    }

    fn apply_to_each_particle<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle),
    {
        self.cells.iter_mut().flatten().for_each(&mut f);
    }

    fn apply_to_each_particle_in_domain<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle),
    {
        for &index in self.grid.domain_cells() {
            self.cells[index].iter_mut().for_each(&mut f);
        }
    }

    fn apply_to_all_unique_pairs_in_domain<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle, &mut Particle),
    {
        let cutoff = self.grid.cutoff_radius();
        let cutoff_sq = cutoff * cutoff;
        let within =
            |p: &Particle, q: &Particle| (q.position - p.position).norm_squared() <= cutoff_sq;

        for group in self.grid.iteration_scheme() {
            let primary = group[0];
            for_each_pair_in(&mut self.cells[primary], within, &mut f);
            for &neighbor in &group[1..] {
                let (own, other) = pair_mut(&mut self.cells, primary, neighbor);
                for p in own.iter_mut() {
                    for q in other.iter_mut() {
                        if within(p, q) {
                            f(p, q);
                        }
                    }
                }
            }
        }
    }

    fn apply_to_neighbor_pairs<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle, &mut Particle, NeighborKind),
    {
        let mut locations: HashMap<ParticleId, Slot> = HashMap::new();
        for &index in self.grid.domain_cells() {
            for (slot, particle) in self.cells[index].iter().enumerate() {
                if !particle.direct_neighbors.is_empty() || !particle.diagonal_neighbors.is_empty() {
                    locations.insert(particle.id(), (index, slot));
                }
            }
        }
        if locations.is_empty() {
            return;
        }

        let mut relations = Vec::new();
        for &index in self.grid.domain_cells() {
            for (slot, particle) in self.cells[index].iter().enumerate() {
                let lists = [
                    (&particle.direct_neighbors, NeighborKind::Direct),
                    (&particle.diagonal_neighbors, NeighborKind::Diagonal),
                ];
                for (list, kind) in lists {
                    for other in list.iter().filter(|&&other| other > particle.id()) {
                        if let Some(&location) = locations.get(other) {
                            relations.push(((index, slot), location, kind));
                        }
                    }
                }
            }
        }

        for (a, b, kind) in relations {
            let (p, q) = particle_pair_mut(&mut self.cells, a, b);
            f(p, q, kind);
        }
    }

    fn drain(&mut self) -> Vec<Particle> {
        self.particle_count = 0;
        self.cells.iter_mut().flat_map(|cell| cell.drain(..)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn particle_at(x: f64, y: f64, z: f64) -> Particle {
        Particle::new(Vector3::new(x, y, z), Vector3::zeros(), 1.0)
    }

    /// Two particles per domain cell of a 3x3x3 domain, placed so that every pair in
    /// adjacent cells is within a cutoff of 1.
    fn filled_cube() -> (LinkedCellsContainer, Vec<ParticleId>) {
        const COORDS: [f64; 3] = [0.99, 1.5, 2.01];
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        let mut ids = Vec::new();
        for z in COORDS {
            for y in COORDS {
                for x in COORDS {
                    for _ in 0..2 {
                        let p = particle_at(x, y, z);
                        ids.push(p.id());
                        container.add(p).unwrap();
                    }
                }
            }
        }
        (container, ids)
    }

    fn assert_bucketing(container: &LinkedCellsContainer) {
        for &index in container.grid().domain_cells() {
            for p in container.cell(index) {
                assert_eq!(container.grid().cell_index(&p.position), Some(index));
            }
        }
    }

    #[test]
    fn add_places_particle_in_matching_cell() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(0.5, 1.5, 2.5)).unwrap();
        assert_eq!(container.len(), 1);
        let index = container.grid().three_d_to_one_d(1, 2, 3);
        assert_eq!(container.cell(index).len(), 1);
    }

    #[test]
    fn add_rejects_nan_positions() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        let p = particle_at(f64::NAN, 1.0, 1.0);
        let id = p.id();
        assert_eq!(container.add(p), Err(ContainerError::NanPosition { id }));
        assert!(container.is_empty());
    }

    #[test]
    fn add_rejects_z_components_in_two_dimensions() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        let mut p = particle_at(1.0, 1.0, 0.0);
        p.velocity.z = 0.5;
        let id = p.id();
        assert_eq!(container.add(p), Err(ContainerError::DimensionMismatch { id }));
        container.add(particle_at(1.0, 1.0, 0.0)).unwrap();
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn unique_pairs_are_visited_once_with_expected_partner_counts() {
        let (mut container, ids) = filled_cube();
        let mut partners: HashMap<ParticleId, usize> = HashMap::new();
        let mut seen = HashSet::new();
        container.apply_to_all_unique_pairs_in_domain(|p, q| {
            let key = (p.id().min(q.id()), p.id().max(q.id()));
            assert!(seen.insert(key), "pair visited twice");
            *partners.entry(p.id()).or_default() += 1;
            *partners.entry(q.id()).or_default() += 1;
        });

        // Particles are created x-fastest, two per cell; index 26 is the first particle
        // of the center cell, index 0 the first particle of a corner cell.
        assert_eq!(partners[&ids[26]], 53);
        assert_eq!(partners[&ids[0]], 15);
    }

    #[test]
    fn unique_pairs_match_brute_force_within_cutoff() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut container = LinkedCellsContainer::new([6.0, 5.0, 4.0], 1.5).unwrap();
        let mut particles = Vec::new();
        for _ in 0..200 {
            let p = particle_at(
                rng.gen_range(0.0..6.0),
                rng.gen_range(0.0..5.0),
                rng.gen_range(0.0..4.0),
            );
            particles.push(p.clone());
            container.add(p).unwrap();
        }

        let mut expected = HashSet::new();
        for (i, p) in particles.iter().enumerate() {
            for q in &particles[i + 1..] {
                if (p.position - q.position).norm() <= 1.5 {
                    expected.insert((p.id().min(q.id()), p.id().max(q.id())));
                }
            }
        }

        let mut visited = HashSet::new();
        container.apply_to_all_unique_pairs_in_domain(|p, q| {
            visited.insert((p.id().min(q.id()), p.id().max(q.id())));
        });
        assert_eq!(visited, expected);
    }

    #[test]
    fn halo_particles_take_no_part_in_domain_iteration() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(-0.1, 1.5, 1.5)).unwrap();
        container.add(particle_at(0.1, 1.5, 1.5)).unwrap();

        let mut in_domain = 0;
        container.apply_to_each_particle_in_domain(|_| in_domain += 1);
        let mut everywhere = 0;
        container.apply_to_each_particle(|_| everywhere += 1);
        let mut pairs = 0;
        container.apply_to_all_unique_pairs_in_domain(|_, _| pairs += 1);

        assert_eq!(in_domain, 1);
        assert_eq!(everywhere, 2);
        assert_eq!(pairs, 0);
    }

    #[test]
    fn update_cells_restores_bucketing_after_moves() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut container = LinkedCellsContainer::new([5.0, 5.0, 5.0], 1.0).unwrap();
        for _ in 0..100 {
            container
                .add(particle_at(
                    rng.gen_range(0.0..5.0),
                    rng.gen_range(0.0..5.0),
                    rng.gen_range(0.0..5.0),
                ))
                .unwrap();
        }
        container.apply_to_each_particle(|p| {
            p.position.x = (p.position.x + 1.3) % 5.0;
            p.position.y = 4.9 - p.position.y;
        });
        container.update_cells().unwrap();

        assert_eq!(container.len(), 100);
        assert_eq!(container.particles().count(), 100);
        assert_bucketing(&container);
    }

    #[test]
    fn update_cells_moves_leaving_particles_into_the_halo() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(0.2, 1.5, 1.5)).unwrap();
        container.apply_to_each_particle(|p| p.position.x = -0.3);
        container.update_cells().unwrap();

        let halo = container.grid().three_d_to_one_d(0, 2, 2);
        assert_eq!(container.cell(halo).len(), 1);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn update_cells_reports_nan_and_keeps_count() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(0.5, 0.5, 0.5)).unwrap();
        container.add(particle_at(2.5, 2.5, 2.5)).unwrap();
        container.apply_to_each_particle(|p| {
            if p.position.x < 1.0 {
                p.position.x = f64::NAN;
            } else {
                p.position.x = 1.5;
            }
        });
        assert!(matches!(
            container.update_cells(),
            Err(ContainerError::NanPosition { .. })
        ));
        assert_eq!(container.particles().count(), 2);
        let moved = container.grid().three_d_to_one_d(2, 3, 3);
        assert_eq!(container.cell(moved).len(), 1);
    }

    #[test]
    fn clear_halo_cells_only_touches_one_side() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(-0.5, 1.5, 1.5)).unwrap();
        container.add(particle_at(3.5, 1.5, 1.5)).unwrap();
        container.add(particle_at(1.5, 1.5, 1.5)).unwrap();

        assert_eq!(container.clear_halo_cells(Side::Left), 1);
        assert_eq!(container.len(), 2);
        assert_eq!(container.clear_halo_cells(Side::Left), 0);
        assert_eq!(container.clear_halo_cells(Side::Right), 1);
        assert_eq!(container.len(), 1);
        assert_eq!(container.particles().count(), 1);
    }

    #[test]
    fn boundary_particles_receive_mirrored_ghost_position() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        container.add(particle_at(1.5, 1.5, 0.4)).unwrap();
        container.add(particle_at(1.5, 1.5, 2.7)).unwrap();

        let mut ghosts = Vec::new();
        container.apply_to_all_boundary_particles(Side::Front, 0.5, |_, g| ghosts.push(g));
        assert_eq!(ghosts.len(), 1);
        assert!((ghosts[0] - Vector3::new(1.5, 1.5, -0.4)).norm() < 1e-12);

        ghosts.clear();
        container.apply_to_all_boundary_particles(Side::Back, 0.5, |_, g| ghosts.push(g));
        assert_eq!(ghosts.len(), 1);
        assert!((ghosts[0] - Vector3::new(1.5, 1.5, 3.3)).norm() < 1e-12);

        // 0.4 from the face lies outside (0, 0.1], so no ghost is produced.
        let mut calls = 0;
        container.apply_to_all_boundary_particles(Side::Front, 0.1, |_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn particle_on_the_face_gets_no_ghost() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        container.add(particle_at(0.0, 1.5, 0.0)).unwrap();
        let mut calls = 0;
        container.apply_to_all_boundary_particles(Side::Left, 1.0, |_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn teleport_wraps_halo_particles_into_the_domain() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        container.add(particle_at(-0.2, 1.5, 0.0)).unwrap();
        container.add(particle_at(3.1, -0.4, 0.0)).unwrap();

        let moved = container.teleport_halo_particles([true, true, false]).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(container.len(), 2);

        let mut positions: Vec<_> = container.particles().map(|p| p.position).collect();
        positions.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert!((positions[0] - Vector3::new(0.1, 2.6, 0.0)).norm() < 1e-12);
        assert!((positions[1] - Vector3::new(2.8, 1.5, 0.0)).norm() < 1e-12);
        assert_bucketing(&container);
    }

    #[test]
    fn teleport_ignores_non_periodic_axes() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        container.add(particle_at(1.5, -0.2, 0.0)).unwrap();
        let moved = container.teleport_halo_particles([true, false, false]).unwrap();
        assert_eq!(moved, 0);
        assert_eq!(container.particles().next().unwrap().position.y, -0.2);
    }

    #[test]
    fn periodic_pairs_use_the_nearest_image() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        let a = particle_at(0.2, 1.5, 0.0);
        let b = particle_at(2.9, 1.5, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        container.add(a).unwrap();
        container.add(b).unwrap();
        container.add(particle_at(1.5, 1.5, 0.0)).unwrap();

        let mut calls = Vec::new();
        container.apply_to_periodic_pairs([true, true, false], |p, q, shift| {
            calls.push((p.id(), q.id(), (q.position + shift - p.position).norm()));
        });
        assert_eq!(calls.len(), 1);
        let (p, q, distance) = calls[0];
        assert_eq!((p.min(q), p.max(q)), (a_id.min(b_id), a_id.max(b_id)));
        assert!((distance - 0.3).abs() < 1e-12);
    }

    #[test]
    fn periodic_pairs_reach_across_corners() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 0.0], 1.0).unwrap();
        container.add(particle_at(0.1, 0.1, 0.0)).unwrap();
        container.add(particle_at(2.9, 2.9, 0.0)).unwrap();

        let mut distances = Vec::new();
        container.apply_to_periodic_pairs([true, true, false], |p, q, shift| {
            distances.push((q.position + shift - p.position).norm());
        });
        assert_eq!(distances.len(), 1);
        assert!((distances[0] - 0.2 * 2f64.sqrt()).abs() < 1e-12);

        // Without wrapping along y the corner image does not exist.
        let mut calls = 0;
        container.apply_to_periodic_pairs([true, false, false], |_, _, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn periodic_pairs_reach_across_edges_and_corners_in_three_dimensions() {
        let mut container = LinkedCellsContainer::new([3.0, 3.0, 3.0], 1.0).unwrap();
        // Corner image: 0.2 apart along every axis.
        container.add(particle_at(0.1, 0.1, 0.1)).unwrap();
        container.add(particle_at(2.9, 2.9, 2.9)).unwrap();
        // Edge image across x and z.
        container.add(particle_at(2.95, 1.5, 0.05)).unwrap();
        container.add(particle_at(0.05, 1.5, 2.95)).unwrap();

        let mut shifts = Vec::new();
        container.apply_to_periodic_pairs([true; 3], |p, q, shift| {
            assert!((q.position + shift - p.position).norm() <= 1.0);
            shifts.push(shift.map(f64::abs));
        });
        shifts.sort_by(|a, b| a.iter().partial_cmp(b.iter()).unwrap());
        assert_eq!(
            shifts,
            vec![Vector3::new(3.0, 0.0, 3.0), Vector3::new(3.0, 3.0, 3.0)]
        );
    }

    #[test]
    fn periodic_pairs_match_brute_force_minimum_image() {
        const L: f64 = 4.0;
        let mut rng = StdRng::seed_from_u64(19);
        for periodic_axes in [[true; 3], [true, false, true]] {
            let mut container = LinkedCellsContainer::new([L; 3], 1.0).unwrap();
            let mut positions = Vec::new();
            for _ in 0..150 {
                let p = particle_at(
                    rng.gen_range(0.0..L),
                    rng.gen_range(0.0..L),
                    rng.gen_range(0.0..L),
                );
                positions.push((p.id(), p.position));
                container.add(p).unwrap();
            }

            let mut expected = HashSet::new();
            for (i, &(a, pa)) in positions.iter().enumerate() {
                for &(b, pb) in &positions[i + 1..] {
                    let d = pb - pa;
                    let image = Vector3::from_fn(|k, _| {
                        if periodic_axes[k] && d[k].abs() > L / 2.0 {
                            d[k] - L * d[k].signum()
                        } else {
                            d[k]
                        }
                    });
                    if image != d && image.norm() <= 1.0 {
                        expected.insert((a.min(b), a.max(b)));
                    }
                }
            }
            assert!(!expected.is_empty());

            let mut visited = HashSet::new();
            container.apply_to_periodic_pairs(periodic_axes, |p, q, shift| {
                assert!((q.position + shift - p.position).norm() <= 1.0);
                let key = (p.id().min(q.id()), p.id().max(q.id()));
                assert!(visited.insert(key), "pair {key:?} visited twice");
            });
            assert_eq!(visited, expected);
        }
    }

    #[test]
    fn neighbor_pairs_are_reported_once_per_relation() {
        let mut container = LinkedCellsContainer::new([4.0, 4.0, 0.0], 1.0).unwrap();
        let mut a = particle_at(1.0, 1.0, 0.0);
        let mut b = particle_at(2.0, 1.0, 0.0);
        let mut c = particle_at(2.0, 2.0, 0.0);
        a.direct_neighbors.push(b.id());
        b.direct_neighbors.push(a.id());
        b.direct_neighbors.push(c.id());
        c.direct_neighbors.push(b.id());
        a.diagonal_neighbors.push(c.id());
        c.diagonal_neighbors.push(a.id());
        for p in [a, b, c] {
            container.add(p).unwrap();
        }

        let mut direct = 0;
        let mut diagonal = 0;
        container.apply_to_neighbor_pairs(|p, q, kind| {
            assert!(p.id() < q.id());
            match kind {
                NeighborKind::Direct => direct += 1,
                NeighborKind::Diagonal => diagonal += 1,
            }
        });
        assert_eq!(direct, 2);
        assert_eq!(diagonal, 1);
    }

    #[test]
    fn drain_empties_the_container() {
        let (mut container, ids) = filled_cube();
        let drained = container.drain();
        assert_eq!(drained.len(), ids.len());
        assert!(container.is_empty());
        assert_eq!(container.particles().count(), 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_pair_forces_match_serial_sweep() {
        use crate::core::forcefield::law::ForceLaw;

        let mut rng = StdRng::seed_from_u64(3);
        let mut serial = LinkedCellsContainer::new([6.0, 6.0, 6.0], 2.0).unwrap();
        for _ in 0..150 {
            serial
                .add(particle_at(
                    rng.gen_range(0.0..6.0),
                    rng.gen_range(0.0..6.0),
                    rng.gen_range(0.0..6.0),
                ))
                .unwrap();
        }
        let mut parallel = serial.clone();

        let law = ForceLaw::LennardJones;
        serial.apply_to_all_unique_pairs_in_domain(|p, q| {
            let f = law.compute(p, q);
            p.force += f;
            q.force -= f;
        });
        parallel.par_accumulate_pair_forces(|p, q| law.compute(p, q));

        let expected: HashMap<_, _> = serial.particles().map(|p| (p.id(), p.force)).collect();
        for p in parallel.particles() {
            let f = expected[&p.id()];
            assert!((p.force - f).norm() <= 1e-6 * (1.0 + f.norm()));
        }
    }
}
