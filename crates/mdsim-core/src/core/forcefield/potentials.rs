use nalgebra::Vector3;

/// Cutoff factor `2^(1/6)` at which the Lennard-Jones force changes sign.
pub const LJ_MINIMUM_FACTOR: f64 = 1.122_462_048_309_373;

#[inline]
pub fn gravity(dx: &Vector3<f64>, m1: f64, m2: f64) -> Vector3<f64> {
    let dist = dx.norm();
    dx * (m1 * m2 / (dist * dist * dist))
}

#[inline]
pub fn lennard_jones(dx: &Vector3<f64>, epsilon: f64, sigma: f64) -> Vector3<f64> {
    let dist_sq = dx.norm_squared();
    let c1 = (sigma * sigma / dist_sq).powi(3);
    dx * (24.0 * epsilon / dist_sq * (c1 - 2.0 * c1 * c1))
}

#[inline]
pub fn harmonic(dx: &Vector3<f64>, stiffness: f64, rest_length: f64) -> Vector3<f64> {
    let dist = dx.norm();
    dx * (stiffness * (dist - rest_length) / dist)
}

/// Lorentz-Berthelot mixing of two parameter sets.
#[inline]
pub fn mix_lorentz_berthelot(epsilon1: f64, sigma1: f64, epsilon2: f64, sigma2: f64) -> (f64, f64) {
    if epsilon1 == epsilon2 && sigma1 == sigma2 {
        return (epsilon1, sigma1);
    }
    ((epsilon1 * epsilon2).sqrt(), 0.5 * (sigma1 + sigma2))
}
