//! Seeded Gaussian noise via the Box–Muller transform.

use rand::{Rng, rngs::StdRng};

/// Draws from a Gaussian with mean 0 and the given standard deviation.
///
/// Returns 0.0 for a non-positive standard deviation. All callers seed their
/// `StdRng` from the scenario seed, so noisy quantities stay reproducible.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}
