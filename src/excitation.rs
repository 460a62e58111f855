//! Excitation signals and synthetic noise
//!
//! Generators for the inputs and disturbances used in identification
//! experiments. All generators take the RNG explicitly so a seeded
//! `StdRng` gives reproducible signals.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SysIdError};

/// Default maximum hold time of a PRBS run
pub const DEFAULT_MAX_HOLD: usize = 10;

/// Skew-normal distribution built from two correlated standard normals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewNormal {
    /// Shape (skewness) parameter
    pub alpha: f64,
    /// Location
    pub loc: f64,
    /// Scale
    pub scale: f64,
}

impl SkewNormal {
    pub fn new(alpha: f64, loc: f64, scale: f64) -> Result<Self> {
        if !alpha.is_finite() || !loc.is_finite() || !scale.is_finite() {
            return Err(SysIdError::InvalidConfig(
                "skew-normal parameters must be finite".to_string(),
            ));
        }
        if scale < 0.0 {
            return Err(SysIdError::InvalidConfig(
                "skew-normal scale must be non-negative".to_string(),
            ));
        }
        Ok(Self { alpha, loc, scale })
    }

    /// Standard normal (`alpha = 0`, `loc = 0`, `scale = 1`)
    pub fn standard() -> Self {
        Self {
            alpha: 0.0,
            loc: 0.0,
            scale: 1.0,
        }
    }

    /// Correlation between the two underlying normals
    pub fn delta(&self) -> f64 {
        self.alpha / (1.0 + self.alpha * self.alpha).sqrt()
    }

    /// Theoretical mean, `loc + scale * delta * sqrt(2/pi)`
    pub fn mean(&self) -> f64 {
        self.loc + self.scale * self.delta() * (2.0 / std::f64::consts::PI).sqrt()
    }
}

impl Default for SkewNormal {
    fn default() -> Self {
        Self::standard()
    }
}

impl Distribution<f64> for SkewNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let delta = self.delta();
        let u0: f64 = StandardNormal.sample(rng);
        let v: f64 = StandardNormal.sample(rng);

        let mut u1 = (delta * u0 + (1.0 - delta * delta).sqrt() * v) * self.scale;
        if u0 < 0.0 {
            u1 = -u1;
        }
        u1 + self.loc
    }
}

/// Draw `n` independent skew-normal samples
pub fn skew_normal_samples<R: Rng + ?Sized>(n: usize, dist: &SkewNormal, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| dist.sample(rng)).collect()
}

/// Pseudo-random binary sequence of exactly `n` samples in `{-1, +1}`
///
/// Each run picks a sign uniformly and holds it for a length drawn
/// uniformly from `1..=max_hold`. Signs of consecutive runs are
/// independent, so neighbouring runs may share a sign. The last run is
/// cut at `n`.
pub fn prbs<R: Rng + ?Sized>(n: usize, max_hold: usize, rng: &mut R) -> Result<Vec<f64>> {
    if max_hold == 0 {
        return Err(SysIdError::InvalidConfig(
            "max_hold must be at least 1".to_string(),
        ));
    }

    let mut signal = Vec::with_capacity(n);
    while signal.len() < n {
        let level = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let hold = rng.gen_range(1..=max_hold);
        let take = hold.min(n - signal.len());
        signal.extend(std::iter::repeat(level).take(take));
    }

    Ok(signal)
}

/// `n` samples uniform on `[-half_width, half_width)`
pub fn uniform_noise<R: Rng + ?Sized>(n: usize, half_width: f64, rng: &mut R) -> Vec<f64> {
    (0..n)
        .map(|_| 2.0 * half_width * (rng.gen::<f64>() - 0.5))
        .collect()
}

/// Half-open grid `start, start + step, ...` strictly below `stop`
pub fn grid_points(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) || !start.is_finite() || !stop.is_finite() {
        return Err(SysIdError::InvalidConfig(
            "grid needs finite bounds and a positive step".to_string(),
        ));
    }

    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    Ok((0..count).map(|k| start + k as f64 * step).collect())
}
