//! Gaussian kernel density estimate
//!
//! One-dimensional KDE with Scott's rule bandwidth, used to compare the
//! empirical data density with the mixture density recovered by the sampler.

use crate::error::{Result, SysIdError};

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    pub fn new(samples: &[f64]) -> Result<Self> {
        let n = samples.len();
        if n < 2 {
            return Err(SysIdError::InvalidConfig(
                "kernel density estimate needs at least two samples".to_string(),
            ));
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std = variance.sqrt();
        if !(std.is_finite() && std > 0.0) {
            return Err(SysIdError::InvalidConfig(
                "kernel density estimate needs samples with non-zero spread".to_string(),
            ));
        }

        // Scott's rule in one dimension
        let factor = (n as f64).powf(-0.2);

        Ok(Self {
            samples: samples.to_vec(),
            bandwidth: std * factor,
        })
    }

    /// Kernel standard deviation
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at a single point
    pub fn density(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let z = (x - s) / h;
                (-0.5 * z * z).exp()
            })
            .sum();
        sum * INV_SQRT_2PI / (h * self.samples.len() as f64)
    }

    /// Density at each of `points`
    pub fn evaluate(&self, points: &[f64]) -> Vec<f64> {
        points.iter().map(|&x| self.density(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_samples() {
        assert!(GaussianKde::new(&[]).is_err());
        assert!(GaussianKde::new(&[1.0]).is_err());
        assert!(GaussianKde::new(&[2.0, 2.0, 2.0]).is_err());
    }

    #[test]
    fn test_scott_bandwidth() {
        let samples = [0.0, 1.0, 2.0, 3.0, 4.0];
        let kde = GaussianKde::new(&samples).unwrap();
        let expected = 2.5_f64.sqrt() * 5.0_f64.powf(-0.2);
        assert!((kde.bandwidth() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_integrates_to_one() {
        let samples = [-1.2, -0.3, 0.1, 0.4, 0.9, 1.7, 2.2];
        let kde = GaussianKde::new(&samples).unwrap();

        let step = 0.01;
        let grid: Vec<f64> = (0..2000).map(|k| -10.0 + k as f64 * step).collect();
        let mass: f64 = kde.evaluate(&grid).iter().sum::<f64>() * step;
        assert!((mass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_samples_give_symmetric_density() {
        let samples = [-2.0, -1.0, 1.0, 2.0];
        let kde = GaussianKde::new(&samples).unwrap();
        assert!((kde.density(0.7) - kde.density(-0.7)).abs() < 1e-14);
    }
}
