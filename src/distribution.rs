//! Batch degree distributions.
//!
//! A [`DegreeDistribution`] turns one uniform draw in `[0, 1)` into a batch
//! degree by inverse-CDF lookup. Tables are usually optimized offline for a
//! given batch size and field; [`DegreeDistribution::robust_soliton`] is a
//! reasonable default when no optimized table is at hand.

#![allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]

use crate::error::{Error, ErrorKind, Result};

/// Inverse-CDF sampler over degrees `1..=max_degree`.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeDistribution {
    /// `cdf[d - 1]` = P(degree <= d). The last entry is exactly 1.0.
    cdf: Vec<f64>,
}

impl DegreeDistribution {
    /// Builds a sampler from a probability mass table.
    ///
    /// `pmf[d]` is the (unnormalized) mass of degree `d` for
    /// `d in 1..=max_degree`; `pmf[0]` must be zero since a batch cannot
    /// have degree 0. Entries past `max_degree` are ignored.
    pub fn new(pmf: &[f64], max_degree: usize) -> Result<Self> {
        if max_degree == 0 {
            return Err(invalid("max degree must be positive"));
        }
        if pmf.len() <= max_degree {
            return Err(invalid(format!(
                "table has {} entries, need {} for max degree {max_degree}",
                pmf.len(),
                max_degree + 1
            )));
        }
        if pmf[0] != 0.0 {
            return Err(invalid("degree 0 must have zero mass"));
        }
        let masses = &pmf[1..=max_degree];
        if let Some(bad) = masses.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(invalid(format!("mass {bad} is not a finite non-negative number")));
        }
        let total: f64 = masses.iter().sum();
        if total <= 0.0 {
            return Err(invalid("total mass must be positive"));
        }

        let mut cdf = Vec::with_capacity(max_degree);
        let mut cumulative = 0.0f64;
        for &p in masses {
            cumulative += p / total;
            cdf.push(cumulative.min(1.0));
        }
        // Ensure last entry is exactly 1.0
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Ok(Self { cdf })
    }

    /// Builds a sampler from masses of degrees `1..=masses.len()`.
    pub fn from_masses(masses: &[f64]) -> Result<Self> {
        let mut pmf = Vec::with_capacity(masses.len() + 1);
        pmf.push(0.0);
        pmf.extend_from_slice(masses);
        Self::new(&pmf, masses.len())
    }

    /// Robust soliton distribution over `1..=k`.
    ///
    /// - `c`: free parameter (typically 0.1–0.5)
    /// - `delta`: failure probability bound (typically 0.01–0.1)
    pub fn robust_soliton(k: usize, c: f64, delta: f64) -> Result<Self> {
        if k == 0 {
            return Err(invalid("k must be positive"));
        }
        if c <= 0.0 || !c.is_finite() {
            return Err(invalid("c must be a positive finite number"));
        }
        if delta <= 0.0 || delta >= 1.0 || !delta.is_finite() {
            return Err(invalid("delta must be in (0, 1)"));
        }
        let k_f = k as f64;

        // R = c * ln(K/delta) * sqrt(K)
        let r = c * (k_f / delta).ln() * k_f.sqrt();

        // Ideal soliton rho(d), with rho[0] = 0
        let mut mu = vec![0.0f64; k + 1];
        mu[1] = 1.0 / k_f;
        for (d, value) in mu.iter_mut().enumerate().skip(2) {
            let d_f = d as f64;
            *value = 1.0 / (d_f * (d_f - 1.0));
        }

        // Perturbation tau(d)
        let threshold = (k_f / r).floor() as usize;
        let max_d = k.min(threshold.max(1));
        for (d, value) in mu.iter_mut().enumerate().skip(1).take(max_d) {
            if d < threshold {
                *value += r / (d as f64 * k_f);
            } else {
                *value += r * (r / delta).ln() / k_f;
            }
        }

        Self::new(&mu, k)
    }

    /// Maps a uniform draw `u` in `[0, 1)` to a degree in `1..=max_degree`.
    ///
    /// Degrees with zero mass are never returned.
    #[must_use]
    pub fn sample(&self, u: f64) -> usize {
        debug_assert!((0.0..1.0).contains(&u), "uniform draw {u} outside [0, 1)");
        let idx = self.cdf.partition_point(|&c| c <= u);
        (idx + 1).min(self.max_degree())
    }

    /// Largest degree with an entry in the table.
    #[must_use]
    pub fn max_degree(&self) -> usize {
        self.cdf.len()
    }

    /// Probability of degree `d`.
    #[must_use]
    pub fn probability(&self, d: usize) -> f64 {
        match d {
            0 => 0.0,
            1 => self.cdf[0],
            d if d <= self.max_degree() => self.cdf[d - 1] - self.cdf[d - 2],
            _ => 0.0,
        }
    }

    /// Expected degree.
    #[must_use]
    pub fn mean(&self) -> f64 {
        (1..=self.max_degree())
            .map(|d| d as f64 * self.probability(d))
            .sum()
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidDistribution).with_message(msg)
}
