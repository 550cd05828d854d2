use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::errors::InputError;

/// Source of per-hour perturbations applied to projected storage deltas.
///
/// Decision policies never sample randomness themselves; the session draws
/// one offset per forecast hour from this model and hands the slice to the
/// policy, so a given seed replays the exact same decisions.
pub enum UncertaintyModel {
    /// No perturbation.
    Off,
    /// Zero-mean Gaussian offsets with a fixed sigma, seeded for replay.
    Gaussian { rng: StdRng, normal: Normal<f64> },
    /// Explicit offsets cycled over the horizon, for tests.
    Fixed(Vec<f64>),
}

impl UncertaintyModel {
    pub fn off() -> Self {
        Self::Off
    }

    pub fn gaussian(sigma: f64, seed: u64) -> Result<Self, InputError> {
        if !sigma.is_finite() {
            return Err(InputError::NonFinite {
                field: "uncertainty sigma",
                value: sigma,
            });
        }
        if sigma < 0.0 {
            return Err(InputError::Negative {
                field: "uncertainty sigma",
                value: sigma,
            });
        }
        let normal = Normal::new(0.0, sigma).map_err(|_| InputError::NonFinite {
            field: "uncertainty sigma",
            value: sigma,
        })?;
        Ok(Self::Gaussian {
            rng: StdRng::seed_from_u64(seed),
            normal,
        })
    }

    pub fn fixed(offsets: Vec<f64>) -> Self {
        Self::Fixed(offsets)
    }

    /// Draw one offset per forecast hour.
    pub fn draw(&mut self, horizon: usize) -> Vec<f64> {
        match self {
            Self::Off => vec![0.0; horizon],
            Self::Gaussian { rng, normal } => (0..horizon).map(|_| normal.sample(rng)).collect(),
            Self::Fixed(offsets) => {
                if offsets.is_empty() {
                    vec![0.0; horizon]
                } else {
                    (0..horizon).map(|i| offsets[i % offsets.len()]).collect()
                }
            }
        }
    }
}
