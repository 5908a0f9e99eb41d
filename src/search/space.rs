// ============================================================
// Layer 7 — Search Space
// ============================================================
// Every tunable parameter is either fixed or a grid of
// candidate values. The space expands into the cartesian
// product of its parameters, alpha-major:
//
//   alpha = [1e-4, 1e-3], lr = [0.01, 0.1]
//     → #0 (1e-4, 0.01)  #1 (1e-4, 0.1)
//       #2 (1e-3, 0.01)  #3 (1e-3, 0.1)

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::trial::TrialConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamSpec {
    Fixed(f64),
    Grid(Vec<f64>),
}

impl ParamSpec {
    /// One value means Fixed, several mean Grid.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        match values.len() {
            0 => bail!("A search parameter needs at least one value"),
            1 => Ok(ParamSpec::Fixed(values[0])),
            _ => Ok(ParamSpec::Grid(values)),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            ParamSpec::Fixed(v)  => vec![*v],
            ParamSpec::Grid(vs)  => vs.clone(),
        }
    }

    fn validate(&self, name: &str, allow_zero: bool) -> Result<()> {
        let values = self.values();
        ensure!(!values.is_empty(), "{name}: grid is empty");

        for (i, v) in values.iter().enumerate() {
            ensure!(v.is_finite(), "{name}: value {v} is not finite");
            if allow_zero {
                ensure!(*v >= 0.0, "{name}: value {v} must not be negative");
            } else {
                ensure!(*v > 0.0, "{name}: value {v} must be positive");
            }
            ensure!(
                !values[..i].contains(v),
                "{name}: value {v} appears more than once"
            );
        }
        Ok(())
    }
}

/// The explicit set of configurations a search will try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub alpha:         ParamSpec,
    pub learning_rate: ParamSpec,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            alpha:         ParamSpec::Grid(vec![1e-4, 1e-3, 1e-2, 1e-1]),
            learning_rate: ParamSpec::Fixed(0.01),
        }
    }
}

impl SearchSpace {
    pub fn validate(&self) -> Result<()> {
        self.alpha.validate("alpha", true)?;
        self.learning_rate.validate("learning_rate", false)?;
        ensure!(!self.is_empty(), "Search space has no trials");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.alpha.values().len() * self.learning_rate.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand into trial configurations with stable ids.
    pub fn trials(&self) -> Vec<TrialConfig> {
        let learning_rates = self.learning_rate.values();
        self.alpha
            .values()
            .into_iter()
            .flat_map(|alpha| {
                learning_rates
                    .iter()
                    .map(move |&learning_rate| (alpha, learning_rate))
            })
            .enumerate()
            .map(|(id, (alpha, learning_rate))| TrialConfig { id, alpha, learning_rate })
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_space_has_four_alpha_trials() {
        let space  = SearchSpace::default();
        space.validate().unwrap();
        let trials = space.trials();
        assert_eq!(trials.len(), 4);
        assert_eq!(space.len(), 4);
        assert_eq!(trials[0].alpha, 1e-4);
        assert_eq!(trials[3].alpha, 1e-1);
        assert!(trials.iter().all(|t| t.learning_rate == 0.01));
        assert_eq!(trials.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cartesian_product_is_alpha_major() {
        let space = SearchSpace {
            alpha:         ParamSpec::Grid(vec![1.0, 2.0]),
            learning_rate: ParamSpec::Grid(vec![0.1, 0.2]),
        };
        let pairs: Vec<(f64, f64)> = space
            .trials()
            .iter()
            .map(|t| (t.alpha, t.learning_rate))
            .collect();
        assert_eq!(pairs, vec![(1.0, 0.1), (1.0, 0.2), (2.0, 0.1), (2.0, 0.2)]);
    }

    #[test]
    fn test_from_values() {
        assert_eq!(ParamSpec::from_values(vec![0.5]).unwrap(), ParamSpec::Fixed(0.5));
        assert_eq!(
            ParamSpec::from_values(vec![0.5, 1.0]).unwrap(),
            ParamSpec::Grid(vec![0.5, 1.0])
        );
        assert!(ParamSpec::from_values(vec![]).is_err());
    }

    #[test]
    fn test_invalid_spaces_are_rejected() {
        let bad = |alpha: ParamSpec, lr: ParamSpec| {
            SearchSpace { alpha, learning_rate: lr }.validate().is_err()
        };
        assert!(bad(ParamSpec::Grid(vec![]), ParamSpec::Fixed(0.1)));
        assert!(bad(ParamSpec::Fixed(-1.0), ParamSpec::Fixed(0.1)));
        assert!(bad(ParamSpec::Fixed(f64::NAN), ParamSpec::Fixed(0.1)));
        assert!(bad(ParamSpec::Fixed(0.1), ParamSpec::Fixed(0.0)));
        assert!(bad(ParamSpec::Grid(vec![0.1, 0.1]), ParamSpec::Fixed(0.1)));

        let zero_alpha = SearchSpace {
            alpha:         ParamSpec::Fixed(0.0),
            learning_rate: ParamSpec::Fixed(0.1),
        };
        assert!(zero_alpha.validate().is_ok());
    }
}
