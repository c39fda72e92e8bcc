use serde::Deserialize;

use crate::contact::{DEFAULT_MAX_ATTEMPTS, EDGE_TARGET_OFFSET, Sampling};
use crate::error::{Result, SirdError};

/// Everything needed to set up and run one outbreak.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    #[serde(alias = "m")]
    pub rows: usize,
    #[serde(alias = "n")]
    pub cols: usize,
    /// Maximum Euclidean distance spanned by a contact.
    #[serde(alias = "r")]
    pub radius: f64,
    /// Desired average number of contacts per individual.
    #[serde(alias = "k")]
    pub mean_degree: f64,
    pub alpha_infected: f64,
    pub alpha_recovered: f64,
    pub beta_recovered: f64,
    pub beta_death: f64,
    pub gamma: f64,
    #[serde(alias = "N")]
    pub n_days: usize,
    pub seed: u64,
    pub sampling: Sampling,
    pub max_attempts: u64,
    pub edge_target_offset: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            rows: 40,
            cols: 25,
            radius: 2.0,
            mean_degree: 4.0,
            alpha_infected: 0.01,
            alpha_recovered: 0.0,
            beta_recovered: 0.05,
            beta_death: 0.005,
            gamma: 0.075,
            n_days: 100,
            seed: 0,
            sampling: Sampling::Rejection,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            edge_target_offset: EDGE_TARGET_OFFSET,
        }
    }
}

fn probability(name: &'static str, p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SirdError::invalid(name, format!("{p} is not in [0, 1]")))
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        probability("alpha_infected", self.alpha_infected)?;
        probability("alpha_recovered", self.alpha_recovered)?;
        if self.alpha_infected + self.alpha_recovered > 1.0 {
            return Err(SirdError::invalid(
                "alpha_recovered",
                "alpha_infected + alpha_recovered exceeds 1",
            ));
        }
        probability("beta_recovered", self.beta_recovered)?;
        probability("beta_death", self.beta_death)?;
        if self.beta_recovered + self.beta_death > 1.0 {
            return Err(SirdError::invalid(
                "beta_death",
                "beta_recovered + beta_death exceeds 1",
            ));
        }
        probability("gamma", self.gamma)?;
        for (name, value) in [("rows", self.rows), ("cols", self.cols), ("n_days", self.n_days)] {
            if value == 0 {
                return Err(SirdError::invalid(name, "must be a positive integer"));
            }
        }
        for (name, value) in [("radius", self.radius), ("mean_degree", self.mean_degree)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SirdError::invalid(name, format!("{value} is not a positive number")));
            }
        }
        Ok(())
    }
}
