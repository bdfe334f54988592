//! Optimizer configuration
//!
//! Values can be overridden through the environment:
//! `CYRISK_RISK_THRESHOLD`, `CYRISK_SEED`, `CYRISK_ISOLATED_DELTAS`.
//! Unset or unparsable variables leave the default in place.

use cyrisk_model::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};

pub const THRESHOLD_ENV: &str = "CYRISK_RISK_THRESHOLD";
pub const SEED_ENV: &str = "CYRISK_SEED";
pub const ISOLATED_DELTAS_ENV: &str = "CYRISK_ISOLATED_DELTAS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationConfig {
    /// Exceedance threshold; replaces the scorer's own threshold
    pub threshold: f64,
    /// Seed handed to the importance oracle on every request
    pub seed: u64,
    /// Re-score each recommendation on its own against the pre-round vector
    pub isolated_deltas: bool,
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            seed: 0,
            isolated_deltas: true,
        }
    }
}

impl MitigationConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(s) = std::env::var(THRESHOLD_ENV) {
            if let Ok(t) = s.trim().parse::<f64>() {
                if (0.0..=1.0).contains(&t) {
                    config.threshold = t;
                }
            }
        }
        if let Ok(s) = std::env::var(SEED_ENV) {
            if let Ok(n) = s.trim().parse::<u64>() {
                config.seed = n;
            }
        }
        if let Ok(s) = std::env::var(ISOLATED_DELTAS_ENV) {
            if let Some(flag) = parse_flag(&s) {
                config.isolated_deltas = flag;
            }
        }
        config
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
