//! Mitigation strategies for cyber-risk questionnaires.
//!
//! Given a questionnaire answer set and a frozen [`RiskScorer`], the
//! [`MitigationOptimizer`] runs rounds of greedy, simultaneous per-group
//! level substitution. The order of rounds comes from an importance oracle
//! ranking feature groups within their category, or from a fixed fallback
//! schedule when no ranking is available.
//!
//! [`RiskScorer`]: cyrisk_model::RiskScorer

pub mod config;
pub mod error;
pub mod optimizer;
pub mod oracle;
pub mod ranking;
pub mod strategy;

pub use config::MitigationConfig;
pub use error::MitigationError;
pub use optimizer::{MitigationOptimizer, OptionSelector};
pub use oracle::{ImportanceOracle, ImportanceScore, OracleError, PerturbationOracle};
pub use ranking::{FallbackReason, OrderingSource, RoundPlan};
pub use strategy::{
    ImplementationPriority, MitigationRound, MitigationStrategy, Recommendation, RiskCheckpoint,
    RiskDelta, SkippedFeature,
};
