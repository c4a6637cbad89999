//! Traversability queries over a snapshot of the traversability map.
//!
//! Everything in here works on an exclusively borrowed
//! [`TraversabilitySnapshot`]; locking happens in [`crate::map`].

pub mod config;
pub mod eligibility;
pub mod footprint;
pub mod path;
pub mod snapshot;

pub use config::{CheckSettings, TraversabilityConfig, bound_traversability_value};
pub use eligibility::EligibilityChecker;
pub use footprint::{FootprintEvaluation, FootprintEvaluator};
pub use path::{FootprintPath, PathAggregator, PathCheck, TraversabilityResult};
pub use snapshot::TraversabilitySnapshot;
