//! Soft-penalty scoring and weight profiles.
//!
//! # Usage
//!
//! ```
//! use u_roster::scoring::{PenaltyScorer, ProfileKind};
//!
//! let scorer = PenaltyScorer::new(ProfileKind::Fair.weights());
//! assert!((scorer.weights().holiday_fairness - 2.0).abs() < 1e-10);
//! ```
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering", §4:
//! weighted-sum objectives

mod penalty;
mod weights;

pub use penalty::PenaltyScorer;
pub use weights::{ProfileKind, WeightProfile};
