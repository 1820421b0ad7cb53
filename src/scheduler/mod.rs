//! Roster construction, repair, and improvement.
//!
//! A run moves through three phases over one owned [`Roster`]:
//!
//! 1. **Construction**: shifts in criticality order, each filled by the
//!    lowest-penalty eligible candidate (charge first, then a senior on
//!    critical-care units, then headcount).
//! 2. **Repair**: bounded passes that close missing charge, missing
//!    senior coverage, and headcount gaps by promotion, direct
//!    assignment, or moving staff off less critical shifts.
//! 3. **Local search**: randomized pairwise swaps kept only when the
//!    weighted soft penalty drops.
//!
//! [`RosterEngine`] drives the phases and runs several weight profiles in
//! parallel; [`RosterKpi`] summarizes the outcome.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 14

mod composition;
mod engine;
mod greedy;
mod kpi;
mod local_search;
mod priority;
mod repair;
mod roster;

pub use composition::{is_supervised, SENIOR_LEVEL};
pub use engine::{RosterEngine, RunOutcome};
pub use greedy::{Construction, GreedyConstructor, ShortfallExplainer, SUPERVISION_REASON};
pub use kpi::RosterKpi;
pub use local_search::{LocalSearch, SearchStats};
pub use priority::criticality;
pub use repair::{Defect, RepairReport, Repairer};
pub use roster::Roster;
