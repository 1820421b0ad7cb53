//! Nurse rostering engine.
//!
//! Builds a draft roster for one scheduling period: assigns staff to
//! shifts under hard labor and clinical rules, minimizes a weighted soft
//! penalty, and reports every shift it could not fill together with why.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Staff`, `Shift`, `AssignmentDraft`,
//!   `RuleViolation`, `UnderstaffedShift`, unit policy and leave records
//! - **`context`**: `SchedulerContext`, the read-only input of a run
//! - **`validation`**: Input integrity checks (duplicate IDs, ranges, references)
//! - **`config`**: `EngineConfig` and `RuleParameters`, loadable from TOML
//! - **`state`**: Per-staff workload tracking for incremental checks
//! - **`eligibility`**: The gate deciding whether one staff member may
//!   take one shift
//! - **`rules`**: Hard and soft rule evaluators and their registry
//! - **`scoring`**: Incremental penalty scoring and weight profiles
//! - **`scheduler`**: Construction, repair, local search, the engine, KPIs
//!
//! # Architecture
//!
//! The engine is a pure function of its context: callers load staff,
//! shifts, leave, and unit policy, build a `SchedulerContext`, and
//! persist the returned `GenerationResult` themselves.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Cheang et al. (2003), "Nurse rostering problems: a bibliographic survey"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod context;
pub mod eligibility;
pub mod error;
pub mod models;
pub mod rules;
pub mod scheduler;
pub mod scoring;
pub mod state;
pub mod validation;
