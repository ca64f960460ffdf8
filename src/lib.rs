//! Wellplay - survey and game-telemetry data-cleaning pipeline
//!
//! Wellplay harmonizes raw survey exports and raw game-telemetry logs from
//! two platforms into one per-player analysis table through a deterministic
//! batch pipeline: load raw → clean/rename → derive scale scores → reconcile
//! telemetry sessions → time-window join → quality exclusions → persist.
//!
//! ## Modules
//!
//! - **Adapters**: map platform-specific export schemas to the common types
//! - **Scales**: mean composite scores with reverse-coding
//! - **Reconcile**: collapse overlapping session fragments (the core)
//! - **Window**: 14-day pre-survey telemetry aggregation (the core)
//! - **Quality**: straightliner and z-score outlier exclusions
//! - **Persist**: snapshot CSVs at each stage

pub mod adapters;
pub mod error;
pub mod loader;
pub mod persist;
pub mod pipeline;
pub mod quality;
pub mod reconcile;
pub mod scales;
pub mod stats;
pub mod types;
pub mod window;

pub use error::PipelineError;
pub use pipeline::{dedup_survey, StudyOutput, StudyPipeline};
pub use reconcile::reconcile_sessions;
pub use window::{WindowAggregator, DEFAULT_WINDOW_DAYS};

/// Pipeline version embedded in run reports
pub const WELLPLAY_VERSION: &str = env!("CARGO_PKG_VERSION");
