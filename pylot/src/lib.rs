//! Screen-reading navigation along a fixed route of named systems
//!
//! Text recognized from screen regions is noisy. This crate resolves it to a
//! known catalog of locations, picks the next waypoint on the route, clicks
//! the matching on-screen gate, and waits for the jump to land, reporting
//! what it observed along the way.
//!
//! Screen capture, OCR, pointer input and report delivery sit behind the
//! [`Recognizer`], [`InputDevice`] and [`ReportSink`] traits.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod matcher;
pub mod navigator;
pub mod platforms;
pub mod report;
pub mod selector;
pub mod sequencer;
pub mod types;

pub use catalog::Catalog;
pub use config::{Jitter, Pacing, PilotConfig, ScreenConfig};
pub use errors::PilotError;
pub use matcher::{jaro_similarity, Matcher};
pub use navigator::{CycleState, Exploration, Navigator, RunStats, Transition};
pub use platforms::{InputDevice, Recognizer};
pub use report::{ObservationReport, ReportEmitter, ReportSink};
pub use sequencer::Sequencer;
pub use types::{BBox, Candidate, Point, RecognizedWord, Region, Resolution};

pub use tokio_util::sync::CancellationToken;
