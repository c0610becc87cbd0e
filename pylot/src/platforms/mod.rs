//! Seams to the outside world: reading the screen and driving the pointer.
//!
//! The navigation loop only talks to these traits, so it can be exercised
//! with scripted fakes. The concrete adapters live in the submodules.

use crate::errors::PilotError;
use crate::types::{Point, RecognizedWord, Region};
use std::time::Duration;

pub mod input;
pub mod screen;

pub use input::{DryRunInput, RdevInput};
pub use screen::ScreenRecognizer;

/// Turns screen regions into text.
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    /// Read every word in `region` together with its region-relative box.
    async fn read_words(&self, region: Region) -> Result<Vec<RecognizedWord>, PilotError>;

    /// Read all text in `region` as a single string.
    ///
    /// Empty or garbled output is a valid result, not an error.
    async fn read_text(&self, region: Region) -> Result<String, PilotError>;
}

/// Simulated pointer.
#[async_trait::async_trait]
pub trait InputDevice: Send + Sync {
    /// Glide the pointer to `point` over `duration`.
    async fn move_to(&self, point: Point, duration: Duration) -> Result<(), PilotError>;

    /// Glide to `point` over `duration` and press the primary button.
    async fn click(&self, point: Point, duration: Duration) -> Result<(), PilotError>;
}

/// Input device for a live or dry run.
pub fn create_input(dry_run: bool) -> Box<dyn InputDevice> {
    if dry_run {
        Box::new(DryRunInput)
    } else {
        Box::new(RdevInput::new())
    }
}
