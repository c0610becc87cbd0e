//! Startup configuration.
//!
//! Everything here is read once before the loop starts and never changes
//! afterwards. Any failure is a [`PilotError::Config`].

use crate::catalog::Catalog;
use crate::errors::PilotError;
use crate::matcher::Matcher;
use crate::sequencer::{Sequencer, DEFAULT_RESERVED_TAIL};
use crate::types::{Point, Region};
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const CATALOG_FILE: &str = "pochven.txt";
pub const SCREEN_CONFIG_FILE: &str = "screen_config.yaml";
pub const DESTINATION_FILE: &str = "destination.txt";
pub const KEY_FILE: &str = "key.txt";

/// Grayscale cut-off below which pixels are blanked before OCR.
pub const DEFAULT_THRESHOLD: u8 = 180;

/// Calibrated screen positions of the controls and text regions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScreenConfig {
    /// Confirms the jump once a gate is selected.
    pub jump: Point,
    /// Probe scanner "analyze" button. Recorded by calibration; the loop
    /// does not press it.
    pub scan: Point,
    /// List of visible gates.
    pub overview: Region,
    /// Probe scanner results.
    pub probe: Region,
    /// Current system name.
    pub system: Region,
    /// Directional scan results.
    pub dscan: Region,
}

impl ScreenConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PilotError::Config(format!(
                "{} could not be read ({e}); run the screen calibration first",
                path.display()
            ))
        })?;
        Self::parse(&contents)
            .map_err(|e| PilotError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }
}

/// A base duration plus a uniformly random extra of up to `spread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub base: Duration,
    pub spread: Duration,
}

impl Jitter {
    pub const fn new(base: Duration, spread: Duration) -> Self {
        Self { base, spread }
    }

    pub const fn fixed(base: Duration) -> Self {
        Self::new(base, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.spread.is_zero() {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.spread.as_secs_f64());
        self.base + Duration::from_secs_f64(extra)
    }
}

/// Timing of the navigation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Position polls before giving up on a transition.
    pub await_attempts: u32,
    pub poll_interval: Duration,
    /// Sleep after a contained cycle failure.
    pub backoff: Jitter,
    /// Sleep after a completed cycle.
    pub settle: Jitter,
    /// Pause between the individual pointer steps of a navigation action.
    pub step_delay: Jitter,
    pub move_duration: Jitter,
    pub click_duration: Jitter,
    pub report_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            await_attempts: 50,
            poll_interval: Duration::from_secs(1),
            backoff: Jitter::new(Duration::from_secs(5), Duration::from_secs(3)),
            settle: Jitter::new(Duration::from_secs(5), Duration::from_secs(3)),
            step_delay: Jitter::new(Duration::from_millis(100), Duration::from_millis(200)),
            move_duration: Jitter::new(Duration::from_millis(300), Duration::from_millis(300)),
            click_duration: Jitter::new(Duration::from_millis(500), Duration::from_millis(300)),
            report_timeout: Duration::from_millis(2500),
        }
    }
}

impl Pacing {
    /// No waiting at all. Used by tests and dry runs against fakes.
    pub fn immediate() -> Self {
        let none = Jitter::fixed(Duration::ZERO);
        Self {
            await_attempts: 50,
            poll_interval: Duration::ZERO,
            backoff: none,
            settle: none,
            step_delay: none,
            move_duration: none,
            click_duration: none,
            report_timeout: Duration::from_millis(2500),
        }
    }
}

/// Everything the loop needs, built once at startup.
#[derive(Debug, Clone)]
pub struct PilotConfig {
    pub catalog: Arc<Catalog>,
    pub screen: ScreenConfig,
    pub endpoint: String,
    pub key: String,
    pub reserved_tail: usize,
    pub min_score: f64,
    pub threshold: u8,
    pub pacing: Pacing,
}

impl PilotConfig {
    pub fn new(catalog: Catalog, screen: ScreenConfig, endpoint: String, key: String) -> Self {
        Self {
            catalog: Arc::new(catalog),
            screen,
            endpoint,
            key,
            reserved_tail: DEFAULT_RESERVED_TAIL,
            min_score: 0.0,
            threshold: DEFAULT_THRESHOLD,
            pacing: Pacing::default(),
        }
    }

    /// Load the catalog, calibration, endpoint and key from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PilotError> {
        let dir = dir.as_ref();
        let catalog = Catalog::load(dir.join(CATALOG_FILE))?;
        let screen = ScreenConfig::load(dir.join(SCREEN_CONFIG_FILE))?;
        let endpoint = read_value(&dir.join(DESTINATION_FILE))?;
        validate_endpoint(&endpoint)?;
        let key = read_value(&dir.join(KEY_FILE))?;

        info!(
            systems = catalog.len(),
            "Loaded configuration from {}",
            dir.display()
        );
        debug!(?screen, endpoint, "Screen calibration");

        Ok(Self::new(catalog, screen, endpoint, key))
    }

    pub fn with_reserved_tail(mut self, reserved_tail: usize) -> Self {
        self.reserved_tail = reserved_tail;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Matcher over this catalog; fails on a minimum score outside `[0, 1]`.
    pub fn matcher(&self) -> Result<Matcher, PilotError> {
        Matcher::new(self.catalog.clone()).with_min_score(self.min_score)
    }

    /// Route policy for this catalog; fails if the reserved tail swallows it.
    pub fn sequencer(&self) -> Result<Sequencer, PilotError> {
        Sequencer::new(self.catalog.len(), self.reserved_tail)
    }
}

fn read_value(path: &Path) -> Result<String, PilotError> {
    let value = std::fs::read_to_string(path)
        .map_err(|e| PilotError::Config(format!("Failed to read {}: {e}", path.display())))?
        .trim()
        .to_string();
    if value.is_empty() {
        return Err(PilotError::Config(format!("{} is empty", path.display())));
    }
    Ok(value)
}

fn validate_endpoint(endpoint: &str) -> Result<(), PilotError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| PilotError::Config(format!("Invalid report endpoint '{endpoint}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(PilotError::Config(format!(
            "Report endpoint must be http or https, got '{scheme}'"
        ))),
    }
}
