//! The exploring / awaiting-transition loop.

use crate::config::PilotConfig;
use crate::errors::PilotError;
use crate::matcher::Matcher;
use crate::platforms::{self, InputDevice, Recognizer, ScreenRecognizer};
use crate::report::{HttpReportSink, ReportEmitter, ReportSink};
use crate::selector;
use crate::sequencer::Sequencer;
use crate::types::{Candidate, Point, Resolution};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Where the loop is between steps.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleState {
    Exploring,
    AwaitingTransition { last_known: Resolution },
}

/// What one exploring phase saw and did.
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    pub position: Resolution,
    pub candidates: Vec<Candidate>,
    pub desired_index: usize,
    /// Set when no candidate resolved to `desired_index` and the first one
    /// was used instead.
    pub fell_back: bool,
    pub target: Candidate,
    pub target_point: Point,
}

/// How an awaiting-transition phase ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Arrived(Resolution),
    /// The position never changed within the attempt bound.
    GaveUp,
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub arrivals: u64,
    pub failures: u64,
}

pub struct Navigator {
    config: Arc<PilotConfig>,
    matcher: Matcher,
    sequencer: Sequencer,
    recognizer: Box<dyn Recognizer>,
    input: Box<dyn InputDevice>,
    emitter: ReportEmitter,
}

impl Navigator {
    pub fn new(
        config: Arc<PilotConfig>,
        recognizer: Box<dyn Recognizer>,
        input: Box<dyn InputDevice>,
        sink: Box<dyn ReportSink>,
    ) -> Result<Self, PilotError> {
        let sequencer = config.sequencer()?;
        let matcher = config.matcher()?;
        let emitter = ReportEmitter::new(sink, config.key.clone());
        Ok(Self {
            config,
            matcher,
            sequencer,
            recognizer,
            input,
            emitter,
        })
    }

    /// Navigator wired to the real screen, pointer and collector.
    pub fn from_config(config: Arc<PilotConfig>, dry_run: bool) -> Result<Self, PilotError> {
        let recognizer = Box::new(ScreenRecognizer::new(config.threshold));
        let sink = Box::new(HttpReportSink::new(
            config.endpoint.clone(),
            config.pacing.report_timeout,
        )?);
        let input = platforms::create_input(dry_run);
        Self::new(config, recognizer, input, sink)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles; a cycle that has started
    /// always runs to completion. Transient failures are logged and retried
    /// after a backoff without limit. Configuration errors end the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunStats, PilotError> {
        let mut stats = RunStats::default();
        let mut state = CycleState::Exploring;

        loop {
            let step = match &state {
                CycleState::Exploring => {
                    if cancel.is_cancelled() {
                        info!(?stats, "Navigation loop cancelled");
                        return Ok(stats);
                    }
                    self.explore().await.map(|exploration| {
                        CycleState::AwaitingTransition {
                            last_known: exploration.position,
                        }
                    })
                }
                CycleState::AwaitingTransition { last_known } => {
                    self.await_transition(last_known).await.map(|transition| {
                        stats.cycles += 1;
                        if matches!(transition, Transition::Arrived(_)) {
                            stats.arrivals += 1;
                        }
                        CycleState::Exploring
                    })
                }
            };

            match step {
                Ok(CycleState::Exploring) => {
                    pause(self.config.pacing.settle.sample(), &cancel).await;
                    state = CycleState::Exploring;
                }
                Ok(next) => state = next,
                Err(e) if e.is_transient() => {
                    stats.failures += 1;
                    error!("Error during cycle, retrying: {}", e);
                    pause(self.config.pacing.backoff.sample(), &cancel).await;
                    state = CycleState::Exploring;
                }
                Err(e) => {
                    error!("Fatal error, stopping navigation: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Resolve the current system from the position region.
    pub async fn resolve_position(&self) -> Result<Resolution, PilotError> {
        let text = self
            .recognizer
            .read_text(self.config.screen.system)
            .await?;
        Ok(self.matcher.resolve_position(&text))
    }

    /// Resolve every word in the overview to a candidate, in screen order.
    pub async fn resolve_candidates(&self) -> Result<Vec<Candidate>, PilotError> {
        let words = self
            .recognizer
            .read_words(self.config.screen.overview)
            .await?;
        Ok(words
            .into_iter()
            .map(|word| Candidate::new(self.matcher.resolve(&word.text), word.bbox))
            .collect())
    }

    /// Observe the current system, report it, and start the jump to the
    /// next one.
    #[instrument(level = "debug", skip(self))]
    pub async fn explore(&self) -> Result<Exploration, PilotError> {
        info!("Exploring new system");
        let screen = &self.config.screen;

        let position = self.resolve_position().await?;
        let probe = self.recognizer.read_text(screen.probe).await?;
        let dscan = self.recognizer.read_text(screen.dscan).await?;
        let candidates = self.resolve_candidates().await?;

        info!("System: {}", position);
        debug!(?candidates, "Overview");

        // Delivery failures are already logged; they never hold up the jump.
        let _ = self.emitter.emit(&position, &probe, &dscan).await;

        let desired_index = self.sequencer.next_after(&position);
        let (target, fell_back) = match selector::select(&candidates, desired_index) {
            Some(target) => (target, false),
            None => {
                let target = selector::select_or_first(&candidates, desired_index)
                    .ok_or(PilotError::NoCandidates)?;
                warn!(
                    desired_index,
                    "No gate to {:?} in the overview, using the first entry {}",
                    self.matcher.catalog().name_at(desired_index),
                    target.resolution
                );
                (target, true)
            }
        };
        info!("Going to next gate {}", target.resolution);

        let target_point = self.jump_via(target).await?;
        Ok(Exploration {
            position,
            desired_index,
            fell_back,
            target: target.clone(),
            target_point,
            candidates,
        })
    }

    /// Select the gate, then confirm the jump.
    async fn jump_via(&self, target: &Candidate) -> Result<Point, PilotError> {
        let pacing = &self.config.pacing;
        let gate = self.config.screen.overview.offset(&target.bbox);
        let jump = self.config.screen.jump;

        self.input.move_to(gate, pacing.move_duration.sample()).await?;
        tokio::time::sleep(pacing.step_delay.sample()).await;
        self.input.click(gate, pacing.click_duration.sample()).await?;
        tokio::time::sleep(pacing.step_delay.sample()).await;
        self.input.move_to(jump, pacing.move_duration.sample()).await?;
        tokio::time::sleep(pacing.step_delay.sample()).await;
        self.input.click(jump, pacing.click_duration.sample()).await?;

        debug!(%gate, %jump, "Jump issued");
        Ok(gate)
    }

    /// Poll the position until it resolves to a system other than
    /// `last_known`, or the attempt bound runs out.
    #[instrument(level = "debug", skip(self))]
    pub async fn await_transition(&self, last_known: &Resolution) -> Result<Transition, PilotError> {
        info!("Waiting for jump");
        let pacing = &self.config.pacing;

        for attempt in 1..=pacing.await_attempts {
            let current = self.resolve_position().await?;
            debug!(attempt, "Scan for system change: {}", current);
            if let Some(index) = current.index() {
                if last_known.index() != Some(index) {
                    info!("Arrived in {}", current);
                    return Ok(Transition::Arrived(current));
                }
            }
            if attempt < pacing.await_attempts {
                tokio::time::sleep(pacing.poll_interval).await;
            }
        }

        warn!(
            attempts = pacing.await_attempts,
            "Position still {} after waiting, moving on", last_known
        );
        Ok(Transition::GaveUp)
    }
}

/// Sleep for `duration` unless cancelled first.
async fn pause(duration: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(duration) => {}
    }
}
