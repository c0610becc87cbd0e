#![allow(dead_code)]

use pylot::{
    CancellationToken, Catalog, InputDevice, ObservationReport, Pacing, PilotConfig, PilotError,
    Point, RecognizedWord, Recognizer, Region, ReportSink, ScreenConfig, BBox,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SYSTEMS: [&str; 16] = [
    "Ala", "Ahtila", "Arvasaras", "Harva", "Ichoriya", "Kaunokka", "Kino", "Konola", "Krirald",
    "Niarja", "Nalvula", "Otanuomi", "Otela", "Otit", "Raravoss", "Sakenta",
];

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_test_writer()
        .try_init();
}

pub fn screen() -> ScreenConfig {
    ScreenConfig {
        jump: Point::new(1700, 120),
        scan: Point::new(60, 280),
        overview: Region::new(1500, 200, 400, 600),
        probe: Region::new(20, 300, 500, 350),
        system: Region::new(30, 40, 250, 30),
        dscan: Region::new(20, 700, 400, 300),
    }
}

pub fn config_with(pacing: Pacing) -> Arc<PilotConfig> {
    Arc::new(
        PilotConfig::new(
            Catalog::from_names(SYSTEMS).unwrap(),
            screen(),
            "http://127.0.0.1:9/report".to_string(),
            "k3y".to_string(),
        )
        .with_pacing(pacing),
    )
}

pub fn config() -> Arc<PilotConfig> {
    config_with(Pacing::immediate())
}

pub fn word(text: &str, x: i32, y: i32) -> RecognizedWord {
    RecognizedWord::new(text, BBox::new(x, y, 20, 20))
}

#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    Fail,
    Fatal,
}

impl From<&str> for Step {
    fn from(text: &str) -> Self {
        Step::Text(text.to_string())
    }
}

struct Script {
    positions: VecDeque<Step>,
    last_position: String,
    overview: Vec<RecognizedWord>,
    probe: String,
    dscan: String,
    position_reads: usize,
}

/// Recognizer that replays scripted position readings.
///
/// Once the script runs out, the last successful reading repeats.
#[derive(Clone)]
pub struct ScriptedRecognizer {
    screen: ScreenConfig,
    script: Arc<Mutex<Script>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(positions: I, overview: Vec<RecognizedWord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Self {
            screen: screen(),
            script: Arc::new(Mutex::new(Script {
                positions: positions.into_iter().map(Into::into).collect(),
                last_position: String::new(),
                overview,
                probe: "  Sleeper Drone  \n\nWreck\n".to_string(),
                dscan: "Tengu\n".to_string(),
                position_reads: 0,
            })),
        }
    }

    pub fn position_reads(&self) -> usize {
        self.script.lock().unwrap().position_reads
    }

    fn next_position(&self) -> Result<String, PilotError> {
        let mut script = self.script.lock().unwrap();
        script.position_reads += 1;
        match script.positions.pop_front() {
            Some(Step::Text(text)) => {
                script.last_position = text.clone();
                Ok(text)
            }
            Some(Step::Fail) => Err(PilotError::Recognition("unreadable frame".to_string())),
            Some(Step::Fatal) => Err(PilotError::Config("calibration lost".to_string())),
            None => Ok(script.last_position.clone()),
        }
    }
}

#[async_trait::async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn read_words(&self, region: Region) -> Result<Vec<RecognizedWord>, PilotError> {
        assert_eq!(region, self.screen.overview, "words read outside the overview");
        Ok(self.script.lock().unwrap().overview.clone())
    }

    async fn read_text(&self, region: Region) -> Result<String, PilotError> {
        if region == self.screen.system {
            return self.next_position();
        }
        let script = self.script.lock().unwrap();
        if region == self.screen.probe {
            Ok(script.probe.clone())
        } else if region == self.screen.dscan {
            Ok(script.dscan.clone())
        } else {
            Err(PilotError::Recognition(format!("unexpected region {region}")))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Point),
    Click(Point),
}

#[derive(Clone, Default)]
pub struct RecordingInput {
    pub actions: Arc<Mutex<Vec<Action>>>,
}

impl RecordingInput {
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Click(point) => Some(point),
                Action::Move(_) => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl InputDevice for RecordingInput {
    async fn move_to(&self, point: Point, _duration: Duration) -> Result<(), PilotError> {
        self.actions.lock().unwrap().push(Action::Move(point));
        Ok(())
    }

    async fn click(&self, point: Point, _duration: Duration) -> Result<(), PilotError> {
        self.actions.lock().unwrap().push(Action::Click(point));
        Ok(())
    }
}

/// Records reports and optionally cancels the loop after a number of them.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub reports: Arc<Mutex<Vec<ObservationReport>>>,
    cancel_after: Option<(usize, CancellationToken)>,
    fail: bool,
}

impl RecordingSink {
    pub fn cancelling_after(count: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((count, token)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reports(&self) -> Vec<ObservationReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReportSink for RecordingSink {
    async fn send(&self, report: &ObservationReport) -> Result<(), PilotError> {
        let sent = {
            let mut reports = self.reports.lock().unwrap();
            reports.push(report.clone());
            reports.len()
        };
        if let Some((count, token)) = &self.cancel_after {
            if sent >= *count {
                token.cancel();
            }
        }
        if self.fail {
            return Err(PilotError::Report("collector offline".to_string()));
        }
        Ok(())
    }
}
