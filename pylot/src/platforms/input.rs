use super::InputDevice;
use crate::errors::PilotError;
use crate::types::Point;
use rdev::{Button, EventType};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, instrument};

// Spacing between intermediate pointer positions while gliding.
const MOVE_STEP: Duration = Duration::from_millis(10);
// Hold time between press and release.
const PRESS_HOLD: Duration = Duration::from_millis(40);

/// Pointer input through the OS event queue.
///
/// The OS cursor position cannot be queried, so moves glide from the last
/// position this device put the pointer at. The first move jumps directly.
pub struct RdevInput {
    last: Mutex<Option<Point>>,
}

impl RdevInput {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    fn last_position(&self) -> Option<Point> {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remember(&self, point: Point) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(point);
    }

    async fn glide(&self, target: Point, duration: Duration) -> Result<(), PilotError> {
        let steps = (duration.as_millis() / MOVE_STEP.as_millis()).max(1) as u32;
        let start = self.last_position().unwrap_or(target);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            let x = start.x as f64 + (target.x - start.x) as f64 * t;
            let y = start.y as f64 + (target.y - start.y) as f64 * t;
            send(&EventType::MouseMove { x, y })?;
            tokio::time::sleep(MOVE_STEP).await;
        }

        self.remember(target);
        Ok(())
    }
}

impl Default for RdevInput {
    fn default() -> Self {
        Self::new()
    }
}

fn send(event: &EventType) -> Result<(), PilotError> {
    rdev::simulate(event)
        .map_err(|e| PilotError::Input(format!("Failed to simulate {event:?}: {e:?}")))
}

#[async_trait::async_trait]
impl InputDevice for RdevInput {
    #[instrument(level = "debug", skip(self))]
    async fn move_to(&self, point: Point, duration: Duration) -> Result<(), PilotError> {
        self.glide(point, duration).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn click(&self, point: Point, duration: Duration) -> Result<(), PilotError> {
        self.glide(point, duration).await?;
        send(&EventType::ButtonPress(Button::Left))?;
        tokio::time::sleep(PRESS_HOLD).await;
        send(&EventType::ButtonRelease(Button::Left))
    }
}

/// Logs pointer actions instead of performing them.
pub struct DryRunInput;

#[async_trait::async_trait]
impl InputDevice for DryRunInput {
    async fn move_to(&self, point: Point, duration: Duration) -> Result<(), PilotError> {
        info!("[dry run] move to {point} over {duration:?}");
        Ok(())
    }

    async fn click(&self, point: Point, duration: Duration) -> Result<(), PilotError> {
        info!("[dry run] click at {point} over {duration:?}");
        Ok(())
    }
}
