//! Scripted orb sessions: timestamped command phrases replayed against a
//! scene.

use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{animation::FlashKind, scene::OrbScene, OrbError, Result};

const FLASH_PREFIX: &str = "flash:";
const SAY_PREFIX: &str = "say:";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }
}

/// What a scheduled label asks the scene to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    Command(String),
    Flash(FlashKind),
    Say(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub time_seconds: f64,
    pub label: String,
}

impl ScheduledEvent {
    pub fn new(time_seconds: f64, label: impl Into<String>) -> Self {
        Self {
            time_seconds,
            label: label.into(),
        }
    }

    pub fn action(&self) -> Result<EventAction> {
        let label = self.label.trim();
        if let Some(kind) = label.strip_prefix(FLASH_PREFIX) {
            return Ok(EventAction::Flash(FlashKind::from_str(kind)?));
        }
        if let Some(text) = label.strip_prefix(SAY_PREFIX) {
            return Ok(EventAction::Say(text.trim().to_string()));
        }
        if label.is_empty() {
            return Err(OrbError::InvalidInput("empty event label"));
        }
        Ok(EventAction::Command(label.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    events: Vec<ScheduledEvent>,
    next_event: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut scheduler = Self::new();
        scheduler.set_events(serde_json::from_str(json)?);
        Ok(scheduler)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "loading command script");
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn set_events(&mut self, events: Vec<ScheduledEvent>) {
        self.events = events;
        self.events
            .sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
        self.next_event = 0;
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.next_event >= self.events.len()
    }

    /// Time of the last event, or zero for an empty script.
    pub fn duration(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.time_seconds)
    }

    /// Fires every pending event due at `clock`, in order, and returns how
    /// many fired. Labels that fail to parse are skipped with a warning.
    pub fn tick(&mut self, clock: &PlaybackClock, scene: &mut OrbScene) -> usize {
        let now = clock.time_seconds;
        let mut fired = 0;
        while let Some(event) = self.events.get(self.next_event) {
            if event.time_seconds > now {
                break;
            }
            self.next_event += 1;
            fired += 1;

            match event.action() {
                Ok(EventAction::Command(text)) => {
                    scene.apply_command(&text, now);
                }
                Ok(EventAction::Flash(kind)) => scene.flash(kind, now),
                Ok(EventAction::Say(text)) => {
                    scene.apply_sentiment(&text, now);
                }
                Err(err) => warn!(label = %event.label, %err, "skipping scheduled event"),
            }
        }
        fired
    }
}
