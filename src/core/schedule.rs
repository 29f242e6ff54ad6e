//! Wall-clock lookup table deciding which funnel stage a periodic trigger exercises.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    FetchCheck,
    ScraperCheck,
    GenerateCheck,
    DeployCheck,
    SmsCheck,
    EndToEndCheck,
    MorningWake,
    MorningBatch,
    FullRun,
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::FetchCheck => "FETCH_CHECK",
            RunMode::ScraperCheck => "SCRAPER_CHECK",
            RunMode::GenerateCheck => "GENERATE_CHECK",
            RunMode::DeployCheck => "DEPLOY_CHECK",
            RunMode::SmsCheck => "SMS_CHECK",
            RunMode::EndToEndCheck => "E2E_CHECK",
            RunMode::MorningWake => "MORNING_WAKE",
            RunMode::MorningBatch => "MORNING_BATCH",
            RunMode::FullRun => "FULL_RUN",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A mode that applies from `hour:from_minute` until the next slot of the same hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub hour: u32,
    #[serde(default)]
    pub from_minute: u32,
    pub mode: RunMode,
}

impl ScheduleSlot {
    pub const fn new(hour: u32, from_minute: u32, mode: RunMode) -> Self {
        Self {
            hour,
            from_minute,
            mode,
        }
    }
}

/// Night checks from 00h to 05h, morning wake/batch around 06h-07h.
pub fn default_slots() -> Vec<ScheduleSlot> {
    vec![
        ScheduleSlot::new(0, 0, RunMode::FetchCheck),
        ScheduleSlot::new(1, 0, RunMode::ScraperCheck),
        ScheduleSlot::new(2, 0, RunMode::GenerateCheck),
        ScheduleSlot::new(3, 0, RunMode::DeployCheck),
        ScheduleSlot::new(4, 0, RunMode::SmsCheck),
        ScheduleSlot::new(5, 0, RunMode::EndToEndCheck),
        ScheduleSlot::new(6, 0, RunMode::EndToEndCheck),
        ScheduleSlot::new(6, 20, RunMode::MorningWake),
        ScheduleSlot::new(6, 40, RunMode::MorningBatch),
        ScheduleSlot::new(7, 0, RunMode::MorningBatch),
        ScheduleSlot::new(7, 1, RunMode::MorningWake),
    ]
}

#[derive(Debug, Clone)]
pub struct Schedule {
    slots: Vec<ScheduleSlot>,
}

impl Schedule {
    pub fn new(slots: Vec<ScheduleSlot>) -> Self {
        Self { slots }
    }

    /// Slot of the same hour with the greatest `from_minute <= minute`.
    pub fn resolve(&self, hour: u32, minute: u32) -> Option<RunMode> {
        self.slots
            .iter()
            .filter(|slot| slot.hour == hour && slot.from_minute <= minute)
            .max_by_key(|slot| slot.from_minute)
            .map(|slot| slot.mode)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(default_slots())
    }
}

/// `HH:MM` as used in journal tags.
pub fn time_slot(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

/// Parses `HH:MM` (e.g. from `--at 06:25`).
pub fn parse_time_slot(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}
