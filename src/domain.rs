//! Validated scheduling vocabulary.
//!
//! Everything past the input boundary is keyed by [`Day::index`] into fixed
//! seven-element arrays and measured in minutes since midnight.

use std::fmt;

use chrono::{NaiveTime, Timelike};

pub type Minutes = u32;

/// Canonical week order, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    const NAMES: [&'static str; 7] = [
        "Lunes",
        "Martes",
        "Miércoles",
        "Jueves",
        "Viernes",
        "Sábado",
        "Domingo",
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used on the wire.
    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    /// Exact lookup of a wire day name.
    pub fn from_name(name: &str) -> Option<Day> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minute of the day. Seconds are dropped on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(Minutes);

impl ClockTime {
    pub fn from_minutes(minutes: Minutes) -> Self {
        Self(minutes)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self(hour * 60 + minute)
    }

    /// Parses `HH:MM:SS`.
    pub fn parse(s: &str) -> Option<Self> {
        let t = NaiveTime::parse_from_str(s, "%H:%M:%S").ok()?;
        Some(Self(t.hour() * 60 + t.minute()))
    }

    pub fn minutes(self) -> Minutes {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:00", self.0 / 60, self.0 % 60)
    }
}

/// Half-open clock range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Length in minutes, zero for inverted windows.
    pub fn len(&self) -> Minutes {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The team's activity window and active-day mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWindow {
    pub window: TimeWindow,
    pub active_days: [bool; 7],
}

impl ActivityWindow {
    pub fn is_active(&self, day: Day) -> bool {
        self.active_days[day.index()]
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        Day::ALL.into_iter().filter(|d| self.is_active(*d))
    }
}

/// Team-wide worked-minute bounds per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBounds {
    pub min: Minutes,
    pub max: Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub activity: ActivityWindow,
    pub daily: DailyBounds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub weekly_target: Minutes,
    pub mandatory: [Option<TimeWindow>; 7],
    pub restrictions: [Vec<TimeWindow>; 7],
    pub preferences: [Vec<TimeWindow>; 7],
}

impl Worker {
    /// A worker with a weekly target and no per-day windows.
    pub fn new(id: impl Into<String>, name: impl Into<String>, weekly_target: Minutes) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weekly_target,
            mandatory: Default::default(),
            restrictions: Default::default(),
            preferences: Default::default(),
        }
    }
}

/// A validated request, ready for model construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub team: Team,
    pub workers: Vec<Worker>,
}
