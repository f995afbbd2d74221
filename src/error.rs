use std::fmt;

use crate::config::ConfigError;

/// Rejection of a request before any model is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid time format in {field}: {value:?} (expected HH:MM:SS)")]
    InvalidTime { field: String, value: String },

    #[error("diasActividad must be 7 digits of 0/1, got {0:?}")]
    InvalidActivityDays(String),

    #[error("activity end {end} must be after activity start {start}")]
    EmptyActivityWindow { start: String, end: String },

    #[error("invalid daily hours: minimum {min} must be below maximum {max} and both must be representable in minutes")]
    DailyBounds { min: u32, max: u32 },

    #[error("invalid weekly hours for worker {worker}: {hours}")]
    WeeklyHours { worker: String, hours: i64 },

    #[error("unknown day {day:?} in {field} of worker {worker}")]
    UnknownDay {
        worker: String,
        field: &'static str,
        day: String,
    },
}

/// Terminal status reported by a solve engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal assignment.
    Optimal,
    /// Assignment found within the time budget, optimality not proven.
    Feasible,
    Infeasible,
    /// Time budget exhausted without any assignment.
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The engine proved infeasibility or ran out of time without a solution.
    #[error("no feasible schedule could be found (solver status: {status})")]
    NoFeasibleSchedule { status: SolveStatus },

    #[error("solver execution failed: {0}")]
    Solver(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
