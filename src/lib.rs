//! Weekly shift scheduling as an integer program.
//!
//! A request is validated into a [`domain::Problem`], discretised onto a
//! [`grid::TimeGrid`], turned into a [`model::Model`] by
//! [`builder::ModelBuilder`], given an objective by [`objective::compose`],
//! solved by a [`engine::SolveEngine`] and decoded back into contiguous
//! shifts by [`decoder::decode`].

pub mod builder;
pub mod config;
pub mod data;
pub mod decoder;
pub mod domain;
pub mod engine;
pub mod error;
pub mod grid;
pub mod model;
pub mod objective;
pub mod server;
pub mod solver;
pub mod validation;

pub use config::Settings;
pub use data::{Schedule, ScheduleRequest, ScheduleResponse, WorkerShift};
pub use error::{ScheduleError, SolveStatus, ValidationError};
pub use solver::{ScheduleOutcome, solve, solve_with};
