use log::{error, info};
use std::time::Instant;

use crate::builder::ModelBuilder;
use crate::config::Settings;
use crate::data::{Schedule, ScheduleRequest};
use crate::decoder::{self, SlotMatrix, WorkerSummary};
use crate::domain::Problem;
use crate::engine::{HighsEngine, SolveEngine, SolverOptions};
use crate::error::{Result, ScheduleError, SolveStatus, ValidationError};
use crate::grid::TimeGrid;
use crate::objective;

/// Everything a successful solve produces.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule: Schedule,
    pub status: SolveStatus,
    pub objective: i64,
    pub summaries: Vec<WorkerSummary>,
}

/// Solves the scheduling problem using the HiGHS ILP solver.
pub fn solve(request: &ScheduleRequest, settings: &Settings) -> Result<ScheduleOutcome> {
    solve_with(&HighsEngine::new(), request, settings)
}

/// Validates `request` and solves it on `engine`.
pub fn solve_with(
    engine: &dyn SolveEngine,
    request: &ScheduleRequest,
    settings: &Settings,
) -> Result<ScheduleOutcome> {
    info!("Starting schedule resolution");
    let problem = crate::validation::validate(request, settings.model.strict_day_names)?;
    solve_problem(engine, &problem, settings)
}

/// Builds a fresh model for `problem`, solves it and decodes the result.
pub fn solve_problem(
    engine: &dyn SolveEngine,
    problem: &Problem,
    settings: &Settings,
) -> Result<ScheduleOutcome> {
    let start_time = Instant::now();
    let window = problem.team.activity.window;
    let grid = TimeGrid::new(window, settings.model.slot_minutes).ok_or_else(|| {
        ValidationError::EmptyActivityWindow {
            start: window.start.to_string(),
            end: window.end.to_string(),
        }
    })?;

    let mut built = ModelBuilder::new(problem, grid, &settings.model).build();
    objective::compose(&mut built, &settings.weights);

    let work = built.work;
    let options = SolverOptions::from(&settings.solver);
    info!("Solving with {}", engine.name());
    let outcome = engine.solve(built.model, &options)?;

    let assignment = match outcome.assignment {
        Some(assignment) if outcome.status.has_solution() => assignment,
        _ => {
            error!("No feasible schedule found (status {})", outcome.status);
            return Err(ScheduleError::NoFeasibleSchedule {
                status: outcome.status,
            });
        }
    };

    let slots = SlotMatrix::from_assignment(&work, &assignment);
    let schedule = decoder::decode(problem, &grid, &slots);
    let summaries = decoder::summarize(problem, &grid, &slots);
    decoder::log_summaries(&summaries);
    info!(
        "Schedule resolved in {:.2?}: {} day(s) with shifts",
        start_time.elapsed(),
        schedule.scheduled_days()
    );

    Ok(ScheduleOutcome {
        schedule,
        status: outcome.status,
        objective: outcome.objective.unwrap_or_default(),
        summaries,
    })
}
