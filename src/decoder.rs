use itertools::Itertools;
use log::{info, trace};

use crate::builder::WorkVars;
use crate::data::{Schedule, WorkerShift};
use crate::domain::{ClockTime, Day, Minutes, Problem};
use crate::grid::TimeGrid;
use crate::model::Assignment;

/// Plain worker × day × slot truth table, days in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMatrix {
    workers: usize,
    slots: usize,
    cells: Vec<bool>,
}

impl SlotMatrix {
    pub fn new(workers: usize, slots: usize) -> Self {
        Self {
            workers,
            slots,
            cells: vec![false; workers * 7 * slots],
        }
    }

    fn cell(&self, worker: usize, day: Day, slot: usize) -> usize {
        (worker * 7 + day.index()) * self.slots + slot
    }

    pub fn get(&self, worker: usize, day: Day, slot: usize) -> bool {
        self.cells[self.cell(worker, day, slot)]
    }

    pub fn set(&mut self, worker: usize, day: Day, slot: usize, worked: bool) {
        let i = self.cell(worker, day, slot);
        self.cells[i] = worked;
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Worked slot indices of one worker-day, ascending.
    pub fn assigned(&self, worker: usize, day: Day) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots).filter(move |s| self.get(worker, day, *s))
    }

    /// Reads the "working" block out of a solver assignment.
    pub fn from_assignment(work: &WorkVars, assignment: &Assignment) -> Self {
        let mut matrix = Self::new(work.workers(), work.slots());
        for (d, day) in work.days().iter().copied().enumerate() {
            for w in 0..work.workers() {
                for s in 0..work.slots() {
                    if assignment.is_true(work.var(w, d, s)) {
                        matrix.set(w, day, s, true);
                    }
                }
            }
        }
        matrix
    }

    /// Encodes a shift list onto the grid. Returns `None` for unknown
    /// workers or times that do not fall on slot boundaries.
    pub fn from_shifts(problem: &Problem, grid: &TimeGrid, schedule: &Schedule) -> Option<Self> {
        let mut matrix = Self::new(problem.workers.len(), grid.slot_count());
        for (day, shifts) in schedule.iter() {
            for shift in shifts {
                let w = problem.workers.iter().position(|x| x.id == shift.worker_id)?;
                let first = grid.slot_at(ClockTime::parse(&shift.start_time)?)?;
                let end = grid.slot_at(ClockTime::parse(&shift.end_time)?)?;
                for s in first..end {
                    matrix.set(w, day, s, true);
                }
            }
        }
        Some(matrix)
    }
}

/// Maximal runs of consecutive indices as inclusive `(first, last)` pairs.
pub fn runs(slots: impl IntoIterator<Item = usize>) -> Vec<(usize, usize)> {
    slots
        .into_iter()
        .map(|s| (s, s))
        .coalesce(|a, b| {
            if b.0 == a.1 + 1 {
                Ok((a.0, b.1))
            } else {
                Err((a, b))
            }
        })
        .collect()
}

/// Turns worked slots into per-day shift lists.
///
/// Shifts of a day are ordered by worker, then start time. Days without any
/// shift stay empty and are therefore left out when serialized.
pub fn decode(problem: &Problem, grid: &TimeGrid, slots: &SlotMatrix) -> Schedule {
    let mut schedule = Schedule::new();
    for day in problem.team.activity.days() {
        for (w, worker) in problem.workers.iter().enumerate() {
            let intervals = runs(slots.assigned(w, day));
            for (first, last) in &intervals {
                schedule.push(
                    day,
                    WorkerShift {
                        worker_id: worker.id.clone(),
                        start_time: grid.slot_start(*first).to_string(),
                        end_time: grid.slot_end(*last).to_string(),
                    },
                );
            }
            if !intervals.is_empty() {
                trace!(
                    "Worker {} on {}: {} shift(s)",
                    worker.id,
                    day,
                    intervals.len()
                );
            }
        }
    }
    schedule
}

/// Per-worker totals of a decoded week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: String,
    pub target_minutes: Minutes,
    pub assigned_minutes: Minutes,
    pub shortfall_minutes: Minutes,
    pub days_working: usize,
    pub total_shifts: usize,
}

pub fn summarize(problem: &Problem, grid: &TimeGrid, slots: &SlotMatrix) -> Vec<WorkerSummary> {
    problem
        .workers
        .iter()
        .enumerate()
        .map(|(w, worker)| {
            let per_day: Vec<(usize, usize)> = Day::ALL
                .into_iter()
                .map(|day| (slots.assigned(w, day).count(), runs(slots.assigned(w, day)).len()))
                .collect();
            let worked_slots: usize = per_day.iter().map(|(n, _)| n).sum();
            let assigned = worked_slots as Minutes * grid.slot_minutes();
            WorkerSummary {
                worker_id: worker.id.clone(),
                target_minutes: worker.weekly_target,
                assigned_minutes: assigned,
                shortfall_minutes: worker.weekly_target.saturating_sub(assigned),
                days_working: per_day.iter().filter(|(n, _)| *n > 0).count(),
                total_shifts: per_day.iter().map(|(_, k)| k).sum(),
            }
        })
        .collect()
}

pub fn log_summaries(summaries: &[WorkerSummary]) {
    for s in summaries {
        info!(
            "Worker {}: {:.2}h assigned of {:.2}h target ({:.2}h short), {} day(s), {} shift(s), {:.2} shifts/day",
            s.worker_id,
            f64::from(s.assigned_minutes) / 60.0,
            f64::from(s.target_minutes) / 60.0,
            f64::from(s.shortfall_minutes) / 60.0,
            s.days_working,
            s.total_shifts,
            s.total_shifts as f64 / s.days_working.max(1) as f64
        );
    }
}
