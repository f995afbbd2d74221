//! Solve engines.
//!
//! A [`SolveEngine`] receives a finished [`Model`] by value, runs a
//! time-bounded search and reports an [`Assignment`] together with a
//! [`SolveStatus`]. [`HighsEngine`] is the production engine.

use good_lp::solvers::SolutionStatus as LpStatus;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::config::SolverConfig;
use crate::error::{Result, ScheduleError, SolveStatus};
use crate::model::{Assignment, Cmp, Constraint, Domain, LinearExpr, Model};

/// Engine knobs; they affect search effort, never the model's meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub time_limit: Duration,
    pub threads: Option<u32>,
    pub random_seed: Option<i32>,
    pub log_to_console: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self::from(&SolverConfig::default())
    }
}

impl From<&SolverConfig> for SolverOptions {
    fn from(config: &SolverConfig) -> Self {
        Self {
            time_limit: config.time_limit(),
            threads: config.threads,
            random_seed: config.random_seed,
            log_to_console: config.log_to_console,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Present exactly when `status` is `Optimal` or `Feasible`.
    pub assignment: Option<Assignment>,
    pub objective: Option<i64>,
    pub elapsed: Duration,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            status,
            assignment: None,
            objective: None,
            elapsed,
        }
    }
}

pub trait SolveEngine: Send + Sync {
    fn solve(&self, model: Model, options: &SolverOptions) -> Result<SolveOutcome>;

    fn name(&self) -> &str;
}

/// HiGHS MILP solver driven through `good_lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsEngine;

impl HighsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SolveEngine for HighsEngine {
    fn solve(&self, model: Model, options: &SolverOptions) -> Result<SolveOutcome> {
        let start_time = Instant::now();
        if model.num_vars() == 0 {
            debug!("Empty model, nothing to search");
            return Ok(SolveOutcome {
                status: SolveStatus::Optimal,
                assignment: Some(Assignment::new(Vec::new())),
                objective: Some(0),
                elapsed: start_time.elapsed(),
            });
        }

        let mut problem = ProblemVariables::new();
        let columns: Vec<Variable> = model
            .vars()
            .iter()
            .map(|def| match def.domain {
                Domain::Binary => problem.add(variable().binary().name(def.name.as_str())),
                Domain::Integer { lo, hi } => problem.add(
                    variable()
                        .integer()
                        .min(lo as f64)
                        .max(hi as f64)
                        .name(def.name.as_str()),
                ),
            })
            .collect();

        let objective = to_expression(model.objective(), &columns);
        let mut lp = problem
            .maximise(objective)
            .using(default_solver)
            .set_option("time_limit", options.time_limit.as_secs_f64());
        if let Some(threads) = options.threads {
            lp = lp.set_option("threads", threads as i32);
        }
        if let Some(seed) = options.random_seed {
            lp = lp.set_option("random_seed", seed);
        }
        if options.log_to_console {
            lp = lp
                .set_option("output_flag", "true")
                .set_option("log_to_console", "true");
        }

        let mut rows = 0usize;
        for c in model.constraints() {
            for row in linearize(&model, c) {
                let lhs = to_expression(&row.expr, &columns);
                let rhs = row.rhs as f64;
                lp.add_constraint(match row.cmp {
                    Cmp::Le => constraint!(lhs <= rhs),
                    Cmp::Ge => constraint!(lhs >= rhs),
                    Cmp::Eq => constraint!(lhs == rhs),
                });
                rows += 1;
            }
        }

        info!(
            "Starting HiGHS on {} columns and {} rows (time limit {:?})...",
            columns.len(),
            rows,
            options.time_limit
        );
        let result = lp.solve();
        let elapsed = start_time.elapsed();

        let solution = match result {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                info!("Model proven infeasible in {:.2?}", elapsed);
                return Ok(SolveOutcome::without_solution(SolveStatus::Infeasible, elapsed));
            }
            Err(e) => return Err(ScheduleError::Solver(e.to_string())),
        };

        let assignment = Assignment::new(
            columns
                .iter()
                .map(|c| solution.value(*c).round() as i64)
                .collect(),
        );
        let proven = matches!(solution.status(), LpStatus::Optimal);
        let status = incumbent_status(&model, &assignment, proven)?;
        if !status.has_solution() {
            return Ok(SolveOutcome::without_solution(status, elapsed));
        }
        let objective = model.objective_value(&assignment);
        info!("{} solution found in {:.2?} (objective {})", status, elapsed, objective);

        Ok(SolveOutcome {
            status,
            assignment: Some(assignment),
            objective: Some(objective),
            elapsed,
        })
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

fn to_expression(expr: &LinearExpr, columns: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .map(|(v, c)| (*c as f64) * columns[v.index()])
        .sum()
}

/// Status of an assignment returned by the backend.
///
/// A proven optimum must satisfy the model. An unproven incumbent (time or
/// gap limit) counts as `Feasible` only when it does, and as `Unknown`
/// otherwise.
pub fn incumbent_status(model: &Model, assignment: &Assignment, proven: bool) -> Result<SolveStatus> {
    match (proven, model.is_satisfied_by(assignment)) {
        (true, true) => Ok(SolveStatus::Optimal),
        (false, true) => Ok(SolveStatus::Feasible),
        (true, false) => Err(ScheduleError::Solver(
            "engine reported an optimum that violates the model".to_string(),
        )),
        (false, false) => {
            warn!("Search stopped early; the incumbent does not satisfy the model");
            Ok(SolveStatus::Unknown)
        }
    }
}

/// Rewrites a constraint into plain linear rows.
///
/// Reified rows get a big-M taken from the variable domains, so the row is
/// slack exactly when the enforcement literal is false. Rows that can never
/// bind are dropped.
pub fn linearize(model: &Model, c: &Constraint) -> Vec<Constraint> {
    let Some(lit) = c.enforce else {
        return vec![c.clone()];
    };
    let (min, max) = model.expr_range(&c.expr);
    let mut rows = Vec::with_capacity(2);

    // active literal true:  expr <= rhs + M*(1-b)  ->  expr + M*b <= rhs + M
    // negated literal:      expr <= rhs + M*b      ->  expr - M*b <= rhs
    if matches!(c.cmp, Cmp::Le | Cmp::Eq) {
        let m = max - c.rhs;
        if m > 0 {
            let (coef, rhs) = if lit.negated {
                (-m, c.rhs)
            } else {
                (m, c.rhs + m)
            };
            rows.push(plain(c.expr.clone().term(lit.var, coef), Cmp::Le, rhs));
        }
    }
    if matches!(c.cmp, Cmp::Ge | Cmp::Eq) {
        let m = c.rhs - min;
        if m > 0 {
            let (coef, rhs) = if lit.negated {
                (m, c.rhs)
            } else {
                (-m, c.rhs - m)
            };
            rows.push(plain(c.expr.clone().term(lit.var, coef), Cmp::Ge, rhs));
        }
    }
    rows
}

fn plain(expr: LinearExpr, cmp: Cmp, rhs: i64) -> Constraint {
    Constraint {
        expr,
        cmp,
        rhs,
        enforce: None,
    }
}
