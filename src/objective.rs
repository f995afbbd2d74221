use log::debug;
use serde::{Deserialize, Serialize};

use crate::builder::BuiltModel;
use crate::model::LinearExpr;

/// Objective weights.
///
/// Defaults favour hitting weekly targets and compact days over preference
/// bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Weights {
    /// Bonus per worked slot inside a preference window.
    pub preference: i64,
    /// Penalty per minute of weekly shortfall.
    pub deviation: i64,
    /// Penalty per shift beyond the first in one worker-day.
    pub fragmentation: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            preference: 1,
            deviation: 10,
            fragmentation: 15,
        }
    }
}

/// Installs `Wp·Σpref − Wd·Σdeviation − Wf·Σextra_shifts` as the objective
/// to maximise.
pub fn compose(built: &mut BuiltModel, weights: &Weights) {
    let mut objective = LinearExpr::new();

    for lit in &built.preference_literals {
        objective.add(*lit, weights.preference);
    }
    for worker in &built.workers {
        objective.add(worker.deviation, -weights.deviation);
        for day in &worker.days {
            objective.add(day.extra_shifts, -weights.fragmentation);
        }
    }

    debug!(
        "Objective composed with {} terms ({} preference literals)",
        objective.terms().len(),
        built.preference_literals.len()
    );
    built.model.maximize(objective);
}
