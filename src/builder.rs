use log::{debug, info, trace};
use std::collections::BTreeSet;

use crate::config::ModelConfig;
use crate::domain::{Day, Problem, Worker};
use crate::grid::TimeGrid;
use crate::model::{Cmp, LinearExpr, Literal, Model, VarId};

/// The worker × active-day × slot block of "working" booleans.
#[derive(Debug, Clone)]
pub struct WorkVars {
    first: VarId,
    workers: usize,
    days: Vec<Day>,
    slots: usize,
}

impl WorkVars {
    /// Variable for `(worker, day position among active days, slot)`.
    pub fn var(&self, worker: usize, day_pos: usize, slot: usize) -> VarId {
        debug_assert!(worker < self.workers && day_pos < self.days.len() && slot < self.slots);
        self.first
            .offset((worker * self.days.len() + day_pos) * self.slots + slot)
    }

    pub fn day_vars(&self, worker: usize, day_pos: usize) -> impl Iterator<Item = VarId> + '_ {
        (0..self.slots).map(move |s| self.var(worker, day_pos, s))
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn day_position(&self, day: Day) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn slots(&self) -> usize {
        self.slots
    }
}

/// Derived variables of one worker on one active day.
#[derive(Debug, Clone)]
pub struct DayVars {
    pub day: Day,
    pub has_work: VarId,
    /// First of `slots` contiguous shift-start indicators.
    pub shift_starts: VarId,
    /// First of `slots` contiguous shift-end indicators.
    pub shift_ends: VarId,
    pub shift_count: VarId,
    /// `max(0, shift_count - 1)` once the objective is minimised.
    pub extra_shifts: VarId,
}

#[derive(Debug, Clone)]
pub struct WorkerVars {
    pub weekly_minutes: VarId,
    /// Shortfall below the weekly target, in minutes.
    pub deviation: VarId,
    pub days: Vec<DayVars>,
}

/// A constraint model together with the handles needed to read it back.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: Model,
    pub grid: TimeGrid,
    pub work: WorkVars,
    pub workers: Vec<WorkerVars>,
    pub preference_literals: Vec<VarId>,
}

/// Translates a validated [`Problem`] into a [`Model`] with every hard
/// constraint in place. The objective is left to [`crate::objective`].
pub struct ModelBuilder<'a> {
    problem: &'a Problem,
    grid: TimeGrid,
    config: &'a ModelConfig,
    model: Model,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(problem: &'a Problem, grid: TimeGrid, config: &'a ModelConfig) -> Self {
        Self {
            problem,
            grid,
            config,
            model: Model::new(),
        }
    }

    pub fn build(mut self) -> BuiltModel {
        let problem = self.problem;
        let days: Vec<Day> = problem.team.activity.days().collect();
        let slots = self.grid.slot_count();
        let workers = problem.workers.len();
        info!(
            "Setting up model with {} workers, {} active days and {} slots of {} minutes...",
            workers,
            days.len(),
            slots,
            self.grid.slot_minutes()
        );

        let first = self.model.new_bool_block(workers * days.len() * slots, |i| {
            let (rest, s) = (i / slots, i % slots);
            format!("work_w{}_d{}_s{}", rest / days.len(), rest % days.len(), s)
        });
        let work = WorkVars {
            first,
            workers,
            days,
            slots,
        };

        let mut worker_vars = Vec::with_capacity(workers);
        let mut preference_literals = Vec::new();

        for (w, worker) in problem.workers.iter().enumerate() {
            let mut day_vars = Vec::with_capacity(work.days.len());
            for (d, day) in work.days.iter().copied().enumerate() {
                let vars = self.add_day(&work, w, d, day);
                self.add_min_shift_length(&work, w, d, &vars);
                self.add_mandatory_window(&work, worker, w, d, day);
                self.add_restrictions(&work, worker, w, d, day);
                preference_literals.extend(self.preference_slots(&work, worker, w, d, day));
                day_vars.push(vars);
            }
            self.log_inactive_windows(worker);
            worker_vars.push(self.add_weekly(&work, worker, w, day_vars));
        }

        debug!(
            "Model built: {} variables, {} constraints, {} preference literals",
            self.model.num_vars(),
            self.model.num_constraints(),
            preference_literals.len()
        );

        BuiltModel {
            model: self.model,
            grid: self.grid,
            work,
            workers: worker_vars,
            preference_literals,
        }
    }

    fn slot_len(&self) -> i64 {
        i64::from(self.grid.slot_minutes())
    }

    /// Daily bounds (with slack) and shift boundary detection.
    fn add_day(&mut self, work: &WorkVars, w: usize, d: usize, day: Day) -> DayVars {
        let slots = work.slots();
        let slot_len = self.slot_len();
        let daily = self.problem.team.daily;
        let slack = i64::from(self.config.daily_slack_minutes);

        let has_work = self.model.new_bool(format!("has_work_w{w}_d{d}"));
        let worked = LinearExpr::sum(work.day_vars(w, d), 1);

        // has_work <=> at least one slot worked
        self.model.add_if(has_work, worked.clone(), Cmp::Ge, 1);
        self.model.add_if(!Literal::from(has_work), worked, Cmp::Eq, 0);

        let minutes = LinearExpr::sum(work.day_vars(w, d), slot_len);
        let lower = i64::from(daily.min) - slack;
        if lower > 0 {
            self.model.add_if(has_work, minutes.clone(), Cmp::Ge, lower);
        }
        self.model
            .add(minutes, Cmp::Le, i64::from(daily.max) + slack);

        let shift_starts = self
            .model
            .new_bool_block(slots, |s| format!("start_w{w}_d{d}_s{s}"));
        let shift_ends = self
            .model
            .new_bool_block(slots, |s| format!("end_w{w}_d{d}_s{s}"));

        for s in 0..slots {
            let x = work.var(w, d, s);
            let start = shift_starts.offset(s);
            let end = shift_ends.offset(s);

            // start[s] <=> x[s] && !x[s-1]
            if s == 0 {
                self.model
                    .add(LinearExpr::new().term(start, 1).term(x, -1), Cmp::Eq, 0);
            } else {
                let prev = work.var(w, d, s - 1);
                self.link_boundary(start, x, prev);
            }

            // end[s] <=> x[s] && !x[s+1]
            if s + 1 == slots {
                self.model
                    .add(LinearExpr::new().term(end, 1).term(x, -1), Cmp::Eq, 0);
            } else {
                let next = work.var(w, d, s + 1);
                self.link_boundary(end, x, next);
            }
        }

        let shift_count = self
            .model
            .new_int(0, slots as i64, format!("num_shifts_w{w}_d{d}"));
        let mut count = LinearExpr::sum((0..slots).map(|s| shift_starts.offset(s)), 1);
        count.add(shift_count, -1);
        self.model.add(count, Cmp::Eq, 0);

        let extra_shifts = self
            .model
            .new_int(0, slots as i64, format!("extra_shifts_w{w}_d{d}"));
        self.model.add(
            LinearExpr::new().term(extra_shifts, 1).term(shift_count, -1),
            Cmp::Ge,
            -1,
        );

        trace!(
            "Daily bounds for worker {} on {}: {}..={} minutes",
            w,
            day,
            lower.max(0),
            i64::from(daily.max) + slack
        );

        DayVars {
            day,
            has_work,
            shift_starts,
            shift_ends,
            shift_count,
            extra_shifts,
        }
    }

    /// `indicator <=> current && !neighbour`.
    fn link_boundary(&mut self, indicator: VarId, current: VarId, neighbour: VarId) {
        self.model.add(
            LinearExpr::new().term(indicator, 1).term(current, -1),
            Cmp::Le,
            0,
        );
        self.model.add(
            LinearExpr::new().term(indicator, 1).term(neighbour, 1),
            Cmp::Le,
            1,
        );
        self.model.add(
            LinearExpr::new()
                .term(indicator, 1)
                .term(current, -1)
                .term(neighbour, 1),
            Cmp::Ge,
            0,
        );
    }

    /// A shift starting at `s` covers the next `min_shift_slots - 1` slots,
    /// clipped at the end of the grid.
    fn add_min_shift_length(&mut self, work: &WorkVars, w: usize, d: usize, vars: &DayVars) {
        let slots = work.slots();
        let len = self.config.min_shift_slots;
        for s in 0..slots {
            let start = vars.shift_starts.offset(s);
            for k in 1..len {
                if s + k >= slots {
                    break;
                }
                self.model.add(
                    LinearExpr::new().term(work.var(w, d, s + k), 1).term(start, -1),
                    Cmp::Ge,
                    0,
                );
            }
        }
    }

    /// Work on a mandatory day stays inside the window and reaches the
    /// lesser of the daily minimum and what the window can hold.
    fn add_mandatory_window(&mut self, work: &WorkVars, worker: &Worker, w: usize, d: usize, day: Day) {
        let Some(window) = worker.mandatory[day.index()] else {
            return;
        };
        let eligible = self.grid.slots_within(window);
        for s in (0..work.slots()).filter(|s| !eligible.contains(s)) {
            self.model.fix(work.var(w, d, s), 0);
        }
        if eligible.is_empty() {
            debug!(
                "Mandatory window {} of worker {} on {} holds no full slot; minimum not enforced",
                window, worker.id, day
            );
            return;
        }

        let capacity = eligible.len() as i64 * self.slot_len();
        let required = i64::from(self.problem.team.daily.min)
            .min(i64::from(window.len()))
            .min(capacity);
        let minutes = LinearExpr::sum(eligible.map(|s| work.var(w, d, s)), self.slot_len());
        self.model.add(minutes, Cmp::Ge, required);
        trace!(
            "Mandatory window {} for worker {} on {}: at least {} minutes",
            window, worker.id, day, required
        );
    }

    /// Any slot touching a restriction window is off.
    fn add_restrictions(&mut self, work: &WorkVars, worker: &Worker, w: usize, d: usize, day: Day) {
        for window in &worker.restrictions[day.index()] {
            let blocked = self.grid.slots_overlapping(*window);
            trace!(
                "Restriction {} for worker {} on {} blocks {} slots",
                window,
                worker.id,
                day,
                blocked.len()
            );
            for s in blocked {
                self.model.fix(work.var(w, d, s), 0);
            }
        }
    }

    /// Work literals fully inside a preference window, each counted once.
    fn preference_slots(&self, work: &WorkVars, worker: &Worker, w: usize, d: usize, day: Day) -> BTreeSet<VarId> {
        worker.preferences[day.index()]
            .iter()
            .flat_map(|window| self.grid.slots_within(*window))
            .map(|s| work.var(w, d, s))
            .collect()
    }

    /// Weekly minutes capped at the target; shortfall measured by `deviation`.
    fn add_weekly(&mut self, work: &WorkVars, worker: &Worker, w: usize, days: Vec<DayVars>) -> WorkerVars {
        let target = i64::from(worker.weekly_target);
        let floor = (target as f64 * self.config.weekly_floor_ratio).floor() as i64;

        let weekly_minutes = self
            .model
            .new_int(0, target, format!("weekly_minutes_w{w}"));
        let deviation = self
            .model
            .new_int(0, target - floor, format!("deviation_w{w}"));

        let mut total = LinearExpr::new();
        for d in 0..work.days().len() {
            for var in work.day_vars(w, d) {
                total.add(var, self.slot_len());
            }
        }
        total.add(weekly_minutes, -1);
        self.model.add(total, Cmp::Eq, 0);

        self.model.add(
            LinearExpr::new().term(weekly_minutes, 1).term(deviation, 1),
            Cmp::Eq,
            target,
        );
        self.model
            .add(LinearExpr::new().term(weekly_minutes, 1), Cmp::Ge, floor);

        debug!(
            "Weekly target for worker {}: {} minutes (floor {})",
            worker.id, target, floor
        );

        WorkerVars {
            weekly_minutes,
            deviation,
            days,
        }
    }

    fn log_inactive_windows(&self, worker: &Worker) {
        let activity = &self.problem.team.activity;
        for day in Day::ALL.into_iter().filter(|d| !activity.is_active(*d)) {
            let i = day.index();
            let declared = worker.mandatory[i].is_some()
                || !worker.restrictions[i].is_empty()
                || !worker.preferences[i].is_empty();
            if declared {
                debug!(
                    "Ignoring windows of worker {} on inactive day {}",
                    worker.id, day
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{ActivityWindow, ClockTime, DailyBounds, Team, TimeWindow};
    use crate::model::Assignment;

    pub(crate) fn window(h0: u32, m0: u32, h1: u32, m1: u32) -> TimeWindow {
        TimeWindow::new(ClockTime::from_hm(h0, m0), ClockTime::from_hm(h1, m1))
    }

    /// Mon–Fri 08:00–17:00, 4h–8h per day, one 40h worker.
    pub(crate) fn problem() -> Problem {
        Problem {
            team: Team {
                activity: ActivityWindow {
                    window: window(8, 0, 17, 0),
                    active_days: [true, true, true, true, true, false, false],
                },
                daily: DailyBounds { min: 240, max: 480 },
            },
            workers: vec![Worker::new("T1", "Ana", 2400)],
        }
    }

    pub(crate) fn build(problem: &Problem) -> BuiltModel {
        let grid = TimeGrid::new(problem.team.activity.window, 15).unwrap();
        ModelBuilder::new(problem, grid, &ModelConfig::default()).build()
    }

    /// Derives every auxiliary variable from the worked slots.
    pub(crate) fn complete(
        built: &BuiltModel,
        problem: &Problem,
        worked: impl Fn(usize, Day, usize) -> bool,
    ) -> Assignment {
        let mut values = vec![0i64; built.model.num_vars()];
        let work = &built.work;
        let slot_len = i64::from(built.grid.slot_minutes());
        for (w, vars) in built.workers.iter().enumerate() {
            let mut weekly = 0;
            for (d, day_vars) in vars.days.iter().enumerate() {
                let on: Vec<bool> = (0..work.slots()).map(|s| worked(w, day_vars.day, s)).collect();
                for (s, x) in on.iter().enumerate() {
                    values[work.var(w, d, s).index()] = i64::from(*x);
                    let start = *x && (s == 0 || !on[s - 1]);
                    let end = *x && (s + 1 == on.len() || !on[s + 1]);
                    values[day_vars.shift_starts.offset(s).index()] = i64::from(start);
                    values[day_vars.shift_ends.offset(s).index()] = i64::from(end);
                }
                let count = (0..on.len())
                    .filter(|s| on[*s] && (*s == 0 || !on[*s - 1]))
                    .count() as i64;
                let n = on.iter().filter(|x| **x).count() as i64;
                values[day_vars.has_work.index()] = i64::from(n > 0);
                values[day_vars.shift_count.index()] = count;
                values[day_vars.extra_shifts.index()] = (count - 1).max(0);
                weekly += n * slot_len;
            }
            let target = i64::from(problem.workers[w].weekly_target);
            values[vars.weekly_minutes.index()] = weekly;
            values[vars.deviation.index()] = target - weekly;
        }
        Assignment::new(values)
    }

    fn weekdays(day: Day) -> bool {
        day <= Day::Friday
    }

    #[test]
    fn creates_slot_vars_only_for_active_days() {
        let p = problem();
        let built = build(&p);
        assert_eq!(built.work.days().len(), 5);
        assert_eq!(built.work.slots(), 36);
        assert_eq!(built.work.day_position(Day::Saturday), None);
        assert_eq!(built.workers[0].days.len(), 5);
        let first = built.work.var(0, 0, 0);
        assert_eq!(built.model.var(first).name, "work_w0_d0_s0");
        assert_eq!(built.model.var(built.work.var(0, 4, 35)).name, "work_w0_d4_s35");
    }

    #[test]
    fn five_full_days_satisfy_the_model() {
        let p = problem();
        let built = build(&p);
        // 08:00-16:00 every weekday
        let a = complete(&built, &p, |_, day, s| weekdays(day) && s < 32);
        assert!(built.model.is_satisfied_by(&a));
    }

    #[test]
    fn weekly_overage_is_not_representable() {
        let p = problem();
        let built = build(&p);
        // 9h on five days = 45h > 40h
        let a = complete(&built, &p, |_, day, _| weekdays(day));
        assert!(!built.model.is_satisfied_by(&a));
    }

    #[test]
    fn weekly_floor_is_enforced() {
        let p = problem();
        let built = build(&p);
        // 4h on five days = 20h < 28h
        let a = complete(&built, &p, |_, day, s| weekdays(day) && s < 16);
        assert!(!built.model.is_satisfied_by(&a));
    }

    #[test]
    fn daily_bounds_allow_one_hour_of_slack() {
        let mut p = problem();
        p.workers[0].weekly_target = 1800;
        let built = build(&p);

        // 3h on Monday (4h minus slack), 9h on the others
        let a = complete(&built, &p, |_, day, s| match day {
            Day::Monday => s < 12,
            Day::Tuesday | Day::Wednesday => true,
            Day::Thursday => s < 12,
            _ => false,
        });
        assert!(built.model.is_satisfied_by(&a));

        // 2h45 on Monday falls below the slack
        let a = complete(&built, &p, |_, day, s| match day {
            Day::Monday => s < 11,
            Day::Tuesday | Day::Wednesday => true,
            Day::Thursday => s < 13,
            _ => false,
        });
        assert!(!built.model.is_satisfied_by(&a));
    }

    #[test]
    fn short_shift_in_the_middle_of_the_day_is_rejected() {
        let p = problem();
        let built = build(&p);
        let a = complete(&built, &p, |_, day, s| {
            weekdays(day) && (s < 28 || (day == Day::Monday && (30..33).contains(&s)))
        });
        assert!(!built.model.is_satisfied_by(&a));
    }

    #[test]
    fn short_shift_at_the_end_of_the_grid_is_allowed() {
        let mut p = problem();
        p.workers[0].weekly_target = 2250;
        let built = build(&p);
        // 7h block plus a 30-minute shift ending exactly at 17:00
        let a = complete(&built, &p, |_, day, s| weekdays(day) && (s < 28 || s >= 34));
        assert!(built.model.is_satisfied_by(&a));
    }

    #[test]
    fn restricted_slots_are_forced_off_on_partial_overlap() {
        let mut p = problem();
        p.workers[0].weekly_target = 2000;
        p.workers[0].restrictions[Day::Wednesday.index()].push(window(13, 10, 18, 0));
        let built = build(&p);

        // Wednesday 08:00-13:00 ends before the overlapping 13:00 slot
        let ok = complete(&built, &p, |_, day, s| match day {
            Day::Wednesday => s < 20,
            _ => weekdays(day) && s < 28,
        });
        assert!(built.model.is_satisfied_by(&ok));

        // 13:00-13:15 only partly overlaps the restriction but is still blocked
        let bad = complete(&built, &p, |_, day, s| match day {
            Day::Wednesday => s < 21,
            _ => weekdays(day) && s < 28,
        });
        assert!(!built.model.is_satisfied_by(&bad));
    }

    #[test]
    fn mandatory_window_confines_work_and_sets_a_minimum() {
        let mut p = problem();
        p.workers[0].weekly_target = 2100;
        p.workers[0].mandatory[Day::Monday.index()] = Some(window(10, 0, 16, 0));
        let built = build(&p);

        let inside = complete(&built, &p, |_, day, s| match day {
            Day::Monday => (8..24).contains(&s),
            _ => weekdays(day) && s < 28,
        });
        assert!(built.model.is_satisfied_by(&inside));

        let outside = complete(&built, &p, |_, day, s| match day {
            Day::Monday => (7..23).contains(&s),
            _ => weekdays(day) && s < 28,
        });
        assert!(!built.model.is_satisfied_by(&outside));

        let idle = complete(&built, &p, |_, day, s| day != Day::Monday && weekdays(day) && s < 28);
        assert!(!built.model.is_satisfied_by(&idle));
    }

    #[test]
    fn mandatory_window_outside_activity_is_vacuous() {
        let mut p = problem();
        p.workers[0].weekly_target = 1920;
        p.workers[0].mandatory[Day::Monday.index()] = Some(window(18, 0, 20, 0));
        let built = build(&p);
        let a = complete(&built, &p, |_, day, s| day != Day::Monday && weekdays(day) && s < 32);
        assert!(built.model.is_satisfied_by(&a));
    }

    #[test]
    fn windows_on_inactive_days_add_nothing() {
        let p = problem();
        let baseline = build(&p).model.num_constraints();

        let mut p = problem();
        p.workers[0].mandatory[Day::Sunday.index()] = Some(window(9, 0, 12, 0));
        p.workers[0].restrictions[Day::Saturday.index()].push(window(9, 0, 12, 0));
        p.workers[0].preferences[Day::Saturday.index()].push(window(9, 0, 12, 0));
        let built = build(&p);
        assert_eq!(built.model.num_constraints(), baseline);
        assert!(built.preference_literals.is_empty());
    }

    #[test]
    fn overlapping_preferences_count_each_slot_once() {
        let mut p = problem();
        let prefs = &mut p.workers[0].preferences[Day::Tuesday.index()];
        prefs.push(window(9, 0, 11, 0));
        prefs.push(window(10, 0, 12, 10));
        let built = build(&p);
        // 09:00-12:00 fully contained: 12 slots
        assert_eq!(built.preference_literals.len(), 12);
        let tuesday = built.work.day_position(Day::Tuesday).unwrap();
        assert!(built.preference_literals.contains(&built.work.var(0, tuesday, 4)));
        assert!(!built.preference_literals.contains(&built.work.var(0, tuesday, 16)));
    }
}
