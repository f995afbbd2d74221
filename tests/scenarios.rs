use serde_json::{Value, json};
use shift_solver::config::Settings;
use shift_solver::domain::{ClockTime, Day};
use shift_solver::{ScheduleError, ScheduleOutcome, ScheduleRequest, SolveStatus, WorkerShift, solve};

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.solver.time_limit_secs = 30.0;
    settings.solver.threads = Some(1);
    settings.solver.random_seed = Some(1234);
    settings
}

fn team(days: &str, start: &str, end: &str, min: u32, max: u32) -> Value {
    json!({
        "idEquipo": 12345,
        "tipo": "Comercial",
        "nombre": "Mi Negocio",
        "diasActividad": days,
        "horaInicioActividad": start,
        "horaFinActividad": end,
        "horasMinDiaria": min,
        "horasMaxDiaria": max
    })
}

fn worker(id: &str, weekly_hours: i64) -> Value {
    json!({
        "id": id,
        "nombre": format!("Worker {id}"),
        "preferencias": { "dias": {} },
        "restricciones": { "dias": {} },
        "horarioGeneral": { "diasObligatorios": {}, "horasSemanales": weekly_hours }
    })
}

fn window(start: &str, end: &str) -> Value {
    json!({ "horaInicio": start, "horaFin": end })
}

fn request(team: Value, workers: Vec<Value>) -> ScheduleRequest {
    serde_json::from_value(json!({ "equipo": team, "scheduleTrabajadores": workers })).unwrap()
}

fn minutes(t: &str) -> u32 {
    ClockTime::parse(t).unwrap().minutes()
}

fn span(shift: &WorkerShift) -> (u32, u32) {
    (minutes(&shift.start_time), minutes(&shift.end_time))
}

fn shifts_of(outcome: &ScheduleOutcome, day: Day, id: &str) -> Vec<(u32, u32)> {
    outcome
        .schedule
        .day(day)
        .iter()
        .filter(|s| s.worker_id == id)
        .map(span)
        .collect()
}

fn weekly_minutes(outcome: &ScheduleOutcome, id: &str) -> u32 {
    Day::ALL
        .into_iter()
        .flat_map(|d| shifts_of(outcome, d, id))
        .map(|(a, b)| b - a)
        .sum()
}

#[test]
fn full_time_worker_gets_five_single_shift_days() {
    let req = request(
        team("1111100", "08:00:00", "17:00:00", 4, 8),
        vec![worker("T001", 40)],
    );
    let outcome = solve(&req, &settings()).unwrap();

    assert!(outcome.status.has_solution());
    assert_eq!(outcome.schedule.scheduled_days(), 5);
    for (day, shifts) in outcome.schedule.iter() {
        assert!(day <= Day::Friday);
        assert_eq!(shifts.len(), 1, "{day} has {shifts:?}");
        let (start, end) = span(&shifts[0]);
        assert!(start >= minutes("08:00:00") && end <= minutes("17:00:00"));
        assert!((180..=540).contains(&(end - start)));
        assert!(shifts[0].start_time.ends_with(":00") && shifts[0].end_time.ends_with(":00"));
    }
    assert_eq!(weekly_minutes(&outcome, "T001"), 40 * 60);
    assert_eq!(outcome.summaries[0].shortfall_minutes, 0);
    assert_eq!(outcome.summaries[0].total_shifts, 5);
}

#[test]
fn restriction_and_mandatory_window_are_honoured() {
    let mut t = worker("T001", 40);
    t["restricciones"]["dias"]["Miércoles"] = window("13:00:00", "18:00:00");
    t["horarioGeneral"]["diasObligatorios"]["Lunes"] = window("08:00:00", "17:00:00");
    t["preferencias"]["dias"]["Lunes"] = window("09:00:00", "15:00:00");
    t["preferencias"]["dias"]["Martes"] = window("09:00:00", "15:00:00");
    let req = request(team("1111100", "08:00:00", "17:00:00", 4, 8), vec![t]);

    let outcome = solve(&req, &settings()).unwrap();

    for (start, end) in shifts_of(&outcome, Day::Wednesday, "T001") {
        assert!(end <= minutes("13:00:00") || start >= minutes("18:00:00"));
    }
    let monday = shifts_of(&outcome, Day::Monday, "T001");
    let monday_minutes: u32 = monday.iter().map(|(a, b)| b - a).sum();
    assert!(monday_minutes >= 4 * 60);
    for (start, end) in monday {
        assert!(start >= minutes("08:00:00") && end <= minutes("17:00:00"));
    }
    let weekly = weekly_minutes(&outcome, "T001");
    assert!((28 * 60..=40 * 60).contains(&weekly));
}

#[test]
fn unreachable_weekly_target_is_infeasible() {
    let req = request(
        team("1111100", "08:00:00", "17:00:00", 4, 8),
        vec![worker("T001", 100)],
    );
    match solve(&req, &settings()) {
        Err(ScheduleError::NoFeasibleSchedule { status }) => {
            assert_eq!(status, SolveStatus::Infeasible)
        }
        other => panic!("expected an infeasible outcome, got {other:?}"),
    }
}

#[test]
fn validation_failure_is_distinct_from_infeasibility() {
    let req = request(
        team("11111", "08:00:00", "17:00:00", 4, 8),
        vec![worker("T001", 100)],
    );
    assert!(matches!(solve(&req, &settings()), Err(ScheduleError::Validation(_))));
}

#[test]
fn team_without_workers_gets_an_empty_schedule() {
    let req = request(team("1111100", "08:00:00", "17:00:00", 4, 8), vec![]);
    let outcome = solve(&req, &settings()).unwrap();
    assert!(outcome.schedule.is_empty());
    assert_eq!(serde_json::to_value(&outcome.schedule).unwrap(), json!({}));
}

#[test]
fn schedules_respect_every_hard_rule() {
    let mut a = worker("A", 30);
    a["restricciones"]["dias"]["Martes"] = json!([
        window("07:00:00", "09:30:00"),
        window("15:10:00", "19:00:00")
    ]);
    a["preferencias"]["dias"]["Jueves"] = window("12:00:00", "18:00:00");
    a["restricciones"]["dias"]["Domingo"] = window("07:00:00", "19:00:00");

    let mut b = worker("B", 24);
    b["horarioGeneral"]["diasObligatorios"]["Viernes"] = window("10:00:00", "14:00:00");
    b["restricciones"]["dias"]["Lunes"] = window("11:00:00", "12:00:00");
    b["preferencias"]["dias"]["Sábado"] = window("07:00:00", "11:00:00");
    b["preferencias"]["dias"]["Funday"] = window("07:00:00", "11:00:00");

    let req = request(team("1111110", "07:00:00", "19:00:00", 4, 8), vec![a, b]);
    let outcome = solve(&req, &settings()).unwrap();
    let (open, close) = (minutes("07:00:00"), minutes("19:00:00"));

    assert!(outcome.schedule.day(Day::Sunday).is_empty());
    for id in ["A", "B"] {
        for day in Day::ALL {
            let shifts = shifts_of(&outcome, day, id);
            for (start, end) in &shifts {
                assert!(start < end);
                assert!(*start >= open && *end <= close);
            }
            // ordered, disjoint and never touching
            for pair in shifts.windows(2) {
                assert!(pair[0].1 < pair[1].0, "{id} on {day}: {shifts:?}");
            }
        }
    }

    for (start, end) in shifts_of(&outcome, Day::Tuesday, "A") {
        assert!(start >= minutes("09:30:00") && end <= minutes("15:10:00"));
    }
    for (start, end) in shifts_of(&outcome, Day::Monday, "B") {
        assert!(end <= minutes("11:00:00") || start >= minutes("12:00:00"));
    }
    let friday = shifts_of(&outcome, Day::Friday, "B");
    assert!(!friday.is_empty());
    for (start, end) in friday {
        assert!(start >= minutes("10:00:00") && end <= minutes("14:00:00"));
    }

    for (id, target) in [("A", 30 * 60), ("B", 24 * 60)] {
        let weekly = weekly_minutes(&outcome, id);
        assert!(weekly * 10 >= target * 7 && weekly <= target, "{id}: {weekly}");
    }
}
