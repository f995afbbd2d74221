//! Request validation.
//!
//! Runs before any model is built and rejects the whole request on the first
//! problem found. A successful run yields a [`Problem`] whose per-day data is
//! already keyed by [`Day`].

use log::warn;
use std::collections::BTreeMap;

use crate::data::{ScheduleRequest, TimeSlot, WorkerSchedule};
use crate::domain::{
    ActivityWindow, ClockTime, DailyBounds, Day, Problem, Team, TimeWindow, Worker,
};
use crate::error::ValidationError;

pub fn validate(request: &ScheduleRequest, strict_day_names: bool) -> Result<Problem, ValidationError> {
    let equipo = &request.equipo;
    let start = parse_time("horaInicioActividad", &equipo.hora_inicio_actividad)?;
    let end = parse_time("horaFinActividad", &equipo.hora_fin_actividad)?;
    let active_days = parse_active_days(&equipo.dias_actividad)?;

    if end <= start {
        return Err(ValidationError::EmptyActivityWindow {
            start: equipo.hora_inicio_actividad.clone(),
            end: equipo.hora_fin_actividad.clone(),
        });
    }
    if equipo.horas_min_diaria >= equipo.horas_max_diaria {
        return Err(ValidationError::DailyBounds {
            min: equipo.horas_min_diaria,
            max: equipo.horas_max_diaria,
        });
    }

    let daily = match (
        equipo.horas_min_diaria.checked_mul(60),
        equipo.horas_max_diaria.checked_mul(60),
    ) {
        (Some(min), Some(max)) => DailyBounds { min, max },
        _ => {
            return Err(ValidationError::DailyBounds {
                min: equipo.horas_min_diaria,
                max: equipo.horas_max_diaria,
            });
        }
    };

    let team = Team {
        activity: ActivityWindow {
            window: TimeWindow::new(start, end),
            active_days,
        },
        daily,
    };

    let workers = request
        .schedule_trabajadores
        .iter()
        .map(|w| validate_worker(w, strict_day_names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Problem { team, workers })
}

fn validate_worker(worker: &WorkerSchedule, strict: bool) -> Result<Worker, ValidationError> {
    let hours = worker.horario_general.horas_semanales;
    if hours <= 0 {
        return Err(ValidationError::WeeklyHours {
            worker: worker.id.clone(),
            hours,
        });
    }
    let weekly_target = hours
        .checked_mul(60)
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or_else(|| ValidationError::WeeklyHours {
            worker: worker.id.clone(),
            hours,
        })?;

    let mut out = Worker::new(worker.id.clone(), worker.nombre.clone(), weekly_target);

    let mandatory = by_day(
        &worker.id,
        "diasObligatorios",
        &worker.horario_general.dias_obligatorios,
        strict,
    )?;
    for (day, slot) in mandatory {
        out.mandatory[day.index()] = Some(parse_window("diasObligatorios", slot)?);
    }

    let restrictions = by_day(&worker.id, "restricciones", &worker.restricciones.dias, strict)?;
    for (day, windows) in restrictions {
        for slot in windows.as_slice() {
            out.restrictions[day.index()].push(parse_window("restricciones", slot)?);
        }
    }

    let preferences = by_day(&worker.id, "preferencias", &worker.preferencias.dias, strict)?;
    for (day, windows) in preferences {
        for slot in windows.as_slice() {
            out.preferences[day.index()].push(parse_window("preferencias", slot)?);
        }
    }

    Ok(out)
}

/// Resolves day names, dropping (or rejecting, when strict) unknown ones.
fn by_day<'a, T>(
    worker: &str,
    field: &'static str,
    entries: &'a BTreeMap<String, T>,
    strict: bool,
) -> Result<Vec<(Day, &'a T)>, ValidationError> {
    let mut out = Vec::with_capacity(entries.len());
    for (name, value) in entries {
        match Day::from_name(name) {
            Some(day) => out.push((day, value)),
            None if strict => {
                return Err(ValidationError::UnknownDay {
                    worker: worker.to_string(),
                    field,
                    day: name.clone(),
                });
            }
            None => warn!("Ignoring unknown day {name:?} in {field} of worker {worker}"),
        }
    }
    Ok(out)
}

fn parse_window(field: &str, slot: &TimeSlot) -> Result<TimeWindow, ValidationError> {
    Ok(TimeWindow::new(
        parse_time(field, &slot.hora_inicio)?,
        parse_time(field, &slot.hora_fin)?,
    ))
}

fn parse_time(field: &str, value: &str) -> Result<ClockTime, ValidationError> {
    ClockTime::parse(value).ok_or_else(|| ValidationError::InvalidTime {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_active_days(mask: &str) -> Result<[bool; 7], ValidationError> {
    let bits: Vec<char> = mask.chars().collect();
    if bits.len() != 7 || bits.iter().any(|c| *c != '0' && *c != '1') {
        return Err(ValidationError::InvalidActivityDays(mask.to_string()));
    }
    let mut days = [false; 7];
    for (slot, bit) in days.iter_mut().zip(bits) {
        *slot = bit == '1';
    }
    Ok(days)
}
