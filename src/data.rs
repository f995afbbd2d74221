use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::domain::Day;

/// A `HH:MM:SS` time range as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub hora_inicio: String,
    pub hora_fin: String,
}

impl TimeSlot {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            hora_inicio: start.into(),
            hora_fin: end.into(),
        }
    }
}

/// Either a single window or a list of windows for one day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DayWindows {
    One(TimeSlot),
    Many(Vec<TimeSlot>),
}

impl DayWindows {
    pub fn as_slice(&self) -> &[TimeSlot] {
        match self {
            DayWindows::One(slot) => std::slice::from_ref(slot),
            DayWindows::Many(slots) => slots,
        }
    }
}

/// Day name -> windows, used for preferences and restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DayPreference {
    #[serde(default)]
    pub dias: BTreeMap<String, DayWindows>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSchedule {
    #[serde(default)]
    pub dias_obligatorios: BTreeMap<String, TimeSlot>,
    pub horas_semanales: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSchedule {
    pub id: String,
    pub nombre: String,
    #[serde(default)]
    pub preferencias: DayPreference,
    #[serde(default)]
    pub restricciones: DayPreference,
    pub horario_general: GeneralSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub id_equipo: i64,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub nombre: String,
    pub dias_actividad: String,
    pub hora_inicio_actividad: String,
    pub hora_fin_actividad: String,
    pub horas_min_diaria: u32,
    pub horas_max_diaria: u32,
}

/// The complete input for the scheduling problem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub equipo: Team,
    pub schedule_trabajadores: Vec<WorkerSchedule>,
}

/// One contiguous shift of one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerShift {
    pub worker_id: String,
    pub start_time: String,
    pub end_time: String,
}

/// Shifts grouped by day in canonical week order.
///
/// Serializes as a map from day name to shifts; days without shifts are
/// left out of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    days: [Vec<WorkerShift>; 7],
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, day: Day, shift: WorkerShift) {
        self.days[day.index()].push(shift);
    }

    pub fn day(&self, day: Day) -> &[WorkerShift] {
        &self.days[day.index()]
    }

    /// Days that carry at least one shift, in week order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, &[WorkerShift])> {
        Day::ALL
            .into_iter()
            .map(|d| (d, self.day(d)))
            .filter(|(_, shifts)| !shifts.is_empty())
    }

    pub fn scheduled_days(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled_days() == 0
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scheduled_days()))?;
        for (day, shifts) in self.iter() {
            map.serialize_entry(day.name(), shifts)?;
        }
        map.end()
    }
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub common_schedule: Schedule,
}
