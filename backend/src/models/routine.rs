use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::Semester;
use crate::store::{CollectionPath, Fields};

pub const ROUTINES_COLLECTION: &str = "routines";
pub const SLOTS_PER_DAY: usize = 4;
pub const DEFAULT_TIMES: [&str; SLOTS_PER_DAY] = ["10:00", "11:00", "12:00", "14:00"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown weekday: {}", s))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    pub time: String,
    pub course: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DayView {
    day: String,
    #[serde(default)]
    slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RoutineView {
    #[serde(default)]
    days: Vec<DayView>,
}

/// Weekly timetable of one semester: five weekdays of four slots each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RoutineView", into = "RoutineView")]
pub struct RoutineGrid {
    rows: [[Slot; SLOTS_PER_DAY]; 5],
}

impl Default for RoutineGrid {
    fn default() -> Self {
        let row = DEFAULT_TIMES.map(|time| Slot {
            time: time.to_string(),
            course: String::new(),
        });
        Self {
            rows: std::array::from_fn(|_| row.clone()),
        }
    }
}

impl RoutineGrid {
    pub fn collection() -> CollectionPath {
        CollectionPath::root(ROUTINES_COLLECTION)
    }

    pub fn document_key(semester: Semester) -> &'static str {
        semester.as_str()
    }

    pub fn slot(&self, day: Weekday, index: usize) -> Option<&Slot> {
        self.rows[day.index()].get(index)
    }

    pub fn slots(&self, day: Weekday) -> &[Slot; SLOTS_PER_DAY] {
        &self.rows[day.index()]
    }

    pub fn slot_mut(&mut self, day: Weekday, index: usize) -> Option<&mut Slot> {
        self.rows[day.index()].get_mut(index)
    }

    /// Reads the stored layout: per weekday a map with `"0".."3"` for the
    /// time and `"course_0".."course_3"` for the label. Missing entries
    /// take defaults; anything else is ignored.
    pub fn from_fields(fields: &Fields) -> Self {
        let mut grid = Self::default();
        for day in Weekday::ALL {
            let Some(stored) = fields.get(day.as_str()).and_then(Value::as_object) else {
                continue;
            };
            for (index, slot) in grid.rows[day.index()].iter_mut().enumerate() {
                if let Some(time) = stored.get(&index.to_string()).and_then(Value::as_str) {
                    slot.time = time.to_string();
                }
                if let Some(course) = stored.get(&format!("course_{}", index)).and_then(Value::as_str) {
                    slot.course = course.to_string();
                }
            }
        }
        grid
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        for day in Weekday::ALL {
            let mut stored = serde_json::Map::new();
            for (index, slot) in self.slots(day).iter().enumerate() {
                stored.insert(index.to_string(), json!(slot.time));
                stored.insert(format!("course_{}", index), json!(slot.course));
            }
            fields.insert(day.as_str().to_string(), Value::Object(stored));
        }
        fields
    }
}

impl From<RoutineView> for RoutineGrid {
    fn from(view: RoutineView) -> Self {
        let mut grid = Self::default();
        for day_view in view.days {
            let Ok(day) = day_view.day.parse::<Weekday>() else {
                continue;
            };
            for (slot, given) in grid.rows[day.index()].iter_mut().zip(day_view.slots) {
                *slot = given;
            }
        }
        grid
    }
}

impl From<RoutineGrid> for RoutineView {
    fn from(grid: RoutineGrid) -> Self {
        let days = Weekday::ALL
            .into_iter()
            .zip(grid.rows)
            .map(|(day, slots)| DayView {
                day: day.as_str().to_string(),
                slots: slots.into(),
            })
            .collect();
        Self { days }
    }
}
