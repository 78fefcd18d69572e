// Schedule module
// Weekly grid model: day -> hour slot -> entry

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Label shown for a slot that has no entry.
pub const FREE_LABEL: &str = "Free";

/// Days of the week in display order (Monday first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    /// Three-letter column heading.
    pub fn short_label(&self) -> &'static str {
        match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
            Day::Saturday => "Sat",
            Day::Sunday => "Sun",
        }
    }

    pub fn from_weekday(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Day::Monday,
            chrono::Weekday::Tue => Day::Tuesday,
            chrono::Weekday::Wed => Day::Wednesday,
            chrono::Weekday::Thu => Day::Thursday,
            chrono::Weekday::Fri => Day::Friday,
            chrono::Weekday::Sat => Day::Saturday,
            chrono::Weekday::Sun => Day::Sunday,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Day::ALL
            .into_iter()
            .find(|day| day.as_str() == needle || day.short_label().to_lowercase() == needle)
            .ok_or_else(|| format!("Unknown day '{}'", s.trim()))
    }
}

/// An on-the-hour time label such as `09:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// The fixed rows shown in the grid, 09:00 through 17:00.
    pub const DISPLAY: [TimeSlot; 9] = [
        TimeSlot(9),
        TimeSlot(10),
        TimeSlot(11),
        TimeSlot(12),
        TimeSlot(13),
        TimeSlot(14),
        TimeSlot(15),
        TimeSlot(16),
        TimeSlot(17),
    ];

    pub fn new(hour: u8) -> Option<Self> {
        (hour < 24).then_some(Self(hour))
    }

    pub fn hour(&self) -> u8 {
        self.0
    }

    pub fn is_displayed(&self) -> bool {
        Self::DISPLAY.contains(self)
    }

    pub fn label(&self) -> String {
        format!("{:02}:00", self.0)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || format!("Invalid time slot '{}', expected HH:00", trimmed);

        let (hour, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minutes != "00" {
            return Err(invalid());
        }

        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        TimeSlot::new(hour).ok_or_else(invalid)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of activity occupying a slot. `Empty` only ever appears in the edit
/// form and in rendered free cells; it is never stored in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Work,
    Break,
    Meeting,
    Learning,
    Available,
    Empty,
}

impl EntryType {
    pub const ALL: [EntryType; 6] = [
        EntryType::Work,
        EntryType::Break,
        EntryType::Meeting,
        EntryType::Learning,
        EntryType::Available,
        EntryType::Empty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Work => "work",
            EntryType::Break => "break",
            EntryType::Meeting => "meeting",
            EntryType::Learning => "learning",
            EntryType::Available => "available",
            EntryType::Empty => "empty",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        EntryType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| format!("Unknown entry type '{}'", s.trim()))
    }
}

/// One occupied time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub activity: String,
}

impl ScheduleEntry {
    pub fn new(entry_type: EntryType, activity: impl Into<String>) -> Self {
        Self {
            entry_type,
            activity: activity.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GridParseError {
    #[error("schedule payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry at {day} {time} has an empty activity")]
    EmptyActivity { day: Day, time: TimeSlot },
    #[error("entry at {day} {time} is stored with the 'empty' type")]
    EmptyType { day: Day, time: TimeSlot },
}

/// Day -> time -> entry. Missing pairs are free slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleGrid {
    days: BTreeMap<Day, BTreeMap<TimeSlot, ScheduleEntry>>,
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, day: Day, time: TimeSlot) -> Option<&ScheduleEntry> {
        self.days.get(&day).and_then(|slots| slots.get(&time))
    }

    /// Upsert, creating the day if needed. Returns the replaced entry.
    pub fn insert(
        &mut self,
        day: Day,
        time: TimeSlot,
        entry: ScheduleEntry,
    ) -> Option<ScheduleEntry> {
        self.days.entry(day).or_default().insert(time, entry)
    }

    /// Removes an entry, pruning the day once it has no slots left.
    pub fn remove(&mut self, day: Day, time: TimeSlot) -> Option<ScheduleEntry> {
        let slots = self.days.get_mut(&day)?;
        let removed = slots.remove(&time);
        if slots.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(BTreeMap::is_empty)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, TimeSlot, &ScheduleEntry)> {
        self.days
            .iter()
            .flat_map(|(day, slots)| slots.iter().map(move |(time, entry)| (*day, *time, entry)))
    }

    /// Checks the stored-entry invariants: non-empty activity, never `empty`.
    pub fn validate(&self) -> Result<(), GridParseError> {
        for (day, time, entry) in self.iter() {
            if entry.activity.trim().is_empty() {
                return Err(GridParseError::EmptyActivity { day, time });
            }
            if entry.entry_type == EntryType::Empty {
                return Err(GridParseError::EmptyType { day, time });
            }
        }
        Ok(())
    }

    pub fn from_json(raw: &str) -> Result<Self, GridParseError> {
        let grid: ScheduleGrid = serde_json::from_str(raw)?;
        grid.normalized()
    }

    pub fn from_value(value: Value) -> Result<Self, GridParseError> {
        let grid: ScheduleGrid = serde_json::from_value(value)?;
        grid.normalized()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn normalized(mut self) -> Result<Self, GridParseError> {
        self.validate()?;
        self.days.retain(|_, slots| !slots.is_empty());
        Ok(self)
    }

    /// The built-in week used before any remote or persisted data exists.
    pub fn default_week() -> Self {
        use EntryType::*;

        let plan: [(Day, &[(u8, EntryType, &str)]); 7] = [
            (
                Day::Monday,
                &[
                    (9, Work, "Development"),
                    (10, Work, "Development"),
                    (11, Work, "Development"),
                    (12, Break, "Lunch Break"),
                    (13, Meeting, "Team Meeting"),
                    (14, Work, "Code Review"),
                    (15, Work, "Development"),
                    (16, Learning, "Research"),
                    (17, Available, "Available"),
                ],
            ),
            (
                Day::Tuesday,
                &[
                    (9, Work, "Development"),
                    (10, Work, "Development"),
                    (11, Meeting, "Client Call"),
                    (12, Break, "Lunch Break"),
                    (13, Work, "Development"),
                    (14, Work, "Testing"),
                    (15, Learning, "Learning"),
                    (16, Available, "Available"),
                    (17, Available, "Available"),
                ],
            ),
            (
                Day::Wednesday,
                &[
                    (9, Work, "Development"),
                    (10, Work, "Development"),
                    (11, Work, "Development"),
                    (12, Break, "Lunch Break"),
                    (13, Meeting, "Planning"),
                    (14, Work, "Development"),
                    (15, Work, "Documentation"),
                    (16, Available, "Available"),
                    (17, Available, "Available"),
                ],
            ),
            (
                Day::Thursday,
                &[
                    (9, Work, "Development"),
                    (10, Work, "Development"),
                    (11, Meeting, "Standup"),
                    (12, Break, "Lunch Break"),
                    (13, Work, "Development"),
                    (14, Work, "Debugging"),
                    (15, Learning, "Training"),
                    (16, Available, "Available"),
                    (17, Available, "Available"),
                ],
            ),
            (
                Day::Friday,
                &[
                    (9, Work, "Development"),
                    (10, Work, "Development"),
                    (11, Work, "Code Review"),
                    (12, Break, "Lunch Break"),
                    (13, Meeting, "Demo"),
                    (14, Work, "Deployment"),
                    (15, Learning, "Research"),
                    (16, Available, "Available"),
                    (17, Break, "Week Wrap-up"),
                ],
            ),
            (
                Day::Saturday,
                &[
                    (10, Learning, "Side Projects"),
                    (11, Learning, "Side Projects"),
                    (12, Break, "Personal Time"),
                    (13, Available, "Available"),
                    (14, Available, "Available"),
                    (15, Learning, "Learning"),
                    (16, Break, "Personal Time"),
                ],
            ),
            (
                Day::Sunday,
                &[
                    (11, Learning, "Reading"),
                    (12, Break, "Personal Time"),
                    (13, Available, "Available"),
                    (14, Available, "Available"),
                    (15, Learning, "Planning"),
                    (16, Break, "Personal Time"),
                ],
            ),
        ];

        let mut grid = ScheduleGrid::new();
        for (day, slots) in plan {
            for &(hour, entry_type, activity) in slots {
                grid.insert(day, TimeSlot(hour), ScheduleEntry::new(entry_type, activity));
            }
        }
        grid
    }
}
