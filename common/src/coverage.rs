use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::geography::{self, WEEK};

/// Daily delivery window in half-hour slots.
///
/// Slot 0 = 00:00, slot 1 = 00:30, ..., slot 48 = 24:00 (end of day). The
/// window covers `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HourRange {
    start: u8,
    end: u8,
}

impl HourRange {
    pub const LAST_SLOT: u8 = 48;

    /// 08:00 - 18:00
    pub const BUSINESS_HOURS: HourRange = HourRange { start: 16, end: 36 };

    pub fn new(start: u8, end: u8) -> Result<Self, MarketError> {
        if end > Self::LAST_SLOT || start >= end {
            return Err(MarketError::InvalidHours(format!(
                "{} - {}",
                Self::format_slot(start),
                Self::format_slot(end)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start_slot(&self) -> u8 {
        self.start
    }

    pub fn end_slot(&self) -> u8 {
        self.end
    }

    /// True if the given local time falls inside the window. Times that are
    /// not on a 24-hour clock never do.
    pub fn contains(&self, hour: u8, minute: u8) -> bool {
        if hour > 23 || minute > 59 {
            return false;
        }
        let slot = Self::time_to_slot(hour, minute);
        slot >= self.start && slot < self.end
    }

    /// Convert a slot index to (hour, minute).
    pub fn slot_to_time(slot: u8) -> (u8, u8) {
        (slot / 2, (slot % 2) * 30)
    }

    /// Convert (hour, minute) to the slot it falls in. Saturates for hours
    /// past the end of the day.
    pub fn time_to_slot(hour: u8, minute: u8) -> u8 {
        hour.saturating_mul(2).saturating_add(u8::from(minute >= 30))
    }

    /// Format a slot as "HH:MM" (24-hour).
    pub fn format_slot(slot: u8) -> String {
        let (h, m) = Self::slot_to_time(slot);
        format!("{h:02}:{m:02}")
    }

    fn parse_time(text: &str) -> Option<u8> {
        let (h, m) = text.trim().split_once(':')?;
        let hour: u8 = h.trim().parse().ok()?;
        let minute: u8 = m.trim().parse().ok()?;
        match (hour, minute) {
            (0..=23, 0 | 30) => Some(Self::time_to_slot(hour, minute)),
            (24, 0) => Some(Self::LAST_SLOT),
            _ => None,
        }
    }
}

impl Default for HourRange {
    fn default() -> Self {
        Self::BUSINESS_HOURS
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            Self::format_slot(self.start),
            Self::format_slot(self.end)
        )
    }
}

impl FromStr for HourRange {
    type Err = MarketError;

    /// Accepts "08:00 - 18:00", "08:00-18:00" and "08:00 a 18:00".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MarketError::InvalidHours(s.to_string());
        let (from, to) = s
            .split_once(" a ")
            .or_else(|| s.split_once('-'))
            .ok_or_else(invalid)?;
        let start = Self::parse_time(from).ok_or_else(invalid)?;
        let end = Self::parse_time(to).ok_or_else(invalid)?;
        Self::new(start, end)
    }
}

impl TryFrom<String> for HourRange {
    type Error = MarketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HourRange> for String {
    fn from(value: HourRange) -> Self {
        value.to_string()
    }
}

/// Which weekdays a locality receives deliveries, and at what hours.
/// An empty day list means the schedule has not been configured yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySchedule {
    #[serde(with = "spanish_days")]
    pub days: Vec<Weekday>,
    pub hours: HourRange,
}

impl DeliverySchedule {
    pub fn with_hours(hours: HourRange) -> Self {
        Self {
            days: Vec::new(),
            hours,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.days.is_empty()
    }

    pub fn delivers_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Add or remove a day, keeping the list in Monday→Sunday order.
    pub fn toggle_day(&mut self, day: Weekday) {
        if self.delivers_on(day) {
            self.days.retain(|d| *d != day);
        } else {
            self.days.push(day);
            self.days.sort_by_key(|d| d.num_days_from_monday());
        }
    }

    /// First delivery day on or after `from`, wrapping around the week.
    pub fn next_delivery_day(&self, from: Weekday) -> Option<Weekday> {
        let start = from.num_days_from_monday() as usize;
        (0..7)
            .map(|offset| WEEK[(start + offset) % 7])
            .find(|d| self.delivers_on(*d))
    }
}

mod spanish_days {
    use chrono::Weekday;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::geography::{day_name, parse_day};

    pub fn serialize<S: Serializer>(days: &[Weekday], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(days.iter().map(|d| day_name(*d)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Weekday>, D::Error> {
        let names: Vec<String> = Vec::deserialize(deserializer)?;
        names
            .iter()
            .map(|n| parse_day(n).ok_or_else(|| D::Error::custom(format!("unknown day {n:?}"))))
            .collect()
    }
}

/// A locality a supplier delivers to, with its own schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalityCoverage {
    pub name: String,
    pub schedule: DeliverySchedule,
}

/// A department a supplier delivers to. Never stored with zero localities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageArea {
    pub department: String,
    pub localities: Vec<LocalityCoverage>,
}

impl CoverageArea {
    pub fn locality(&self, name: &str) -> Option<&LocalityCoverage> {
        self.localities.iter().find(|l| l.name == name)
    }
}

/// All areas a supplier delivers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coverage(pub Vec<CoverageArea>);

impl Coverage {
    pub fn areas(&self) -> &[CoverageArea] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, department: &str) -> Option<&CoverageArea> {
        self.0.iter().find(|c| c.department == department)
    }

    pub fn locality(&self, department: &str, locality: &str) -> Option<&LocalityCoverage> {
        self.find(department).and_then(|c| c.locality(locality))
    }

    /// True if the department is covered and, when given, the locality too.
    pub fn covers(&self, department: &str, locality: Option<&str>) -> bool {
        match (self.find(department), locality) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(area), Some(loc)) => area.locality(loc).is_some(),
        }
    }

    pub fn schedule_for(&self, department: &str, locality: &str) -> Option<&DeliverySchedule> {
        self.locality(department, locality).map(|l| &l.schedule)
    }

    pub fn locality_count(&self) -> usize {
        self.0.iter().map(|c| c.localities.len()).sum()
    }

    fn area_mut(&mut self, department: &str) -> Option<&mut CoverageArea> {
        self.0.iter_mut().find(|c| c.department == department)
    }
}

/// Supplier-side editing session over a coverage list.
///
/// Each locality moves `unselected → selected(default schedule) →
/// selected(edited schedule)`. Schedule edits go through a temporary schedule
/// that is applied to the focused locality, or broadcast to a whole
/// department on request.
#[derive(Debug, Clone)]
pub struct CoverageEditor {
    coverage: Coverage,
    default_schedule: DeliverySchedule,
    active_department: String,
    focused: Option<String>,
    temp_schedule: DeliverySchedule,
}

impl CoverageEditor {
    pub fn new(coverage: Coverage, default_hours: HourRange) -> Self {
        let default_schedule = DeliverySchedule::with_hours(default_hours);
        Self {
            coverage,
            temp_schedule: default_schedule.clone(),
            default_schedule,
            active_department: geography::URUGUAY[0].name.to_string(),
            focused: None,
        }
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn into_coverage(self) -> Coverage {
        self.coverage
    }

    pub fn active_department(&self) -> &str {
        &self.active_department
    }

    pub fn focused_locality(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn temp_schedule(&self) -> &DeliverySchedule {
        &self.temp_schedule
    }

    /// Switch the department being edited; drops the locality focus.
    pub fn select_department(&mut self, department: &str) -> Result<(), MarketError> {
        if !geography::is_known_department(department) {
            return Err(MarketError::UnknownDepartment(department.to_string()));
        }
        self.active_department = department.to_string();
        self.focused = None;
        Ok(())
    }

    /// Focus an already selected locality and load its schedule for editing.
    pub fn focus(&mut self, department: &str, locality: &str) -> Result<(), MarketError> {
        let schedule = self
            .coverage
            .schedule_for(department, locality)
            .cloned()
            .ok_or(MarketError::NoFocusedLocality)?;
        self.active_department = department.to_string();
        self.focused = Some(locality.to_string());
        self.temp_schedule = schedule;
        Ok(())
    }

    /// Select or deselect a locality. Returns whether it is selected afterwards.
    ///
    /// A newly selected locality gets the default schedule and takes the
    /// focus. Deselecting the last locality of a department removes the
    /// department entry.
    pub fn toggle_locality(&mut self, department: &str, locality: &str) -> Result<bool, MarketError> {
        if !geography::is_known_locality(department, locality) {
            return Err(MarketError::UnknownLocality {
                department: department.to_string(),
                locality: locality.to_string(),
            });
        }
        self.active_department = department.to_string();
        let fresh = self.fresh_locality(locality);

        let selected = match self.coverage.area_mut(department) {
            Some(area) if area.locality(locality).is_some() => {
                area.localities.retain(|l| l.name != locality);
                if area.localities.is_empty() {
                    self.coverage.0.retain(|c| c.department != department);
                }
                false
            }
            Some(area) => {
                area.localities.push(fresh);
                true
            }
            None => {
                let entry = CoverageArea {
                    department: department.to_string(),
                    localities: vec![fresh],
                };
                self.coverage.0.push(entry);
                true
            }
        };

        if selected {
            self.focused = Some(locality.to_string());
            self.temp_schedule = self.default_schedule.clone();
        } else if self.focused.as_deref() == Some(locality) {
            self.focused = None;
        }
        Ok(selected)
    }

    /// Replace one locality's schedule. No-op if the locality is not selected.
    pub fn update_locality_schedule(
        &mut self,
        department: &str,
        locality: &str,
        schedule: DeliverySchedule,
    ) -> bool {
        let Some(area) = self.coverage.area_mut(department) else {
            return false;
        };
        match area.localities.iter_mut().find(|l| l.name == locality) {
            Some(entry) => {
                entry.schedule = schedule;
                true
            }
            None => false,
        }
    }

    /// Change the delivery hours of the focused locality.
    pub fn set_hours(&mut self, hours: HourRange) -> Result<(), MarketError> {
        let mut schedule = self.temp_schedule.clone();
        schedule.hours = hours;
        self.apply_to_focused(schedule)
    }

    /// Add or remove a delivery day on the focused locality.
    pub fn toggle_day(&mut self, day: Weekday) -> Result<(), MarketError> {
        let mut schedule = self.temp_schedule.clone();
        schedule.toggle_day(day);
        self.apply_to_focused(schedule)
    }

    /// Overwrite the schedule of every selected locality in `department` with
    /// the temporary schedule. Returns how many localities were changed.
    pub fn apply_to_department(&mut self, department: &str) -> Result<usize, MarketError> {
        if !geography::is_known_department(department) {
            return Err(MarketError::UnknownDepartment(department.to_string()));
        }
        let schedule = self.temp_schedule.clone();
        Ok(match self.coverage.area_mut(department) {
            Some(area) => {
                for locality in &mut area.localities {
                    locality.schedule = schedule.clone();
                }
                area.localities.len()
            }
            None => 0,
        })
    }

    fn apply_to_focused(&mut self, schedule: DeliverySchedule) -> Result<(), MarketError> {
        let locality = self.focused.clone().ok_or(MarketError::NoFocusedLocality)?;
        let department = self.active_department.clone();
        if !self.update_locality_schedule(&department, &locality, schedule.clone()) {
            return Err(MarketError::NoFocusedLocality);
        }
        self.temp_schedule = schedule;
        Ok(())
    }

    fn fresh_locality(&self, name: &str) -> LocalityCoverage {
        LocalityCoverage {
            name: name.to_string(),
            schedule: self.default_schedule.clone(),
        }
    }
}
