//! Weekly timetable analysis: overlapping classes, long breaks between
//! classes and the filters used to narrow a timetable down to one student's
//! subjects.

use crate::error::ScheduleError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Length of one teaching slot including the break.
pub const SLOT_MINUTES: i32 = 55;

/// A break is reported once it could hold this many slots.
pub const MIN_GAP_SLOTS: i32 = 2;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 6] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Mon",
            DayOfWeek::Tuesday => "Tue",
            DayOfWeek::Wednesday => "Wed",
            DayOfWeek::Thursday => "Thu",
            DayOfWeek::Friday => "Fri",
            DayOfWeek::Saturday => "Sat",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElectiveGroup {
    Base,
    Pair1,
    Pair2,
    Pair3,
}

impl ElectiveGroup {
    pub const ALL: [ElectiveGroup; 4] = [
        ElectiveGroup::Base,
        ElectiveGroup::Pair1,
        ElectiveGroup::Pair2,
        ElectiveGroup::Pair3,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Lecture,
    Practice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassMode {
    Offline,
    Online,
}

/// Minutes since midnight, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_minutes(minutes: u16) -> Self {
        Self(minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_to_minutes(s).map(ClockTime)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        format_minutes(time.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minutes(self.0))
    }
}

pub fn parse_time_to_minutes(time: &str) -> Result<u16, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime(time.to_string());
    let (hours, minutes) = time.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u16 = hours.parse().map_err(|_| invalid())?;
    let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
    if hours > 24 || minutes > 59 || hours * 60 + minutes > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub day: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub subject: String,
    pub classroom: Option<String>,
    #[serde(rename = "type")]
    pub class_type: ClassType,
    pub lecturer: Option<String>,
    pub elective_group: ElectiveGroup,
    pub mode: ClassMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Two items of the same day whose time ranges intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conflict<'a> {
    pub a: &'a ScheduleItem,
    pub b: &'a ScheduleItem,
    pub day: DayOfWeek,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap<'a> {
    pub day: DayOfWeek,
    pub after_item: &'a ScheduleItem,
    pub before_item: &'a ScheduleItem,
    pub minutes: i32,
    pub slots: i32,
}

/// Empty fields match every item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFilters {
    pub lecturer: Option<String>,
    pub mode: Option<ClassMode>,
    pub day: Option<DayOfWeek>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectCatalog {
    /// Sorted, deduplicated subjects every student takes.
    pub base: Vec<String>,
    pub electives: BTreeMap<String, ElectiveGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub earliest: ClockTime,
    pub latest: ClockTime,
}

/// Half-open ranges, so a class ending at 14:50 does not clash with one
/// starting at 14:50.
pub fn overlaps(a: &ScheduleItem, b: &ScheduleItem) -> bool {
    a.day == b.day && a.start_time < b.end_time && b.start_time < a.end_time
}

pub fn detect_conflicts(items: &[ScheduleItem]) -> Vec<Conflict<'_>> {
    let mut conflicts = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            if overlaps(a, b) {
                conflicts.push(Conflict { a, b, day: a.day });
            }
        }
    }
    debug!("Found {} conflicts among {} items", conflicts.len(), items.len());
    conflicts
}

pub fn detect_gaps(items: &[ScheduleItem]) -> Vec<Gap<'_>> {
    let mut gaps = Vec::new();
    for (day, day_items) in group_by_day(items) {
        for pair in day_items.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let minutes = i32::from(next.start_time.minutes()) - i32::from(current.end_time.minutes());
            let slots = minutes.div_euclid(SLOT_MINUTES);
            if slots >= MIN_GAP_SLOTS {
                gaps.push(Gap {
                    day,
                    after_item: current,
                    before_item: next,
                    minutes,
                    slots,
                });
            }
        }
    }
    gaps
}

/// Items per day in Monday..Saturday order, each day sorted by start time.
/// Items starting together keep their input order. Days without classes are
/// absent.
pub fn group_by_day(items: &[ScheduleItem]) -> BTreeMap<DayOfWeek, Vec<&ScheduleItem>> {
    let mut days: BTreeMap<DayOfWeek, Vec<&ScheduleItem>> = BTreeMap::new();
    for item in items {
        days.entry(item.day).or_default().push(item);
    }
    for day_items in days.values_mut() {
        day_items.sort_by_key(|item| item.start_time);
    }
    days
}

pub fn filter_items<'a>(
    items: &'a [ScheduleItem],
    enabled_subjects: &HashSet<String>,
    filters: &ScheduleFilters,
) -> Vec<&'a ScheduleItem> {
    items
        .iter()
        .filter(|item| enabled_subjects.contains(&item.subject))
        .filter(|item| match &filters.lecturer {
            Some(lecturer) => item.lecturer.as_ref() == Some(lecturer),
            None => true,
        })
        .filter(|item| filters.mode.map_or(true, |mode| item.mode == mode))
        .filter(|item| filters.day.map_or(true, |day| item.day == day))
        .collect()
}

pub fn unique_subjects(items: &[ScheduleItem]) -> SubjectCatalog {
    let mut base = BTreeSet::new();
    let mut electives = BTreeMap::new();
    for item in items {
        match item.elective_group {
            ElectiveGroup::Base => {
                base.insert(item.subject.clone());
            }
            group => {
                electives.insert(item.subject.clone(), group);
            }
        }
    }
    SubjectCatalog {
        base: base.into_iter().collect(),
        electives,
    }
}

/// Sorted distinct lecturer names, for the lecturer filter.
pub fn unique_lecturers(items: &[ScheduleItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.lecturer.as_deref())
        .filter(|lecturer| !lecturer.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Earliest start and latest end over all items. An empty timetable yields
/// the inverted range 24:00..00:00.
pub fn time_range(items: &[ScheduleItem]) -> TimeRange {
    items.iter().fold(
        TimeRange {
            earliest: ClockTime(MINUTES_PER_DAY),
            latest: ClockTime(0),
        },
        |range, item| TimeRange {
            earliest: range.earliest.min(item.start_time),
            latest: range.latest.max(item.end_time),
        },
    )
}
