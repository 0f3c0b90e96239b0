use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Hours assumed for a working weekday unless configured otherwise.
pub const DEFAULT_DAILY_HOURS: f64 = 8.0;

/// Upper bound on the calendar-day scan performed by [`WorkCalendar::add_working_days`]
/// and [`WorkCalendar::snap_to_working_day`]: ten years of calendar days. A scan
/// that exhausts the bound means the calendar can never yield a working day.
pub const MAX_SCAN_DAYS: i64 = 3_660;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("calendar defines no working days")]
    NoWorkingDays,
    #[error("no working day found within {MAX_SCAN_DAYS} calendar days of {from}")]
    ScanExhausted { from: NaiveDate },
}

/// Kind of a single-date calendar exception.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionType {
    Holiday,
    Vacation,
    Shutdown,
    Workday,
    #[default]
    Other,
}

impl ExceptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionType::Holiday => "holiday",
            ExceptionType::Vacation => "vacation",
            ExceptionType::Shutdown => "shutdown",
            ExceptionType::Workday => "workday",
            ExceptionType::Other => "other",
        }
    }

    /// Lenient parse used by the CSV/iCalendar importers; anything
    /// unrecognized becomes [`ExceptionType::Other`].
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "holiday" => ExceptionType::Holiday,
            "vacation" => ExceptionType::Vacation,
            "shutdown" => ExceptionType::Shutdown,
            "workday" | "working-day" | "working_day" => ExceptionType::Workday,
            _ => ExceptionType::Other,
        }
    }
}

/// A single-date override of the weekday default and holiday membership.
///
/// The date is canonical (date-only); a calendar holds at most one exception
/// per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: ExceptionType,
    pub reason: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "isWorkingDay")]
    pub is_working_day: bool,
    #[serde(rename = "workingHours", default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<f64>,
}

impl CalendarException {
    pub fn non_working(
        date: NaiveDate,
        exception_type: ExceptionType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            date,
            exception_type,
            reason: reason.into(),
            description: String::new(),
            is_working_day: false,
            working_hours: None,
        }
    }

    pub fn working(date: NaiveDate, reason: impl Into<String>, hours: Option<f64>) -> Self {
        Self {
            date,
            exception_type: ExceptionType::Workday,
            reason: reason.into(),
            description: String::new(),
            is_working_day: true,
            working_hours: hours,
        }
    }
}

/// Working-day and working-hour model with date exceptions.
///
/// Precedence for a given date: exception, then holiday membership, then the
/// weekday flag. Holiday membership affects only `is_working_day`, never the
/// reported hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    non_working_days: HashSet<Weekday>,
    weekday_hours: [f64; 7],
    holidays: HashSet<NaiveDate>,
    exceptions: BTreeMap<NaiveDate, CalendarException>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
            weekday_hours: [
                DEFAULT_DAILY_HOURS,
                DEFAULT_DAILY_HOURS,
                DEFAULT_DAILY_HOURS,
                DEFAULT_DAILY_HOURS,
                DEFAULT_DAILY_HOURS,
                0.0,
                0.0,
            ],
            holidays: HashSet::new(),
            exceptions: BTreeMap::new(),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut calendar = Self::default();
        calendar.set_working_days(working_days.into_iter().collect());
        calendar.holidays = holidays.into_iter().collect();
        calendar
    }

    /// Default calendar seeded with US federal holidays for a year range
    /// (inclusive).
    pub fn with_us_holidays(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };
        let mut calendar = Self::default();
        for year in start..=end {
            calendar.holidays.extend(us_federal_holidays(year));
        }
        calendar
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Self {
        let mut calendar = Self::default();
        calendar.set_working_days(config.working_days.clone());
        if let Some(hours) = config.weekday_hours {
            calendar.weekday_hours = hours;
        }
        calendar.holidays = config.holidays.iter().copied().collect();
        for exception in &config.exceptions {
            calendar.add_exception(exception.clone());
        }
        calendar
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    /// Replace the set of working weekdays. Hours follow the flags: a day
    /// turned off reports 0 hours, a day turned on that had none reports the
    /// default.
    pub fn set_working_days(&mut self, days: Vec<Weekday>) {
        self.non_working_days.clear();
        for day in Self::ALL_WEEKDAYS {
            let idx = day.num_days_from_monday() as usize;
            if days.contains(&day) {
                if self.weekday_hours[idx] == 0.0 {
                    self.weekday_hours[idx] = DEFAULT_DAILY_HOURS;
                }
            } else {
                self.non_working_days.insert(day);
                self.weekday_hours[idx] = 0.0;
            }
        }
    }

    pub fn set_weekday_hours(&mut self, day: Weekday, hours: f64) {
        self.weekday_hours[day.num_days_from_monday() as usize] = hours;
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Add the same month/day holiday for every year in the range, skipping
    /// dates that do not exist in a given year (e.g. Feb 29).
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }
    }

    /// Insert an exception, replacing any existing exception for that date.
    pub fn add_exception(&mut self, exception: CalendarException) {
        self.exceptions.insert(exception.date, exception);
    }

    pub fn remove_exception(&mut self, date: NaiveDate) -> Option<CalendarException> {
        self.exceptions.remove(&date)
    }

    pub fn exception_on(&self, date: NaiveDate) -> Option<&CalendarException> {
        self.exceptions.get(&date)
    }

    /// Exceptions in date order.
    pub fn exceptions(&self) -> impl Iterator<Item = &CalendarException> {
        self.exceptions.values()
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if let Some(exception) = self.exceptions.get(&date) {
            return exception.is_working_day;
        }
        if self.holidays.contains(&date) {
            return false;
        }
        !self.non_working_days.contains(&date.weekday())
    }

    /// Reported hours for a date. An exception overrides the weekday default;
    /// holiday membership alone leaves the hours untouched.
    pub fn working_hours_on(&self, date: NaiveDate) -> f64 {
        if let Some(exception) = self.exceptions.get(&date) {
            return exception.working_hours.unwrap_or(if exception.is_working_day {
                self.weekday_hours[date.weekday().num_days_from_monday() as usize]
            } else {
                0.0
            });
        }
        self.weekday_hours[date.weekday().num_days_from_monday() as usize]
    }

    /// Step forward (n > 0) or backward (n < 0) until `|n|` working days have
    /// been consumed. `n == 0` returns the input unchanged, working day or not.
    pub fn add_working_days(&self, from: NaiveDate, n: i64) -> Result<NaiveDate, CalendarError> {
        if n == 0 {
            return Ok(from);
        }
        let step = if n > 0 {
            Duration::days(1)
        } else {
            Duration::days(-1)
        };
        let mut current = from;
        let mut remaining = n.abs();
        let mut scanned = 0i64;
        while remaining > 0 {
            current += step;
            scanned += 1;
            if scanned > MAX_SCAN_DAYS {
                return Err(CalendarError::ScanExhausted { from });
            }
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }
        Ok(current)
    }

    /// Identity on working days, else the next working day forward.
    pub fn snap_to_working_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut current = date;
        let mut scanned = 0i64;
        while !self.is_working_day(current) {
            current += Duration::days(1);
            scanned += 1;
            if scanned > MAX_SCAN_DAYS {
                return Err(CalendarError::ScanExhausted { from: date });
            }
        }
        Ok(current)
    }

    /// Signed count of working days between two dates: the number of working
    /// days in `(from, to]` when `to > from`, its negation when `to < from`,
    /// zero when equal. Inverse of [`WorkCalendar::add_working_days`] for
    /// dates it produced.
    pub fn working_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if from == to {
            return 0;
        }
        let (lo, hi, sign) = if to > from { (from, to, 1) } else { (to, from, -1) };
        let mut count = 0i64;
        let mut current = lo + Duration::days(1);
        while current <= hi {
            if self.is_working_day(current) {
                count += 1;
            }
            current += Duration::days(1);
        }
        count * sign
    }

    /// Working days within an inclusive date span.
    pub fn working_days_in_span(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_working_day(current) {
                days.push(current);
            }
            current += Duration::days(1);
        }
        days
    }

    /// Reject a calendar that can never produce a working day. Must pass
    /// before the calendar is handed to the scheduler; the bounded scans in
    /// date stepping are the backstop, not the contract.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.non_working_days.len() < Self::ALL_WEEKDAYS.len() {
            return Ok(());
        }
        if self.exceptions.values().any(|ex| ex.is_working_day) {
            return Ok(());
        }
        Err(CalendarError::NoWorkingDays)
    }
}

/// Serializable round-trip form of [`WorkCalendar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    pub working_days: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_hours: Option<[f64; 7]>,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub exceptions: Vec<CalendarException>,
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working_days = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days,
            weekday_hours: Some(calendar.weekday_hours),
            holidays,
            exceptions: calendar.exceptions.values().cloned().collect(),
        }
    }
}

/// Project-default calendar plus named per-task overrides. Resolution is an
/// explicit lookup; nothing in the engine reaches for an ambient calendar.
#[derive(Debug, Clone, Default)]
pub struct CalendarSet {
    default: WorkCalendar,
    overrides: HashMap<String, WorkCalendar>,
}

impl CalendarSet {
    pub fn new(default: WorkCalendar) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, id: impl Into<String>, calendar: WorkCalendar) -> Self {
        self.overrides.insert(id.into(), calendar);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, calendar: WorkCalendar) {
        self.overrides.insert(id.into(), calendar);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.overrides.contains_key(id)
    }

    pub fn default_calendar(&self) -> &WorkCalendar {
        &self.default
    }

    /// Calendar for a task: its named override when present, else the project
    /// default. Unknown ids fall back to the default; input validation rejects
    /// them before scheduling.
    pub fn resolve(&self, calendar_id: Option<&str>) -> &WorkCalendar {
        calendar_id
            .and_then(|id| self.overrides.get(id))
            .unwrap_or(&self.default)
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        self.default.validate()?;
        for calendar in self.overrides.values() {
            calendar.validate()?;
        }
        Ok(())
    }
}

/// US federal holidays for one year.
fn us_federal_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = [(1, 1), (7, 4), (11, 11), (12, 25)];
    let mut holidays: Vec<NaiveDate> = fixed
        .into_iter()
        .filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect();

    // Floating: MLK, Presidents' Day, Memorial Day, Labor Day, Columbus Day,
    // Thanksgiving.
    holidays.push(nth_weekday(year, 1, Weekday::Mon, 3));
    holidays.push(nth_weekday(year, 2, Weekday::Mon, 3));
    holidays.push(last_weekday(year, 5, Weekday::Mon));
    holidays.push(nth_weekday(year, 9, Weekday::Mon, 1));
    holidays.push(nth_weekday(year, 10, Weekday::Mon, 2));
    holidays.push(nth_weekday(year, 11, Weekday::Thu, 4));
    holidays
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| panic!("invalid month {month} for year {year}"));
    let offset = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    first + Duration::days(offset + 7 * (n as i64 - 1))
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let mut date = next_month.expect("valid month arithmetic") - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    date
}
