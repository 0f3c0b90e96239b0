//! Calendar-exception interchange formats.
//!
//! Exceptions travel between the engine and out-of-scope UI panels as JSON,
//! CSV, or iCalendar `VEVENT` blocks. The engine only converts; it never
//! touches the filesystem, so CSV works over any reader/writer and the other
//! two formats over strings.

use crate::calendar::{CalendarException, ExceptionType};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub fn exceptions_to_json(exceptions: &[CalendarException]) -> Result<String, InterchangeError> {
    Ok(serde_json::to_string_pretty(exceptions)?)
}

pub fn exceptions_from_json(input: &str) -> Result<Vec<CalendarException>, InterchangeError> {
    Ok(serde_json::from_str(input)?)
}

#[derive(Serialize, Deserialize)]
struct ExceptionCsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Type")]
    exception_type: String,
    #[serde(rename = "Reason")]
    reason: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Working Hours")]
    working_hours: String,
    #[serde(rename = "Is Working Day")]
    is_working_day: String,
}

impl From<&CalendarException> for ExceptionCsvRecord {
    fn from(exception: &CalendarException) -> Self {
        Self {
            date: exception.date.format("%Y-%m-%d").to_string(),
            exception_type: exception.exception_type.as_str().to_string(),
            reason: exception.reason.clone(),
            description: exception.description.clone(),
            working_hours: exception
                .working_hours
                .map(|hours| hours.to_string())
                .unwrap_or_default(),
            is_working_day: exception.is_working_day.to_string(),
        }
    }
}

impl ExceptionCsvRecord {
    fn into_exception(self) -> Result<CalendarException, InterchangeError> {
        let date = parse_date(&self.date)?;
        let working_hours = if self.working_hours.trim().is_empty() {
            None
        } else {
            Some(self.working_hours.trim().parse::<f64>().map_err(|e| {
                InterchangeError::InvalidData(format!(
                    "invalid working hours '{}': {e}",
                    self.working_hours
                ))
            })?)
        };
        let is_working_day = match self.is_working_day.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" | "" => false,
            other => {
                return Err(InterchangeError::InvalidData(format!(
                    "invalid boolean '{other}'"
                )));
            }
        };
        Ok(CalendarException {
            date,
            exception_type: ExceptionType::from_str(&self.exception_type),
            reason: self.reason,
            description: self.description,
            is_working_day,
            working_hours,
        })
    }
}

pub fn write_exceptions_csv<W: Write>(
    exceptions: &[CalendarException],
    writer: W,
) -> Result<(), InterchangeError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for exception in exceptions {
        csv_writer.serialize(ExceptionCsvRecord::from(exception))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn read_exceptions_csv<R: Read>(reader: R) -> Result<Vec<CalendarException>, InterchangeError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut exceptions = Vec::new();
    for record in csv_reader.deserialize::<ExceptionCsvRecord>() {
        exceptions.push(record?.into_exception()?);
    }
    Ok(exceptions)
}

pub fn exceptions_to_ical(exceptions: &[CalendarException]) -> String {
    let mut out = String::new();
    out.push_str("BEGIN:VCALENDAR\r\n");
    out.push_str("VERSION:2.0\r\n");
    out.push_str("PRODID:-//gantt-engine//calendar exceptions//EN\r\n");
    for exception in exceptions {
        let stamp = exception.date.format("%Y%m%d");
        out.push_str("BEGIN:VEVENT\r\n");
        out.push_str(&format!("UID:{stamp}@gantt-engine\r\n"));
        out.push_str(&format!("DTSTART;VALUE=DATE:{stamp}\r\n"));
        out.push_str(&format!(
            "DTEND;VALUE=DATE:{}\r\n",
            (exception.date + Duration::days(1)).format("%Y%m%d")
        ));
        out.push_str(&format!("SUMMARY:{}\r\n", escape_text(&exception.reason)));
        if !exception.description.is_empty() {
            out.push_str(&format!(
                "DESCRIPTION:{}\r\n",
                escape_text(&exception.description)
            ));
        }
        out.push_str(&format!(
            "CATEGORIES:{}\r\n",
            exception.exception_type.as_str().to_ascii_uppercase()
        ));
        out.push_str(&format!(
            "X-IS-WORKING-DAY:{}\r\n",
            if exception.is_working_day { "TRUE" } else { "FALSE" }
        ));
        if let Some(hours) = exception.working_hours {
            out.push_str(&format!("X-WORKING-HOURS:{hours}\r\n"));
        }
        out.push_str("END:VEVENT\r\n");
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

pub fn exceptions_from_ical(input: &str) -> Result<Vec<CalendarException>, InterchangeError> {
    let mut exceptions = Vec::new();
    let mut current: Option<PartialEvent> = None;

    for line in unfold_lines(input) {
        if line == "BEGIN:VEVENT" {
            current = Some(PartialEvent::default());
            continue;
        }
        if line == "END:VEVENT" {
            if let Some(event) = current.take() {
                exceptions.push(event.into_exception()?);
            }
            continue;
        }
        let Some(event) = current.as_mut() else {
            continue;
        };
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        // Property parameters (e.g. DTSTART;VALUE=DATE) are irrelevant here.
        let name = name.split(';').next().unwrap_or(name);
        match name {
            "DTSTART" => event.date = Some(parse_ical_date(value)?),
            "SUMMARY" => event.reason = unescape_text(value),
            "DESCRIPTION" => event.description = unescape_text(value),
            "CATEGORIES" => event.exception_type = ExceptionType::from_str(value),
            "X-IS-WORKING-DAY" => {
                event.is_working_day = value.trim().eq_ignore_ascii_case("true");
            }
            "X-WORKING-HOURS" => {
                event.working_hours = Some(value.trim().parse::<f64>().map_err(|e| {
                    InterchangeError::InvalidData(format!("invalid working hours '{value}': {e}"))
                })?);
            }
            _ => {}
        }
    }

    Ok(exceptions)
}

#[derive(Default)]
struct PartialEvent {
    date: Option<NaiveDate>,
    exception_type: ExceptionType,
    reason: String,
    description: String,
    is_working_day: bool,
    working_hours: Option<f64>,
}

impl PartialEvent {
    fn into_exception(self) -> Result<CalendarException, InterchangeError> {
        let date = self
            .date
            .ok_or_else(|| InterchangeError::InvalidData("VEVENT without DTSTART".into()))?;
        Ok(CalendarException {
            date,
            exception_type: self.exception_type,
            reason: self.reason,
            description: self.description,
            is_working_day: self.is_working_day,
            working_hours: self.working_hours,
        })
    }
}

/// RFC 5545 line unfolding: a line starting with a space or tab continues
/// the previous one. Carriage returns are stripped before unfolding so a
/// folded CRLF stream does not leave `\r` embedded in property values.
fn unfold_lines(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in input.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(stripped) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(stripped);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

fn parse_date(input: &str) -> Result<NaiveDate, InterchangeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| InterchangeError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_ical_date(input: &str) -> Result<NaiveDate, InterchangeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y%m%d")
        .map_err(|e| InterchangeError::InvalidData(format!("invalid iCalendar date '{input}': {e}")))
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
