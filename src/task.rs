use crate::resource::ResourceAssignment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A work item in the programme network.
///
/// Plain data record: the scheduler reads the input fields and fills the
/// computed ones on a fresh copy. Traversal state never lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub name: String,
    /// Working days, at least 1.
    pub duration_days: i64,
    /// Named per-task calendar override; the project calendar applies when
    /// absent. Resolved through [`crate::calendar::CalendarSet`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    /// Caller-owned scheduled start. Acts as a start-no-earlier-than bound in
    /// the forward pass; mutated only when leveling shifts are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_finish: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_finish: Option<NaiveDate>,
    /// Working days this task can slip without moving the project finish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_float: Option<i64>,
    /// Working days this task can slip without delaying any successor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_float: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_critical: Option<bool>,
    /// Consumed only by the leveling engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_assignments: Vec<ResourceAssignment>,
}

impl Task {
    pub fn new(id: i32, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            duration_days,
            calendar_id: None,
            start: None,
            finish: None,
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float: None,
            free_float: None,
            is_critical: None,
            resource_assignments: Vec::new(),
        }
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    pub fn with_assignment(mut self, assignment: ResourceAssignment) -> Self {
        self.resource_assignments.push(assignment);
        self
    }

    /// Start the task occupies on the board: the caller-owned date when set,
    /// else the computed earliest start.
    pub fn scheduled_start(&self) -> Option<NaiveDate> {
        self.start.or(self.early_start)
    }

    pub fn scheduled_finish(&self) -> Option<NaiveDate> {
        self.finish.or(self.early_finish)
    }

    /// Drop every scheduler-computed field.
    pub fn clear_computed(&mut self) {
        self.early_start = None;
        self.early_finish = None;
        self.late_start = None;
        self.late_finish = None;
        self.total_float = None;
        self.free_float = None;
        self.is_critical = None;
    }
}
