use crate::calendar::CalendarSet;
use crate::link::Link;
use crate::task::Task;
use std::collections::HashSet;
use thiserror::Error;

const EPSILON: f64 = 1e-6;

/// A single structural violation in the scheduling input. Violations are
/// collected exhaustively; the scheduler aborts before either pass when any
/// are present.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate task id {task_id}")]
    DuplicateTaskId { task_id: i32 },
    #[error("task {task_id} has non-positive duration {duration_days}")]
    NonPositiveDuration { task_id: i32, duration_days: i64 },
    #[error("task {task_id} references unknown calendar '{calendar_id}'")]
    UnknownCalendar { task_id: i32, calendar_id: String },
    #[error("task {task_id} resource assignment #{index} has an empty resource id")]
    EmptyResourceId { task_id: i32, index: usize },
    #[error("task {task_id} assignment for '{resource_id}' has invalid work units {work_units}")]
    InvalidWorkUnits {
        task_id: i32,
        resource_id: String,
        work_units: f64,
    },
    #[error("duplicate link id {link_id}")]
    DuplicateLinkId { link_id: i32 },
    #[error("link {link_id} references unknown predecessor task {task_id}")]
    UnknownPredecessor { link_id: i32, task_id: i32 },
    #[error("link {link_id} references unknown successor task {task_id}")]
    UnknownSuccessor { link_id: i32, task_id: i32 },
    #[error("link {link_id} connects task {task_id} to itself")]
    SelfReference { link_id: i32, task_id: i32 },
}

/// Check tasks and links against the data-model invariants. Reports every
/// violation found, not just the first. Multi-hop cycles are not detected
/// here; see [`crate::graph::ScheduleDag::detect_cycles`].
pub fn validate(tasks: &[Task], links: &[Link], calendars: &CalendarSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut task_ids: HashSet<i32> = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !task_ids.insert(task.id) {
            errors.push(ValidationError::DuplicateTaskId { task_id: task.id });
        }
        if task.duration_days < 1 {
            errors.push(ValidationError::NonPositiveDuration {
                task_id: task.id,
                duration_days: task.duration_days,
            });
        }
        if let Some(calendar_id) = &task.calendar_id {
            if !calendars.contains(calendar_id) {
                errors.push(ValidationError::UnknownCalendar {
                    task_id: task.id,
                    calendar_id: calendar_id.clone(),
                });
            }
        }
        for (index, assignment) in task.resource_assignments.iter().enumerate() {
            if assignment.resource_id.trim().is_empty() {
                errors.push(ValidationError::EmptyResourceId {
                    task_id: task.id,
                    index,
                });
            }
            if !assignment.work_units.is_finite() || assignment.work_units < -EPSILON {
                errors.push(ValidationError::InvalidWorkUnits {
                    task_id: task.id,
                    resource_id: assignment.resource_id.clone(),
                    work_units: assignment.work_units,
                });
            }
        }
    }

    let mut link_ids: HashSet<i32> = HashSet::with_capacity(links.len());
    for link in links {
        if !link_ids.insert(link.id) {
            errors.push(ValidationError::DuplicateLinkId { link_id: link.id });
        }
        if !task_ids.contains(&link.predecessor_id) {
            errors.push(ValidationError::UnknownPredecessor {
                link_id: link.id,
                task_id: link.predecessor_id,
            });
        }
        if !task_ids.contains(&link.successor_id) {
            errors.push(ValidationError::UnknownSuccessor {
                link_id: link.id,
                task_id: link.successor_id,
            });
        }
        if link.predecessor_id == link.successor_id {
            errors.push(ValidationError::SelfReference {
                link_id: link.id,
                task_id: link.predecessor_id,
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkType;

    #[test]
    fn collects_every_violation() {
        let tasks = vec![
            Task::new(1, "A", 3),
            Task::new(1, "A again", 0),
            Task::new(2, "B", 2).with_calendar("night-shift"),
        ];
        let links = vec![
            Link::new(10, 1, 2, LinkType::FinishToStart),
            Link::new(10, 1, 99, LinkType::FinishToStart),
            Link::new(11, 2, 2, LinkType::StartToStart),
        ];
        let calendars = CalendarSet::default();

        let errors = validate(&tasks, &links, &calendars);
        assert!(errors.contains(&ValidationError::DuplicateTaskId { task_id: 1 }));
        assert!(errors.contains(&ValidationError::NonPositiveDuration {
            task_id: 1,
            duration_days: 0
        }));
        assert!(errors.contains(&ValidationError::UnknownCalendar {
            task_id: 2,
            calendar_id: "night-shift".to_string()
        }));
        assert!(errors.contains(&ValidationError::DuplicateLinkId { link_id: 10 }));
        assert!(errors.contains(&ValidationError::UnknownSuccessor {
            link_id: 10,
            task_id: 99
        }));
        assert!(errors.contains(&ValidationError::SelfReference {
            link_id: 11,
            task_id: 2
        }));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn clean_input_produces_no_errors() {
        let tasks = vec![Task::new(1, "A", 1), Task::new(2, "B", 2)];
        let links = vec![Link::new(1, 1, 2, LinkType::FinishToStart)];
        assert!(validate(&tasks, &links, &CalendarSet::default()).is_empty());
    }
}
