use crate::calculations::{BackwardPass, ForwardPass, free_float_start_bound};
use crate::calendar::{CalendarError, CalendarSet};
use crate::graph::ScheduleDag;
use crate::link::Link;
use crate::metadata::ScheduleMetadata;
use crate::task::Task;
use crate::validation::{self, ValidationError};
use chrono::NaiveDate;
use petgraph::algo::toposort;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("invalid scheduling input: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),
    #[error("circular dependency: {}", format_cycles(.0))]
    CircularDependency(Vec<Vec<i32>>),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_cycles(cycles: &[Vec<i32>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            cycle
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Critical-path engine. Stateless: one [`Scheduler::schedule`] call is a
/// pure function of its inputs and returns a freshly annotated task set; the
/// caller's tasks are never touched, so a failed call overwrites nothing.
pub struct Scheduler<'a> {
    calendars: &'a CalendarSet,
    metadata: &'a ScheduleMetadata,
}

impl<'a> Scheduler<'a> {
    pub fn new(calendars: &'a CalendarSet, metadata: &'a ScheduleMetadata) -> Self {
        Self {
            calendars,
            metadata,
        }
    }

    /// Validate, run both passes, and annotate a copy of `tasks` with
    /// earliest/latest dates, float and criticality.
    pub fn schedule(&self, tasks: &[Task], links: &[Link]) -> Result<Vec<Task>, ScheduleError> {
        self.calendars.validate()?;

        let errors = validation::validate(tasks, links, self.calendars);
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "scheduling input rejected");
            return Err(ScheduleError::Validation(errors));
        }

        let dag = ScheduleDag::build(tasks, links);
        let cycles = dag.detect_cycles();
        if !cycles.is_empty() {
            warn!(cycle_count = cycles.len(), "dependency cycles detected");
            return Err(ScheduleError::CircularDependency(cycles));
        }
        let order = match toposort(&dag.graph, None) {
            Ok(order) => order,
            Err(_) => return Err(ScheduleError::CircularDependency(dag.detect_cycles())),
        };

        debug!(
            task_count = tasks.len(),
            link_count = links.len(),
            project_start = %self.metadata.project_start_date,
            "running scheduling passes"
        );
        let early = ForwardPass::new(tasks, &dag, self.calendars)
            .execute(&order, self.metadata.project_start_date)?;
        let late = BackwardPass::new(tasks, &dag, self.calendars).execute(&order, &early)?;

        let mut scheduled = tasks.to_vec();
        for task in &mut scheduled {
            task.clear_computed();
            let (Some(&(early_start, early_finish)), Some(&(late_start, late_finish))) =
                (early.get(&task.id), late.get(&task.id))
            else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());
            let total_float = calendar.working_days_between(early_start, late_start);

            task.early_start = Some(early_start);
            task.early_finish = Some(early_finish);
            task.late_start = Some(late_start);
            task.late_finish = Some(late_finish);
            task.total_float = Some(total_float);
            task.is_critical = Some(total_float == 0);
        }

        let by_id: HashMap<i32, Task> = scheduled
            .iter()
            .map(|task| (task.id, task.clone()))
            .collect();
        for task in &mut scheduled {
            task.free_float = self.free_float(task, &dag, &by_id)?;
        }

        Ok(scheduled)
    }

    /// Smallest working-day gap before any successor would be delayed,
    /// measured against earliest dates only. Tasks without successors keep
    /// their total float.
    fn free_float(
        &self,
        task: &Task,
        dag: &ScheduleDag,
        by_id: &HashMap<i32, Task>,
    ) -> Result<Option<i64>, ScheduleError> {
        let (Some(early_start), Some(early_finish)) = (task.early_start, task.early_finish) else {
            return Ok(None);
        };

        let successor_links = dag.successor_links(task.id);
        if successor_links.is_empty() {
            return Ok(task.total_float);
        }

        let mut min_gap: Option<i64> = None;
        for link in successor_links {
            let Some(successor) = by_id.get(&link.successor_id) else {
                continue;
            };
            let Some(successor_start) = successor.early_start else {
                continue;
            };
            let calendar = self.calendars.resolve(successor.calendar_id.as_deref());
            let bound = free_float_start_bound(link, early_start, early_finish, calendar)?;
            let gap = calendar.working_days_between(bound, successor_start).max(0);
            min_gap = Some(match min_gap {
                Some(current) if current <= gap => current,
                _ => gap,
            });
        }
        Ok(min_gap)
    }
}

/// Aggregate view of a scheduled task set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub critical_count: usize,
    /// Critical tasks in start order.
    pub critical_path: Vec<i32>,
    pub latest_finish: Option<NaiveDate>,
}

impl ScheduleSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut critical: Vec<(NaiveDate, i32)> = Vec::new();
        let mut latest_finish: Option<NaiveDate> = None;

        for task in tasks {
            if task.is_critical == Some(true) {
                if let Some(start) = task.early_start {
                    critical.push((start, task.id));
                }
            }
            if let Some(finish) = task.early_finish {
                latest_finish = Some(match latest_finish {
                    Some(current) if current >= finish => current,
                    _ => finish,
                });
            }
        }
        critical.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        Self {
            task_count: tasks.len(),
            critical_count: critical.len(),
            critical_path: critical.into_iter().map(|(_, id)| id).collect(),
            latest_finish,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn cycle_error_formats_as_chain() {
        let err = ScheduleError::CircularDependency(vec![vec![1, 2, 3, 1]]);
        assert_eq!(err.to_string(), "circular dependency: 1->2->3->1");
    }

    #[test]
    fn summary_orders_critical_path_by_start() {
        let metadata = ScheduleMetadata {
            project_start_date: d(2025, 1, 6),
            ..Default::default()
        };
        let calendars = CalendarSet::default();
        let tasks = vec![Task::new(1, "A", 2), Task::new(2, "B", 3)];
        let links = vec![Link::new(1, 1, 2, LinkType::FinishToStart)];

        let scheduled = Scheduler::new(&calendars, &metadata)
            .schedule(&tasks, &links)
            .unwrap();
        let summary = ScheduleSummary::from_tasks(&scheduled);
        assert_eq!(summary.critical_path, vec![1, 2]);
        assert_eq!(summary.latest_finish, Some(d(2025, 1, 10)));
        assert!(summary.to_cli_summary().contains("crit_path=1->2"));
    }
}
