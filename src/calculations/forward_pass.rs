use super::successor_start_bound;
use crate::calendar::{CalendarError, CalendarSet};
use crate::graph::ScheduleDag;
use crate::task::Task;
use chrono::NaiveDate;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use tracing::trace;

/// Forward pass: earliest start/finish per task, keyed by task id.
pub struct ForwardPass<'a> {
    tasks: &'a [Task],
    dag: &'a ScheduleDag,
    calendars: &'a CalendarSet,
}

impl<'a> ForwardPass<'a> {
    pub fn new(tasks: &'a [Task], dag: &'a ScheduleDag, calendars: &'a CalendarSet) -> Self {
        Self {
            tasks,
            dag,
            calendars,
        }
    }

    /// `order` must be a topological order of the dag; every predecessor is
    /// resolved before its successors are visited.
    pub fn execute(
        &self,
        order: &[NodeIndex],
        project_start: NaiveDate,
    ) -> Result<HashMap<i32, (NaiveDate, NaiveDate)>, CalendarError> {
        let by_id: HashMap<i32, &Task> = self.tasks.iter().map(|task| (task.id, task)).collect();
        let mut early: HashMap<i32, (NaiveDate, NaiveDate)> =
            HashMap::with_capacity(self.tasks.len());

        for &node_ix in order {
            let task_id = self.dag.graph[node_ix];
            let Some(task) = by_id.get(&task_id) else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());

            let mut bound_max: Option<NaiveDate> = None;
            for link in self.dag.predecessor_links(task_id) {
                let Some(&(pred_es, pred_ef)) = early.get(&link.predecessor_id) else {
                    continue;
                };
                let bound =
                    successor_start_bound(link, pred_es, pred_ef, task.duration_days, calendar)?;
                bound_max = Some(match bound_max {
                    Some(current) if current >= bound => current,
                    _ => bound,
                });
            }

            // The task's own start is a start-no-earlier-than bound; applied
            // leveling shifts survive the re-schedule through it.
            let candidate = match (bound_max, task.start) {
                (Some(bound), Some(start)) => bound.max(start),
                (Some(bound), None) => bound,
                (None, Some(start)) => start,
                (None, None) => project_start,
            };

            let early_start = calendar.snap_to_working_day(candidate)?;
            let early_finish = calendar.add_working_days(early_start, task.duration_days - 1)?;
            trace!(task_id, %early_start, %early_finish, "forward pass resolved task");
            early.insert(task_id, (early_start, early_finish));
        }

        Ok(early)
    }
}
