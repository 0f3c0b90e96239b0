use super::predecessor_finish_bound;
use crate::calendar::{CalendarError, CalendarSet};
use crate::graph::ScheduleDag;
use crate::task::Task;
use chrono::NaiveDate;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use tracing::trace;

/// Backward pass: latest start/finish per task, keyed by task id.
pub struct BackwardPass<'a> {
    tasks: &'a [Task],
    dag: &'a ScheduleDag,
    calendars: &'a CalendarSet,
}

impl<'a> BackwardPass<'a> {
    pub fn new(tasks: &'a [Task], dag: &'a ScheduleDag, calendars: &'a CalendarSet) -> Self {
        Self {
            tasks,
            dag,
            calendars,
        }
    }

    /// `order` is the same topological order the forward pass used; it is
    /// walked in reverse so successors resolve before their predecessors.
    /// Tasks with no successors anchor to their own earliest finish.
    pub fn execute(
        &self,
        order: &[NodeIndex],
        early: &HashMap<i32, (NaiveDate, NaiveDate)>,
    ) -> Result<HashMap<i32, (NaiveDate, NaiveDate)>, CalendarError> {
        let by_id: HashMap<i32, &Task> = self.tasks.iter().map(|task| (task.id, task)).collect();
        let mut late: HashMap<i32, (NaiveDate, NaiveDate)> =
            HashMap::with_capacity(self.tasks.len());

        for &node_ix in order.iter().rev() {
            let task_id = self.dag.graph[node_ix];
            let Some(task) = by_id.get(&task_id) else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());

            let mut bound_min: Option<NaiveDate> = None;
            for link in self.dag.successor_links(task_id) {
                let Some(&(succ_ls, succ_lf)) = late.get(&link.successor_id) else {
                    continue;
                };
                let bound =
                    predecessor_finish_bound(link, succ_ls, succ_lf, task.duration_days, calendar)?;
                bound_min = Some(match bound_min {
                    Some(current) if current <= bound => current,
                    _ => bound,
                });
            }

            let late_finish = match bound_min {
                Some(bound) => bound,
                None => match early.get(&task_id) {
                    Some(&(_, early_finish)) => early_finish,
                    None => continue,
                },
            };
            let late_start = calendar.add_working_days(late_finish, -(task.duration_days - 1))?;
            trace!(task_id, %late_start, %late_finish, "backward pass resolved task");
            late.insert(task_id, (late_start, late_finish));
        }

        Ok(late)
    }
}
