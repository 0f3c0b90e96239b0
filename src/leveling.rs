use crate::calculations::link_satisfied;
use crate::calendar::CalendarSet;
use crate::graph::ScheduleDag;
use crate::link::Link;
use crate::resource::Resource;
use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const EPSILON: f64 = 1e-6;

/// Cap on how far a single proposal moves a task, in working days.
pub const MAX_SHIFT_DAYS: i64 = 5;

/// Accumulated demand per resource per working day.
pub type DailyAllocation = BTreeMap<NaiveDate, HashMap<String, f64>>;

/// One (date, resource) pair whose accumulated allocation exceeds capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub date: NaiveDate,
    pub resource_id: String,
    pub allocated: f64,
    pub capacity: f64,
}

impl Conflict {
    pub fn excess(&self) -> f64 {
        self.allocated - self.capacity
    }
}

/// A shift of one non-critical task within its float, previewed but never
/// applied by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedShift {
    pub task_id: i32,
    pub shift_days: i64,
    pub new_start: NaiveDate,
    pub new_finish: NaiveDate,
    /// Conflict this shift was accepted for.
    pub conflict_date: NaiveDate,
    pub resource_id: String,
}

/// Outcome of a leveling preview. Conflicts left in `unresolved` had no
/// candidate shift that avoided a new ordering violation; that is a partial
/// success, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingPlan {
    pub conflicts: Vec<Conflict>,
    pub proposals: Vec<ProposedShift>,
    pub unresolved: Vec<Conflict>,
}

impl LevelingPlan {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Resource-leveling heuristic over a scheduled task set. Expects tasks that
/// already carry float and criticality from [`crate::scheduler::Scheduler`];
/// after shifts are applied the scheduler must run again, since leveling can
/// change which tasks are critical.
pub struct LevelingEngine<'a> {
    calendars: &'a CalendarSet,
}

impl<'a> LevelingEngine<'a> {
    pub fn new(calendars: &'a CalendarSet) -> Self {
        Self { calendars }
    }

    /// Spread each assignment's total work evenly across its task's working
    /// days (`work_units / duration_days` per day), accumulated per date per
    /// resource.
    pub fn daily_allocation(&self, tasks: &[Task]) -> DailyAllocation {
        let mut allocation = DailyAllocation::new();
        for task in tasks {
            if task.resource_assignments.is_empty() || task.duration_days < 1 {
                continue;
            }
            let (Some(start), Some(finish)) = (task.scheduled_start(), task.scheduled_finish())
            else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());
            let days = calendar.working_days_in_span(start, finish);
            if days.is_empty() {
                continue;
            }
            for assignment in &task.resource_assignments {
                let per_day = assignment.work_units / task.duration_days as f64;
                for &day in &days {
                    *allocation
                        .entry(day)
                        .or_default()
                        .entry(assignment.resource_id.clone())
                        .or_insert(0.0) += per_day;
                }
            }
        }
        allocation
    }

    /// Every (date, resource) pair over capacity, ordered by date then
    /// resource id. Resources without a stated capacity are not policed.
    pub fn detect_over_allocations(
        &self,
        allocation: &DailyAllocation,
        resources: &[Resource],
    ) -> Vec<Conflict> {
        let capacity: HashMap<&str, f64> = resources
            .iter()
            .map(|resource| (resource.id.as_str(), resource.capacity))
            .collect();

        let mut conflicts = Vec::new();
        for (&date, per_resource) in allocation {
            for (resource_id, &allocated) in per_resource {
                let Some(&cap) = capacity.get(resource_id.as_str()) else {
                    continue;
                };
                if allocated > cap + EPSILON {
                    conflicts.push(Conflict {
                        date,
                        resource_id: resource_id.clone(),
                        allocated,
                        capacity: cap,
                    });
                }
            }
        }
        conflicts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.resource_id.cmp(&b.resource_id)));
        conflicts
    }

    /// Full preview: detect conflicts, then walk them most-severe-excess
    /// first, accepting at most one shift per conflict. Accepted shifts
    /// accumulate in a working copy, so a conflict an earlier shift already
    /// dissolved is skipped as resolved.
    pub fn propose_shifts(
        &self,
        tasks: &[Task],
        links: &[Link],
        resources: &[Resource],
    ) -> LevelingPlan {
        let conflicts = self.detect_over_allocations(&self.daily_allocation(tasks), resources);
        if conflicts.is_empty() {
            debug!("no resource over-allocations detected");
            return LevelingPlan {
                conflicts,
                proposals: Vec::new(),
                unresolved: Vec::new(),
            };
        }

        let capacity: HashMap<&str, f64> = resources
            .iter()
            .map(|resource| (resource.id.as_str(), resource.capacity))
            .collect();
        let dag = ScheduleDag::build(tasks, links);
        let mut working: Vec<Task> = tasks.to_vec();

        let mut ordered = conflicts.clone();
        ordered.sort_by(|a, b| {
            b.excess()
                .partial_cmp(&a.excess())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });

        let mut proposals = Vec::new();
        let mut unresolved = Vec::new();
        for conflict in ordered {
            let still_over = self
                .daily_allocation(&working)
                .get(&conflict.date)
                .and_then(|per_resource| per_resource.get(&conflict.resource_id))
                .zip(capacity.get(conflict.resource_id.as_str()))
                .is_some_and(|(&allocated, &cap)| allocated > cap + EPSILON);
            if !still_over {
                continue;
            }

            match self.find_shift(&conflict, &working, &dag) {
                Some(shift) => {
                    if let Some(task) = working.iter_mut().find(|t| t.id == shift.task_id) {
                        task.start = Some(shift.new_start);
                        task.finish = Some(shift.new_finish);
                    }
                    proposals.push(shift);
                }
                None => {
                    warn!(
                        date = %conflict.date,
                        resource = %conflict.resource_id,
                        "no feasible shift for over-allocation"
                    );
                    unresolved.push(conflict);
                }
            }
        }

        debug!(
            conflict_count = conflicts.len(),
            proposal_count = proposals.len(),
            unresolved_count = unresolved.len(),
            "leveling preview complete"
        );
        LevelingPlan {
            conflicts,
            proposals,
            unresolved,
        }
    }

    /// Mutates only `start`/`finish` of the shifted tasks. The caller owns
    /// re-running the scheduler afterward.
    pub fn apply_shifts(tasks: &mut [Task], proposals: &[ProposedShift]) {
        for proposal in proposals {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == proposal.task_id) {
                task.start = Some(proposal.new_start);
                task.finish = Some(proposal.new_finish);
            }
        }
    }

    /// Pick the first candidate whose simulated shift keeps every incoming
    /// and outgoing link satisfied. Candidates are tasks active on the
    /// conflict date, assigned to the conflicted resource, with float to
    /// spend; ranked by descending float, then descending allocation share.
    fn find_shift(
        &self,
        conflict: &Conflict,
        working: &[Task],
        dag: &ScheduleDag,
    ) -> Option<ProposedShift> {
        let by_id: HashMap<i32, &Task> = working.iter().map(|task| (task.id, task)).collect();

        let mut candidates: Vec<&Task> = working
            .iter()
            .filter(|task| {
                task.total_float.unwrap_or(0) > 0
                    && self.allocation_share(task, &conflict.resource_id) > 0.0
                    && self.active_on(task, conflict.date)
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.total_float
                .unwrap_or(0)
                .cmp(&a.total_float.unwrap_or(0))
                .then_with(|| {
                    self.allocation_share(b, &conflict.resource_id)
                        .partial_cmp(&self.allocation_share(a, &conflict.resource_id))
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        for task in candidates {
            let shift_days = task.total_float.unwrap_or(0).min(MAX_SHIFT_DAYS);
            if shift_days < 1 {
                continue;
            }
            let Some(start) = task.scheduled_start() else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());
            let Ok(new_start) = calendar.add_working_days(start, shift_days) else {
                continue;
            };
            let Ok(new_finish) = calendar.add_working_days(new_start, task.duration_days - 1)
            else {
                continue;
            };

            if self.shift_respects_links(task, new_start, new_finish, &by_id, dag) {
                return Some(ProposedShift {
                    task_id: task.id,
                    shift_days,
                    new_start,
                    new_finish,
                    conflict_date: conflict.date,
                    resource_id: conflict.resource_id.clone(),
                });
            }
            warn!(task_id = task.id, "shift rejected: would break an ordering constraint");
        }
        None
    }

    fn allocation_share(&self, task: &Task, resource_id: &str) -> f64 {
        task.resource_assignments
            .iter()
            .filter(|assignment| assignment.resource_id == resource_id)
            .map(|assignment| assignment.work_units / task.duration_days.max(1) as f64)
            .sum()
    }

    fn active_on(&self, task: &Task, date: NaiveDate) -> bool {
        match (task.scheduled_start(), task.scheduled_finish()) {
            (Some(start), Some(finish)) => start <= date && date <= finish,
            _ => false,
        }
    }

    fn shift_respects_links(
        &self,
        task: &Task,
        new_start: NaiveDate,
        new_finish: NaiveDate,
        by_id: &HashMap<i32, &Task>,
        dag: &ScheduleDag,
    ) -> bool {
        for link in dag.predecessor_links(task.id) {
            let Some(pred) = by_id.get(&link.predecessor_id) else {
                continue;
            };
            let (Some(pred_start), Some(pred_finish)) =
                (pred.scheduled_start(), pred.scheduled_finish())
            else {
                continue;
            };
            let calendar = self.calendars.resolve(task.calendar_id.as_deref());
            match link_satisfied(link, pred_start, pred_finish, new_start, new_finish, calendar) {
                Ok(true) => {}
                Ok(false) | Err(_) => return false,
            }
        }

        for link in dag.successor_links(task.id) {
            let Some(succ) = by_id.get(&link.successor_id) else {
                continue;
            };
            let (Some(succ_start), Some(succ_finish)) =
                (succ.scheduled_start(), succ.scheduled_finish())
            else {
                continue;
            };
            let calendar = self.calendars.resolve(succ.calendar_id.as_deref());
            match link_satisfied(link, new_start, new_finish, succ_start, succ_finish, calendar) {
                Ok(true) => {}
                Ok(false) | Err(_) => return false,
            }
        }
        true
    }
}
