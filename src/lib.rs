//! Programme scheduling and critical-path engine.
//!
//! Computes earliest/latest dates, float and critical-path membership over a
//! network of tasks joined by typed dependency links (FS/SS/FF/SF with lag),
//! under working-time calendars with holidays and single-date exceptions.
//! A separate leveling engine previews shifts of non-critical tasks to
//! relieve resource over-allocation.
//!
//! The engine is stateless and synchronous: callers snapshot tasks, links
//! and calendars, run one scheduling call, and apply the returned task set.

pub mod calculations;
pub mod calendar;
pub mod graph;
pub mod interchange;
pub mod leveling;
pub mod link;
pub mod logging;
pub mod metadata;
pub mod resource;
pub mod scheduler;
pub mod task;
pub mod validation;

pub use calendar::{
    CalendarError, CalendarException, CalendarSet, ExceptionType, WorkCalendar, WorkCalendarConfig,
};
pub use interchange::InterchangeError;
pub use leveling::{
    Conflict, LevelingEngine, LevelingPlan, MAX_SHIFT_DAYS, ProposedShift,
};
pub use link::{Link, LinkType};
pub use metadata::ScheduleMetadata;
pub use resource::{Resource, ResourceAssignment};
pub use scheduler::{ScheduleError, ScheduleSummary, Scheduler};
pub use task::Task;
pub use validation::ValidationError;
