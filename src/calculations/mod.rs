pub mod backward_pass;
pub mod forward_pass;

pub use backward_pass::BackwardPass;
pub use forward_pass::ForwardPass;

use crate::calendar::{CalendarError, WorkCalendar};
use crate::link::{Link, LinkType};
use chrono::NaiveDate;

/// Earliest start a link allows its successor, given the predecessor's
/// earliest dates. Finish-anchored kinds back-solve the start from the
/// successor's duration.
pub(crate) fn successor_start_bound(
    link: &Link,
    pred_early_start: NaiveDate,
    pred_early_finish: NaiveDate,
    successor_duration: i64,
    calendar: &WorkCalendar,
) -> Result<NaiveDate, CalendarError> {
    match link.link_type {
        LinkType::FinishToStart => calendar.add_working_days(pred_early_finish, link.lag_days + 1),
        LinkType::StartToStart => calendar.add_working_days(pred_early_start, link.lag_days),
        LinkType::FinishToFinish => calendar.add_working_days(
            pred_early_finish,
            link.lag_days - successor_duration + 1,
        ),
        LinkType::StartToFinish => calendar.add_working_days(
            pred_early_start,
            link.lag_days - successor_duration + 1,
        ),
    }
}

/// Latest finish a link allows its predecessor, given the successor's latest
/// dates. Start-anchored kinds constrain the predecessor's start and derive
/// the finish from its duration.
pub(crate) fn predecessor_finish_bound(
    link: &Link,
    succ_late_start: NaiveDate,
    succ_late_finish: NaiveDate,
    predecessor_duration: i64,
    calendar: &WorkCalendar,
) -> Result<NaiveDate, CalendarError> {
    match link.link_type {
        LinkType::FinishToStart => {
            calendar.add_working_days(succ_late_start, -(link.lag_days + 1))
        }
        LinkType::StartToStart => {
            let late_start = calendar.add_working_days(succ_late_start, -link.lag_days)?;
            calendar.add_working_days(late_start, predecessor_duration - 1)
        }
        LinkType::FinishToFinish => calendar.add_working_days(succ_late_finish, -link.lag_days),
        LinkType::StartToFinish => {
            let late_start = calendar.add_working_days(succ_late_finish, -link.lag_days)?;
            calendar.add_working_days(late_start, predecessor_duration - 1)
        }
    }
}

/// Successor start this link protects when measuring free float. FF and SF
/// deliberately reuse the start-anchored formulas rather than finish-anchored
/// ones; switching them changes reported float for existing programmes.
pub(crate) fn free_float_start_bound(
    link: &Link,
    pred_early_start: NaiveDate,
    pred_early_finish: NaiveDate,
    calendar: &WorkCalendar,
) -> Result<NaiveDate, CalendarError> {
    match link.link_type {
        LinkType::FinishToStart | LinkType::FinishToFinish => {
            calendar.add_working_days(pred_early_finish, link.lag_days + 1)
        }
        LinkType::StartToStart | LinkType::StartToFinish => {
            calendar.add_working_days(pred_early_start, link.lag_days)
        }
    }
}

/// Whether a link's ordering constraint holds for concrete dates.
pub(crate) fn link_satisfied(
    link: &Link,
    pred_start: NaiveDate,
    pred_finish: NaiveDate,
    succ_start: NaiveDate,
    succ_finish: NaiveDate,
    calendar: &WorkCalendar,
) -> Result<bool, CalendarError> {
    let holds = match link.link_type {
        LinkType::FinishToStart => {
            succ_start >= calendar.add_working_days(pred_finish, link.lag_days + 1)?
        }
        LinkType::StartToStart => {
            succ_start >= calendar.add_working_days(pred_start, link.lag_days)?
        }
        LinkType::FinishToFinish => {
            succ_finish >= calendar.add_working_days(pred_finish, link.lag_days)?
        }
        LinkType::StartToFinish => {
            succ_finish >= calendar.add_working_days(pred_start, link.lag_days)?
        }
    };
    Ok(holds)
}
