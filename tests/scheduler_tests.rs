use chrono::NaiveDate;
use gantt_engine::{
    CalendarException, CalendarSet, Link, LinkType, ScheduleError, ScheduleMetadata, Scheduler,
    Task, ValidationError, WorkCalendar,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn metadata_from(start: NaiveDate) -> ScheduleMetadata {
    ScheduleMetadata {
        project_start_date: start,
        ..Default::default()
    }
}

fn by_id(tasks: &[Task], id: i32) -> &Task {
    tasks.iter().find(|t| t.id == id).unwrap()
}

/// Three tasks FS-chained, durations 2/3/1, five-day week, Monday start.
fn fs_chain() -> (Vec<Task>, Vec<Link>) {
    let tasks = vec![
        Task::new(1, "Groundwork", 2),
        Task::new(2, "Structure", 3),
        Task::new(3, "Handover", 1),
    ];
    let links = vec![
        Link::new(1, 1, 2, LinkType::FinishToStart),
        Link::new(2, 2, 3, LinkType::FinishToStart),
    ];
    (tasks, links)
}

#[test]
fn fs_chain_schedules_monday_through_following_monday() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6)); // Monday
    let (tasks, links) = fs_chain();

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    let a = by_id(&scheduled, 1);
    assert_eq!(a.early_start, Some(d(2025, 1, 6)));
    assert_eq!(a.early_finish, Some(d(2025, 1, 7))); // Tuesday

    let b = by_id(&scheduled, 2);
    assert_eq!(b.early_start, Some(d(2025, 1, 8))); // Wednesday
    assert_eq!(b.early_finish, Some(d(2025, 1, 10))); // Friday

    let c = by_id(&scheduled, 3);
    assert_eq!(c.early_start, Some(d(2025, 1, 13))); // following Monday
    assert_eq!(c.early_finish, Some(d(2025, 1, 13)));

    for task in &scheduled {
        assert_eq!(task.total_float, Some(0));
        assert_eq!(task.is_critical, Some(true));
    }
}

#[test]
fn lag_pushes_successor_but_not_predecessor() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let (tasks, mut links) = fs_chain();
    links[0].lag_days = 2;

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    // Two working days later than the zero-lag Wednesday.
    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 10)));
    assert_eq!(by_id(&scheduled, 1).early_start, Some(d(2025, 1, 6)));
    assert_eq!(by_id(&scheduled, 1).early_finish, Some(d(2025, 1, 7)));
}

#[test]
fn ss_link_offsets_start_independent_of_predecessor_duration() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 4), Task::new(2, "B", 2)];
    let links = vec![Link::new(1, 1, 2, LinkType::StartToStart).with_lag(1)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 7)));
}

#[test]
fn ff_link_aligns_finishes() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 3), Task::new(2, "B", 2)];
    let links = vec![Link::new(1, 1, 2, LinkType::FinishToFinish)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    // A runs Mon-Wed; B backs into Tue-Wed so the finishes line up.
    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 7)));
    assert_eq!(by_id(&scheduled, 2).early_finish, Some(d(2025, 1, 8)));
}

#[test]
fn sf_link_constrains_successor_finish_from_predecessor_start() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 2), Task::new(2, "B", 1)];
    let links = vec![Link::new(1, 1, 2, LinkType::StartToFinish).with_lag(3)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    // B must finish three working days after A starts: Thursday.
    assert_eq!(by_id(&scheduled, 2).early_finish, Some(d(2025, 1, 9)));
}

#[test]
fn diamond_gives_slack_to_the_short_branch() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    // 1 -> {2, 3} -> 4 with durations 2, 3, 1, 2.
    let tasks = vec![
        Task::new(1, "T1", 2),
        Task::new(2, "T2", 3),
        Task::new(3, "T3", 1),
        Task::new(4, "T4", 2),
    ];
    let links = vec![
        Link::new(1, 1, 2, LinkType::FinishToStart),
        Link::new(2, 1, 3, LinkType::FinishToStart),
        Link::new(3, 2, 4, LinkType::FinishToStart),
        Link::new(4, 3, 4, LinkType::FinishToStart),
    ];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    let t2 = by_id(&scheduled, 2);
    assert_eq!(t2.late_start, Some(d(2025, 1, 8)));
    assert_eq!(t2.total_float, Some(0));
    assert_eq!(t2.is_critical, Some(true));

    let t3 = by_id(&scheduled, 3);
    assert_eq!(t3.early_start, Some(d(2025, 1, 8)));
    assert_eq!(t3.late_start, Some(d(2025, 1, 10)));
    assert_eq!(t3.total_float, Some(2));
    assert_eq!(t3.free_float, Some(2));
    assert_eq!(t3.is_critical, Some(false));

    let t4 = by_id(&scheduled, 4);
    assert_eq!(t4.early_start, Some(d(2025, 1, 13)));
    assert_eq!(t4.early_finish, Some(d(2025, 1, 14)));
}

#[test]
fn forward_backward_consistency_and_float_identity() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![
        Task::new(1, "T1", 2),
        Task::new(2, "T2", 5),
        Task::new(3, "T3", 1),
        Task::new(4, "T4", 3),
        Task::new(5, "T5", 2),
    ];
    let links = vec![
        Link::new(1, 1, 2, LinkType::FinishToStart),
        Link::new(2, 1, 3, LinkType::StartToStart).with_lag(1),
        Link::new(3, 2, 5, LinkType::FinishToStart),
        Link::new(4, 3, 4, LinkType::FinishToStart).with_lag(2),
        Link::new(5, 4, 5, LinkType::FinishToFinish),
    ];

    let calendar = calendars.default_calendar();
    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    for task in &scheduled {
        let es = task.early_start.unwrap();
        let ef = task.early_finish.unwrap();
        let ls = task.late_start.unwrap();
        let lf = task.late_finish.unwrap();
        assert!(es <= ls, "task {}", task.id);
        assert!(ef <= lf, "task {}", task.id);
        assert_eq!(
            task.total_float.unwrap(),
            calendar.working_days_between(es, ls),
            "task {}",
            task.id
        );
        assert!(task.total_float.unwrap() >= 0);
        assert!(task.free_float.unwrap() >= 0);
        assert!(task.free_float.unwrap() <= task.total_float.unwrap());
    }
}

#[test]
fn scheduling_is_idempotent() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let (tasks, links) = fs_chain();
    let scheduler = Scheduler::new(&calendars, &metadata);

    let first = scheduler.schedule(&tasks, &links).unwrap();
    let second = scheduler.schedule(&tasks, &links).unwrap();
    assert_eq!(first, second);

    // Re-scheduling the annotated output is stable too.
    let third = scheduler.schedule(&first, &links).unwrap();
    assert_eq!(first, third);
}

#[test]
fn critical_path_has_no_gaps_across_fs_links() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let (tasks, links) = fs_chain();
    let calendar = calendars.default_calendar();

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    for link in &links {
        let pred = by_id(&scheduled, link.predecessor_id);
        let succ = by_id(&scheduled, link.successor_id);
        if pred.is_critical == Some(true) && succ.is_critical == Some(true) && link.lag_days == 0 {
            let next = calendar
                .add_working_days(pred.early_finish.unwrap(), 1)
                .unwrap();
            assert_eq!(succ.early_start.unwrap(), next);
        }
    }
}

#[test]
fn cycle_aborts_scheduling_and_names_the_loop() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 1), Task::new(2, "B", 1), Task::new(3, "C", 1)];
    let links = vec![
        Link::new(1, 1, 2, LinkType::FinishToStart),
        Link::new(2, 2, 3, LinkType::FinishToStart),
        Link::new(3, 3, 1, LinkType::FinishToStart),
    ];

    let err = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap_err();
    let ScheduleError::CircularDependency(cycles) = err else {
        panic!("expected a circular dependency error");
    };
    assert_eq!(cycles.len(), 1);
    let cycle = &cycles[0];
    assert_eq!(cycle.len(), 4);
    assert_eq!(cycle.first(), cycle.last());
    let mut members = cycle[..3].to_vec();
    members.sort_unstable();
    assert_eq!(members, vec![1, 2, 3]);

    // Inputs are untouched on failure.
    for task in &tasks {
        assert_eq!(task.early_start, None);
        assert_eq!(task.late_finish, None);
    }
}

#[test]
fn validation_failures_are_collected_before_any_scheduling() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 0)];
    let links = vec![
        Link::new(1, 1, 9, LinkType::FinishToStart),
        Link::new(2, 1, 1, LinkType::FinishToStart),
    ];

    let err = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap_err();
    let ScheduleError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.contains(&ValidationError::NonPositiveDuration {
        task_id: 1,
        duration_days: 0
    }));
    assert!(errors.contains(&ValidationError::UnknownSuccessor { link_id: 1, task_id: 9 }));
    assert!(errors.contains(&ValidationError::SelfReference { link_id: 2, task_id: 1 }));
}

#[test]
fn working_exception_on_a_holiday_keeps_the_chain_tight() {
    let mut calendar = WorkCalendar::default();
    let wednesday = d(2025, 1, 8);
    calendar.add_holiday(wednesday);
    calendar.add_exception(CalendarException::working(wednesday, "deadline push", None));
    let calendars = CalendarSet::new(calendar);
    let metadata = metadata_from(d(2025, 1, 6));
    let (tasks, links) = fs_chain();

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    // The exception overrides the holiday, so the schedule matches the
    // no-holiday baseline.
    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 8)));
    assert_eq!(by_id(&scheduled, 3).early_start, Some(d(2025, 1, 13)));
}

#[test]
fn holiday_mid_chain_pushes_successors_out() {
    let mut calendar = WorkCalendar::default();
    calendar.add_holiday(d(2025, 1, 8));
    let calendars = CalendarSet::new(calendar);
    let metadata = metadata_from(d(2025, 1, 6));
    let (tasks, links) = fs_chain();

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 9)));
    assert_eq!(by_id(&scheduled, 2).early_finish, Some(d(2025, 1, 13)));
    assert_eq!(by_id(&scheduled, 3).early_start, Some(d(2025, 1, 14)));
}

#[test]
fn per_task_calendar_override_governs_that_task_only() {
    let mut site_b = WorkCalendar::default();
    site_b.add_holiday(d(2025, 1, 7));
    let calendars = CalendarSet::new(WorkCalendar::default()).with_override("site-b", site_b);
    let metadata = metadata_from(d(2025, 1, 6));

    let tasks = vec![
        Task::new(1, "A", 2).with_calendar("site-b"),
        Task::new(2, "B", 1),
    ];
    let links = vec![Link::new(1, 1, 2, LinkType::FinishToStart)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    // A skips its Tuesday holiday and finishes Wednesday; B follows Thursday
    // on the project calendar.
    assert_eq!(by_id(&scheduled, 1).early_finish, Some(d(2025, 1, 8)));
    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 9)));
}

#[test]
fn explicit_start_acts_as_start_no_earlier_than() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![
        Task::new(1, "A", 1),
        Task::new(2, "B", 1).with_start(d(2025, 1, 10)),
    ];
    let links = vec![Link::new(1, 1, 2, LinkType::FinishToStart)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &links)
        .unwrap();

    assert_eq!(by_id(&scheduled, 2).early_start, Some(d(2025, 1, 10)));
}

#[test]
fn start_on_a_weekend_snaps_forward() {
    let calendars = CalendarSet::default();
    let metadata = metadata_from(d(2025, 1, 4)); // Saturday
    let tasks = vec![Task::new(1, "A", 1)];

    let scheduled = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &[])
        .unwrap();
    assert_eq!(by_id(&scheduled, 1).early_start, Some(d(2025, 1, 6)));
}

#[test]
fn dead_calendar_is_a_configuration_error() {
    let calendars = CalendarSet::new(WorkCalendar::custom([], []));
    let metadata = metadata_from(d(2025, 1, 6));
    let tasks = vec![Task::new(1, "A", 1)];

    let err = Scheduler::new(&calendars, &metadata)
        .schedule(&tasks, &[])
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Calendar(_)));
}
