//! Tests for estimates and cumulative time logging.

use super::{FixedClock, at};
use crate::task::domain::{
    NewTask, TaskDomainError, TaskPriority, TaskRecord, TaskStatus, TimeLogEntry, TimeLogParams,
    TimeTracking, UserId,
};
use rstest::{fixture, rstest};

#[fixture]
fn carol() -> UserId {
    UserId::new("carol").expect("valid user")
}

fn entry(minutes: i64, logged_by: &UserId) -> TimeLogEntry {
    TimeLogEntry::new(TimeLogParams {
        duration_minutes: minutes,
        description: format!("{minutes} minutes of work"),
        started_at: at(2024, 1, 1),
        ended_at: at(2024, 1, 2),
        logged_by: logged_by.clone(),
    })
    .expect("valid log entry")
}

#[rstest]
fn initialize_starts_with_full_remaining() {
    let tracking = TimeTracking::initialize(90);

    assert_eq!(tracking.estimated_minutes(), 90);
    assert_eq!(tracking.spent_minutes(), 0);
    assert_eq!(tracking.remaining_minutes(), 90);
    assert!(tracking.logs().is_empty());
}

#[rstest]
fn overrun_floors_remaining_at_zero(carol: UserId) {
    let mut tracking = TimeTracking::initialize(10);

    tracking.log(entry(4, &carol));
    tracking.log(entry(8, &carol));

    assert_eq!(tracking.spent_minutes(), 12);
    assert_eq!(tracking.remaining_minutes(), 0);
    assert!(tracking.is_over_estimate());
    assert_eq!(tracking.logs().len(), 2);
}

#[rstest]
#[case(&[5, 7, 11])]
#[case(&[0, 0, 30])]
#[case(&[120])]
fn logging_is_cumulative(carol: UserId, #[case] durations: &[i64]) {
    let mut split = TimeTracking::initialize(60);
    for minutes in durations {
        split.log(entry(*minutes, &carol));
    }
    let mut single = TimeTracking::initialize(60);
    single.log(entry(durations.iter().sum(), &carol));

    assert_eq!(split.spent_minutes(), single.spent_minutes());
    assert_eq!(split.remaining_minutes(), single.remaining_minutes());
}

#[rstest]
fn re_estimate_recomputes_remaining(carol: UserId) {
    let mut tracking = TimeTracking::initialize(30);
    tracking.log(entry(20, &carol));

    tracking.re_estimate(50);

    assert_eq!(tracking.remaining_minutes(), 30);
}

#[rstest]
fn from_persisted_sums_logged_minutes(carol: UserId) {
    let tracking =
        TimeTracking::from_persisted(25, vec![entry(10, &carol), entry(10, &carol)]);

    assert_eq!(tracking.spent_minutes(), 20);
    assert_eq!(tracking.remaining_minutes(), 5);
}

#[rstest]
fn negative_duration_is_rejected(carol: UserId) {
    let result = TimeLogEntry::new(TimeLogParams {
        duration_minutes: -5,
        description: "oops".to_owned(),
        started_at: at(2024, 1, 1),
        ended_at: at(2024, 1, 1),
        logged_by: carol,
    });
    assert_eq!(result, Err(TaskDomainError::NegativeDuration(-5)));
}

#[rstest]
fn interval_ending_before_start_is_rejected(carol: UserId) {
    let result = TimeLogEntry::new(TimeLogParams {
        duration_minutes: 5,
        description: "backwards".to_owned(),
        started_at: at(2024, 1, 2),
        ended_at: at(2024, 1, 1),
        logged_by: carol,
    });
    assert_eq!(result, Err(TaskDomainError::InvalidTimeRange));
}

#[rstest]
fn task_log_time_initialises_tracking_with_zero_estimate(carol: UserId) {
    let clock = FixedClock::new_year();
    let mut task = TaskRecord::new(
        NewTask {
            title: "Unplanned".to_owned(),
            description: None,
            status: TaskStatus::InProgress,
            priority: TaskPriority::Low,
            due_date: None,
            creator: carol.clone(),
            estimated_minutes: None,
        },
        &clock,
    )
    .expect("valid task");

    task.log_time(entry(15, &carol), &clock);

    let tracking = task.time_tracking().expect("tracking initialised");
    assert_eq!(tracking.estimated_minutes(), 0);
    assert_eq!(tracking.spent_minutes(), 15);
    assert_eq!(tracking.remaining_minutes(), 0);
    assert_eq!(
        task.history().latest().map(|history| history.action()),
        Some("time: logged 15m (spent 15m, remaining 0m)")
    );
}

#[rstest]
fn loading_recomputes_totals_from_logs(carol: UserId) {
    let mut tracking = TimeTracking::initialize(30);
    tracking.log(entry(20, &carol));
    let mut stored = serde_json::to_value(&tracking).expect("tracking serialises");
    stored["spent_minutes"] = 0.into();
    stored["remaining_minutes"] = 999.into();

    let loaded: TimeTracking = serde_json::from_value(stored).expect("tracking loads");

    assert_eq!(loaded, tracking);
    assert_eq!(loaded.remaining_minutes(), 10);
}

#[rstest]
fn loading_rejects_inverted_log_interval(carol: UserId) {
    let mut stored = serde_json::to_value(entry(5, &carol)).expect("entry serialises");
    stored["started_at"] = serde_json::to_value(at(2024, 1, 3)).expect("date serialises");

    let loaded = serde_json::from_value::<TimeLogEntry>(stored);

    assert!(loaded.is_err());
}
