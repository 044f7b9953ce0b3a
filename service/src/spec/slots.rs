//! Scenarios of listing available slots.

use std::time::Duration;

use time::{
    macros::{date, datetime, time},
    Date, Time,
};

use crate::{
    command::{CancelSession, Command as _, ScheduleSession},
    domain::{
        session::{self, Reason},
        Interval,
    },
    infra::Memory,
    query::{available_slots, AvailableSlots, Query as _},
    Service,
};

use super::{at, clock, holiday, interval, service, Class};

const NOW: time::OffsetDateTime = datetime!(2024-06-07 12:00 UTC);

fn slots_query(class: &Class, date: Date) -> AvailableSlots {
    AvailableSlots {
        actor: class.student.clone(),
        program: class.program,
        subject_id: class.subject_id,
        date: date.into(),
        duration: None,
    }
}

async fn slots(svc: &Service<Memory>, class: &Class, date: Date) -> Vec<Interval> {
    svc.execute(slots_query(class, date)).await.unwrap()
}

fn starts(slots: &[Interval]) -> Vec<Time> {
    slots
        .iter()
        .map(|s| time::OffsetDateTime::from(s.start()).time())
        .collect()
}

#[tokio::test]
async fn splits_free_weekday() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let slots = slots(&svc, &class, date!(2024-06-10)).await;

    assert_eq!(
        starts(&slots),
        [
            time!(09:00),
            time!(10:15),
            time!(11:30),
            time!(12:45),
            time!(14:00),
            time!(15:15),
            time!(16:30),
            time!(17:45),
            time!(19:00),
        ],
    );
    for slot in &slots {
        assert_eq!(slot.duration(), Duration::from_secs(75 * 60));
        assert!(slot.end() <= at(datetime!(2024-06-10 21:00 UTC)));
    }
}

#[tokio::test]
async fn skips_busy_time() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let busy = interval(
        datetime!(2024-06-10 10:00 UTC),
        datetime!(2024-06-10 11:15 UTC),
    );
    drop(
        svc.execute(ScheduleSession {
            actor: class.teacher.clone(),
            title: session::Title::default(),
            description: None,
            interval: busy,
            program: class.program,
            student_id: Some(class.student.id),
            subject_id: Some(class.subject_id),
            teacher_id: None,
        })
        .await
        .unwrap(),
    );

    let slots = slots(&svc, &class, date!(2024-06-10)).await;

    assert!(slots.iter().all(|s| !s.overlaps(&busy)));
    assert_eq!(starts(&slots).first(), Some(&time!(11:15)));
}

#[tokio::test]
async fn cancelled_sessions_do_not_block() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = svc
        .execute(ScheduleSession {
            actor: class.teacher.clone(),
            title: session::Title::default(),
            description: None,
            interval: interval(
                datetime!(2024-06-10 09:00 UTC),
                datetime!(2024-06-10 10:15 UTC),
            ),
            program: class.program,
            student_id: Some(class.student.id),
            subject_id: Some(class.subject_id),
            teacher_id: None,
        })
        .await
        .unwrap();
    drop(
        svc.execute(CancelSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            reason: Reason::new("teacher has to travel").unwrap(),
        })
        .await
        .unwrap(),
    );

    let slots = slots(&svc, &class, date!(2024-06-10)).await;

    assert_eq!(starts(&slots).first(), Some(&time!(09:00)));
}

#[tokio::test]
async fn closed_days_have_no_slots() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    holiday(&svc, date!(2024-06-12)).await;

    assert!(slots(&svc, &class, date!(2024-06-09)).await.is_empty());
    assert!(slots(&svc, &class, date!(2024-06-12)).await.is_empty());
}

#[tokio::test]
async fn saturday_slots_fit_opening_hours() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let slots = slots(&svc, &class, date!(2024-06-15)).await;

    assert!(!slots.is_empty());
    for slot in &slots {
        assert!(slot.start() >= at(datetime!(2024-06-15 09:00 UTC)));
        assert!(slot.end() <= at(datetime!(2024-06-15 16:00 UTC)));
    }
}

#[tokio::test]
async fn listing_is_idempotent() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let first = slots(&svc, &class, date!(2024-06-14)).await;
    let second = slots(&svc, &class, date!(2024-06-14)).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn honors_requested_duration() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let slots = svc
        .execute(AvailableSlots {
            duration: Some(Duration::from_secs(2 * 60 * 60)),
            ..slots_query(&class, date!(2024-06-15))
        })
        .await
        .unwrap();

    assert_eq!(
        starts(&slots),
        [time!(09:00), time!(11:00), time!(13:00)],
    );
}

#[tokio::test]
async fn refuses_invalid_duration() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    for duration in [Duration::ZERO, Duration::from_secs(60)] {
        let err = svc
            .execute(AvailableSlots {
                duration: Some(duration),
                ..slots_query(&class, date!(2024-06-10))
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            available_slots::ExecutionError::InvalidDuration(_),
        ));
    }
}

#[tokio::test]
async fn strangers_cannot_look() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let stranger = Class::enroll(&svc).await;

    let err = svc
        .execute(AvailableSlots {
            actor: stranger.student,
            ..slots_query(&class, date!(2024-06-10))
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        available_slots::ExecutionError::Forbidden(_),
    ));
}
