//! Scenarios of [`Session`]s moving through their lifecycle.
//!
//! [`Session`]: crate::domain::Session

use std::fmt::Display;

use common::operations::Notify;
use time::macros::{date, datetime};

use crate::{
    command::{
        accept_session, cancel_session, delete_session, reject_session,
        reschedule_session, restore_session, AcceptSession, CancelSession,
        Command as _, DeleteSession, RejectSession, RequestSession,
        RescheduleSession, RestoreSession, ScheduleSession,
    },
    domain::{
        calendar::Violation,
        session::{self, Reason, Status},
        Interval, Session,
    },
    infra::{Memory, Notifier},
    query::{self, Query as _},
    Service,
};

use super::{
    admin, clock, holiday, interval, service, service_with, Class, Recorder,
};

const NOW: time::OffsetDateTime = datetime!(2024-06-07 12:00 UTC);

fn reason() -> Reason {
    Reason::new("the student is sick today").unwrap()
}

fn monday(from: (u8, u8), to: (u8, u8)) -> Interval {
    let day = date!(2024-06-10);
    interval(
        day.with_hms(from.0, from.1, 0).unwrap().assume_utc(),
        day.with_hms(to.0, to.1, 0).unwrap().assume_utc(),
    )
}

async fn requested<Nt>(svc: &Service<Memory, Nt>, class: &Class) -> Session
where
    Nt: Notifier<Notify<session::Event>, Err: Display>,
{
    svc.execute(RequestSession {
        actor: class.student.clone(),
        title: None,
        description: None,
        interval: monday((10, 0), (11, 15)),
        program: class.program,
        subject_id: class.subject_id,
    })
    .await
    .unwrap()
}

async fn scheduled(
    svc: &Service<Memory>,
    class: &Class,
    interval: Interval,
) -> Session {
    svc.execute(ScheduleSession {
        actor: class.teacher.clone(),
        title: session::Title::default(),
        description: None,
        interval,
        program: class.program,
        student_id: Some(class.student.id),
        subject_id: Some(class.subject_id),
        teacher_id: None,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn teacher_accepts_request() {
    let recorder = Recorder::default();
    let svc = service_with(clock(NOW), recorder.clone());
    let class = Class::enroll(&svc).await;
    let session = requested(&svc, &class).await;

    let accepted = svc
        .execute(AcceptSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            meeting_link: None,
            meeting_platform: None,
        })
        .await
        .unwrap();

    assert_eq!(accepted.status, Status::Scheduled);
    assert_eq!(accepted.accepted_by, Some(class.teacher.id));
    assert!(accepted.meeting.is_some());
    assert_eq!(recorder.events(), ["requested", "accepted"]);

    let again = svc
        .execute(AcceptSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            meeting_link: None,
            meeting_platform: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        again.as_ref(),
        accept_session::ExecutionError::Transition(_),
    ));
}

#[tokio::test]
async fn only_assigned_teacher_accepts() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let other = Class::enroll(&svc).await;
    let session = requested(&svc, &class).await;

    for actor in [other.teacher, class.student.clone(), admin()] {
        let err = svc
            .execute(AcceptSession {
                actor,
                session_id: session.id,
                meeting_link: None,
                meeting_platform: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            accept_session::ExecutionError::Forbidden(_),
        ));
    }
}

#[tokio::test]
async fn accept_revalidates_calendar() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = requested(&svc, &class).await;
    holiday(&svc, date!(2024-06-10)).await;

    let err = svc
        .execute(AcceptSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            meeting_link: None,
            meeting_platform: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        accept_session::ExecutionError::Calendar(Violation::Holiday(_)),
    ));
}

#[tokio::test]
async fn teacher_rejects_request() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = requested(&svc, &class).await;

    let rejected = svc
        .execute(RejectSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap();

    assert_eq!(rejected.status, Status::Rejected);
    let rejection = rejected.rejection.unwrap();
    assert_eq!(rejection.by, class.teacher.id);
    assert_eq!(rejection.reason, reason());
}

#[tokio::test]
async fn scheduled_session_cannot_be_rejected() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;

    let err = svc
        .execute(RejectSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        reject_session::ExecutionError::Transition(_),
    ));
}

#[test]
fn cancellation_requires_meaningful_reason() {
    assert!(Reason::new("short").is_none());
    assert!(Reason::new("ten chars!").is_some());
}

#[tokio::test]
async fn cancelled_session_frees_time() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;

    let cancelled = svc
        .execute(CancelSession {
            actor: class.student.clone(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status, Status::Cancelled);
    assert_eq!(cancelled.cancellation.unwrap().by, class.student.id);

    let again = svc
        .execute(CancelSession {
            actor: admin(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        again.as_ref(),
        cancel_session::ExecutionError::Transition(_),
    ));

    let rebooked = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;
    assert_eq!(rebooked.status, Status::Scheduled);
}

#[tokio::test]
async fn reschedules_session() {
    let recorder = Recorder::default();
    let svc = service_with(clock(NOW), recorder.clone());
    let class = Class::enroll(&svc).await;
    let session = requested(&svc, &class).await;
    let previous = session.interval;

    let moved = svc
        .execute(RescheduleSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            // Overlapping its own old time is fine.
            interval: monday((10, 30), (11, 45)),
        })
        .await
        .unwrap();

    assert_eq!(moved.status, Status::Requested);
    assert_eq!(moved.interval, monday((10, 30), (11, 45)));
    assert_eq!(moved.reschedules.len(), 1);
    assert_eq!(moved.reschedules[0].previous, previous);
    assert_eq!(moved.reschedules[0].by, class.teacher.id);
    assert_eq!(recorder.events(), ["requested", "rescheduled"]);
}

#[tokio::test]
async fn reschedule_is_checked() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;
    let other = scheduled(&svc, &class, monday((14, 0), (15, 15))).await;

    let conflict = svc
        .execute(RescheduleSession {
            actor: class.student.clone(),
            session_id: session.id,
            interval: monday((13, 30), (14, 45)),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        conflict.as_ref(),
        reschedule_session::ExecutionError::Conflict(id) if *id == other.id,
    ));

    let closed = svc
        .execute(RescheduleSession {
            actor: class.student.clone(),
            session_id: session.id,
            interval: interval(
                datetime!(2024-06-09 10:00 UTC),
                datetime!(2024-06-09 11:15 UTC),
            ),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        closed.as_ref(),
        reschedule_session::ExecutionError::Calendar(Violation::Closed(_)),
    ));

    let by_admin = svc
        .execute(RescheduleSession {
            actor: admin(),
            session_id: session.id,
            interval: monday((16, 0), (17, 15)),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        by_admin.as_ref(),
        reschedule_session::ExecutionError::Forbidden(_),
    ));

    drop(
        svc.execute(CancelSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap(),
    );
    let cancelled = svc
        .execute(RescheduleSession {
            actor: class.student.clone(),
            session_id: session.id,
            interval: monday((16, 0), (17, 15)),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cancelled.as_ref(),
        reschedule_session::ExecutionError::Transition(_),
    ));
}

#[tokio::test]
async fn deletes_and_restores_session() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;
    let admin = admin();

    let forbidden = svc
        .execute(DeleteSession {
            actor: class.teacher.clone(),
            session_id: session.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        forbidden.as_ref(),
        delete_session::ExecutionError::Forbidden(_),
    ));

    let deleted = svc
        .execute(DeleteSession {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap();
    assert!(deleted.is_deleted());
    assert_eq!(deleted.status, Status::Scheduled);

    let twice = svc
        .execute(DeleteSession {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        twice.as_ref(),
        delete_session::ExecutionError::AlreadyDeleted(_),
    ));

    let hidden = svc
        .execute(query::session::ById {
            actor: class.teacher.clone(),
            session_id: session.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        hidden.as_ref(),
        query::session::ExecutionError::SessionNotExists(_),
    ));
    let audited = svc
        .execute(query::session::ById {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap();
    assert!(audited.is_deleted());

    let restored = svc
        .execute(RestoreSession {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap();
    assert!(!restored.is_deleted());
    assert_eq!(restored.status, Status::Scheduled);

    let not_deleted = svc
        .execute(RestoreSession {
            actor: admin,
            session_id: session.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        not_deleted.as_ref(),
        restore_session::ExecutionError::NotDeleted(_),
    ));
}

#[tokio::test]
async fn restore_detects_conflicts() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let admin = admin();
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;

    drop(
        svc.execute(DeleteSession {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap(),
    );
    let replacement =
        scheduled(&svc, &class, monday((10, 30), (11, 45))).await;

    let err = svc
        .execute(RestoreSession {
            actor: admin,
            session_id: session.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        restore_session::ExecutionError::Conflict(id) if *id == replacement.id,
    ));
}

#[tokio::test]
async fn restores_cancelled_session_over_replacement() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let admin = admin();
    let session = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;

    drop(
        svc.execute(CancelSession {
            actor: class.teacher.clone(),
            session_id: session.id,
            reason: reason(),
        })
        .await
        .unwrap(),
    );
    drop(
        svc.execute(DeleteSession {
            actor: admin.clone(),
            session_id: session.id,
        })
        .await
        .unwrap(),
    );
    drop(scheduled(&svc, &class, monday((10, 30), (11, 45))).await);

    let restored = svc
        .execute(RestoreSession {
            actor: admin,
            session_id: session.id,
        })
        .await
        .unwrap();
    assert!(!restored.is_deleted());
    assert_eq!(restored.status, Status::Cancelled);
}

#[tokio::test]
async fn agenda_lists_own_sessions_of_day() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let other = Class::enroll(&svc).await;
    let late = scheduled(&svc, &class, monday((14, 0), (15, 15))).await;
    let early = scheduled(&svc, &class, monday((10, 0), (11, 15))).await;
    drop(scheduled(&svc, &other, monday((10, 0), (11, 15))).await);

    let agenda = svc
        .execute(query::session::Agenda {
            actor: class.student.clone(),
            date: date!(2024-06-10).into(),
        })
        .await
        .unwrap();

    assert_eq!(
        agenda.iter().map(|s| s.id).collect::<Vec<_>>(),
        [early.id, late.id],
    );

    let next_day = svc
        .execute(query::session::Agenda {
            actor: class.teacher.clone(),
            date: date!(2024-06-11).into(),
        })
        .await
        .unwrap();
    assert!(next_day.is_empty());
}
