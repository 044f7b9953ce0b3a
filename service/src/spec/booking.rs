//! Scenarios of booking new [`Session`]s.
//!
//! [`Session`]: crate::domain::Session

use time::macros::{date, datetime};

use crate::{
    command::{
        request_session, schedule_session, Command as _, RequestSession,
        ScheduleSession,
    },
    domain::{
        calendar::Violation,
        session::{self, Status},
        subject, Interval, Program,
    },
    query::{self, Query as _},
};

use super::{
    admin, clock, holiday, interval, service, service_with, Broken, Class,
    Recorder,
};

/// Friday, three days before the Monday most scenarios happen on.
const NOW: time::OffsetDateTime = datetime!(2024-06-07 12:00 UTC);

fn request(class: &Class, interval: Interval) -> RequestSession {
    RequestSession {
        actor: class.student.clone(),
        title: None,
        description: None,
        interval,
        program: class.program,
        subject_id: class.subject_id,
    }
}

fn schedule(class: &Class, interval: Interval) -> ScheduleSession {
    ScheduleSession {
        actor: class.teacher.clone(),
        title: session::Title::default(),
        description: None,
        interval,
        program: class.program,
        student_id: Some(class.student.id),
        subject_id: Some(class.subject_id),
        teacher_id: None,
    }
}

#[tokio::test]
async fn student_requests_session() {
    let recorder = Recorder::default();
    let svc = service_with(clock(NOW), recorder.clone());
    let class = Class::enroll(&svc).await;

    let session = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
        ))
        .await
        .unwrap();

    assert_eq!(session.status, Status::Requested);
    assert_eq!(session.teacher_id, class.teacher.id);
    assert_eq!(session.student_id, class.student.id);
    assert_eq!(session.requested_by, Some(class.student.id));
    assert_eq!(session.program, Some(class.program));
    assert!(session.meeting.is_none());
    assert_eq!(recorder.events(), ["requested"]);

    let stored = svc
        .execute(query::session::ById {
            actor: class.teacher.clone(),
            session_id: session.id,
        })
        .await
        .unwrap();
    assert_eq!(stored.status, Status::Requested);
}

#[tokio::test]
async fn refuses_same_day_request() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let err = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-07 14:00 UTC),
                datetime!(2024-06-07 15:15 UTC),
            ),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        request_session::ExecutionError::BookingWindow(Violation::TooSoon(1)),
    ));
}

#[tokio::test]
async fn refuses_request_too_far_ahead() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;

    let err = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-19 10:00 UTC),
                datetime!(2024-06-19 11:15 UTC),
            ),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        request_session::ExecutionError::BookingWindow(Violation::TooFar),
    ));
}

#[tokio::test]
async fn refuses_request_on_closed_days() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    holiday(&svc, date!(2024-06-11)).await;

    let sunday = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-09 10:00 UTC),
                datetime!(2024-06-09 11:15 UTC),
            ),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        sunday.as_ref(),
        request_session::ExecutionError::Calendar(Violation::Closed(_)),
    ));

    let holiday = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-11 10:00 UTC),
                datetime!(2024-06-11 11:15 UTC),
            ),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        holiday.as_ref(),
        request_session::ExecutionError::Calendar(Violation::Holiday(_)),
    ));
}

#[tokio::test]
async fn refuses_request_outside_enrollment() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let slot = interval(
        datetime!(2024-06-10 10:00 UTC),
        datetime!(2024-06-10 11:15 UTC),
    );

    let other_program = svc
        .execute(RequestSession {
            program: Program::FocusOne(Default::default()),
            ..request(&class, slot)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        other_program.as_ref(),
        request_session::ExecutionError::EnrollmentMismatch(_),
    ));

    let other_subject = svc
        .execute(RequestSession {
            subject_id: subject::Id::new(),
            ..request(&class, slot)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        other_subject.as_ref(),
        request_session::ExecutionError::SubjectNotAssigned(_),
    ));

    let by_teacher = svc
        .execute(RequestSession {
            actor: class.teacher.clone(),
            ..request(&class, slot)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        by_teacher.as_ref(),
        request_session::ExecutionError::Forbidden(_),
    ));
}

#[tokio::test]
async fn teacher_schedules_session_directly() {
    let recorder = Recorder::default();
    let svc = service_with(clock(NOW), recorder.clone());
    let class = Class::enroll(&svc).await;

    // Booking window doesn't apply to direct scheduling.
    let session = svc
        .execute(schedule(
            &class,
            interval(
                datetime!(2024-06-07 14:00 UTC),
                datetime!(2024-06-07 15:15 UTC),
            ),
        ))
        .await
        .unwrap();

    assert_eq!(session.status, Status::Scheduled);
    assert_eq!(session.teacher_id, class.teacher.id);
    assert_eq!(session.requested_by, Some(class.teacher.id));
    let meeting = session.meeting.unwrap();
    assert!(AsRef::<str>::as_ref(&meeting.link)
        .starts_with("https://meet.jit.si/"));
    assert_eq!(recorder.events(), ["scheduled"]);
}

#[tokio::test]
async fn only_teacher_or_admin_schedules_directly() {
    let svc = service(clock(NOW));
    let class = Class::enroll(&svc).await;
    let slot = interval(
        datetime!(2024-06-10 10:00 UTC),
        datetime!(2024-06-10 11:15 UTC),
    );

    let err = svc
        .execute(ScheduleSession {
            actor: class.student.clone(),
            ..schedule(&class, slot)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        schedule_session::ExecutionError::Forbidden(_),
    ));

    let session = svc
        .execute(ScheduleSession {
            actor: admin(),
            student_id: None,
            ..schedule(&class, slot)
        })
        .await
        .unwrap();
    assert_eq!(session.student_id, class.student.id);
    assert_eq!(session.teacher_id, class.teacher.id);
}

#[tokio::test]
async fn detects_conflicting_sessions() {
    let svc = service(clock(NOW));
    let first = Class::enroll(&svc).await;
    let second = Class::enroll_with(&svc, first.teacher.clone()).await;

    let existing = svc
        .execute(schedule(
            &first,
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
        ))
        .await
        .unwrap();

    let err = svc
        .execute(request(
            &second,
            interval(
                datetime!(2024-06-10 10:30 UTC),
                datetime!(2024-06-10 11:45 UTC),
            ),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        request_session::ExecutionError::Conflict(id) if *id == existing.id,
    ));

    // Touching endpoints don't conflict.
    let touching = svc
        .execute(request(
            &second,
            interval(
                datetime!(2024-06-10 11:15 UTC),
                datetime!(2024-06-10 12:30 UTC),
            ),
        ))
        .await;
    assert!(touching.is_ok());

    // Student's own time is guarded too.
    let err = svc
        .execute(request(
            &first,
            interval(
                datetime!(2024-06-10 11:00 UTC),
                datetime!(2024-06-10 12:15 UTC),
            ),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        request_session::ExecutionError::Conflict(_),
    ));
}

#[tokio::test]
async fn concurrent_requests_book_only_one_session() {
    let svc = service(clock(NOW));
    let first = Class::enroll(&svc).await;
    let second = Class::enroll_with(&svc, first.teacher.clone()).await;
    let slot = interval(
        datetime!(2024-06-10 10:00 UTC),
        datetime!(2024-06-10 11:15 UTC),
    );

    let (a, b) = tokio::join!(
        svc.execute(request(&first, slot)),
        svc.execute(request(&second, slot)),
    );

    let (booked, failed) = match (a, b) {
        (Ok(s), Err(e)) | (Err(e), Ok(s)) => (s, e),
        (a, b) => panic!("exactly one must succeed: {a:?}, {b:?}"),
    };
    assert_eq!(booked.teacher_id, first.teacher.id);
    assert!(matches!(
        failed.as_ref(),
        request_session::ExecutionError::Conflict(_)
            | request_session::ExecutionError::Overlap,
    ));
}

#[tokio::test]
async fn notification_failure_keeps_booking() {
    let svc = service_with(clock(NOW), Broken);
    let class = Class::enroll(&svc).await;

    let session = svc
        .execute(request(
            &class,
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
        ))
        .await
        .unwrap();

    let stored = svc
        .execute(query::session::ById {
            actor: class.student.clone(),
            session_id: session.id,
        })
        .await
        .unwrap();
    assert_eq!(stored.status, Status::Requested);
}
