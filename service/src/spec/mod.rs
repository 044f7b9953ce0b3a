//! Fixtures of [`Service`] scenarios.

mod booking;
mod lifecycle;
mod slots;

use std::sync::{Arc, Mutex, PoisonError};

use common::{
    operations::{Insert, Notify},
    Clock, DateTime,
};
use time::OffsetDateTime;

use crate::{
    domain::{
        enrollment::{self, Assignment},
        program, session, subject,
        user::{self, Actor, Role},
        Enrollment, Holiday, Interval, Program,
    },
    infra::{notifier, Database as _, Memory, Notifier},
    Config, Service,
};

/// Secret the access tokens are signed with.
pub(crate) const JWT_SECRET: &[u8] = b"secret";

/// Returns [`Config`] with the default calendar policy.
pub(crate) fn config() -> Config {
    Config {
        jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(JWT_SECRET),
        calendar: Default::default(),
        meeting_base_url: session::MeetingLink::new("https://meet.jit.si")
            .unwrap(),
        advance_sessions: Default::default(),
    }
}

/// Creates a new [`Service`] over an empty [`Memory`] database.
pub(crate) fn service(clock: Clock) -> Service<Memory> {
    service_with(clock, notifier::Log)
}

/// Creates a new [`Service`] over an empty [`Memory`] database, notifying
/// with the provided [`Notifier`].
pub(crate) fn service_with<Nt>(clock: Clock, notifier: Nt) -> Service<Memory, Nt>
where
    Nt: Clone + 'static,
{
    // Background task is dropped, so sessions are advanced manually only.
    let (svc, _) = Service::new(config(), Memory::new(), notifier, clock);
    svc
}

/// Converts the provided [`OffsetDateTime`] into a [`DateTime`].
pub(crate) fn at(dt: OffsetDateTime) -> DateTime {
    dt.try_into().unwrap()
}

/// Creates a new [`Clock`] fixed at the provided moment.
pub(crate) fn clock(dt: OffsetDateTime) -> Clock {
    Clock::fixed(at(dt))
}

/// Creates a new [`Interval`] out of the provided bounds.
pub(crate) fn interval(start: OffsetDateTime, end: OffsetDateTime) -> Interval {
    Interval::new(at(start), at(end)).unwrap()
}

/// Student enrolled into a one-to-one [`Program`] with a teacher assigned to
/// its single subject.
#[derive(Clone, Debug)]
pub(crate) struct Class {
    pub(crate) teacher: Actor,
    pub(crate) student: Actor,
    pub(crate) program: Program,
    pub(crate) subject_id: subject::Id,
}

impl Class {
    /// Enrolls a new student to be taught by a new teacher.
    pub(crate) async fn enroll<Nt>(svc: &Service<Memory, Nt>) -> Self {
        let teacher = Actor::new(user::Id::new(), [Role::Teacher]);
        Self::enroll_with(svc, teacher).await
    }

    /// Enrolls a new student to be taught by the provided teacher.
    pub(crate) async fn enroll_with<Nt>(
        svc: &Service<Memory, Nt>,
        teacher: Actor,
    ) -> Self {
        let student = Actor::new(user::Id::new(), [Role::Student]);
        let program = Program::FocusOne(program::Id::new());
        let subject_id = subject::Id::new();

        svc.database()
            .execute(Insert(Enrollment {
                id: enrollment::Id::new(),
                student_id: student.id,
                program,
                assignments: vec![Assignment {
                    subject_id,
                    teacher_id: teacher.id,
                }],
                created_at: svc.clock().now(),
                ended_at: None,
            }))
            .await
            .unwrap();

        Self {
            teacher,
            student,
            program,
            subject_id,
        }
    }
}

/// Creates a new privileged [`Actor`].
pub(crate) fn admin() -> Actor {
    Actor::new(user::Id::new(), [Role::Admin])
}

/// Marks the provided day as a [`Holiday`].
pub(crate) async fn holiday<Nt>(svc: &Service<Memory, Nt>, date: time::Date) {
    svc.database()
        .execute(Insert(Holiday {
            date: date.into(),
            name: "Holiday".into(),
        }))
        .await
        .unwrap();
}

/// [`Notifier`] remembering names of the [`session::Event`]s it's notified
/// about.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<&'static str>>>);

impl Recorder {
    /// Returns names of the recorded [`session::Event`]s, oldest first.
    pub(crate) fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier<Notify<session::Event>> for Recorder {
    type Ok = ();
    type Err = String;

    async fn execute(
        &self,
        Notify(event): Notify<session::Event>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.name());
        Ok(())
    }
}

/// [`Notifier`] always failing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Broken;

impl Notifier<Notify<session::Event>> for Broken {
    type Ok = ();
    type Err = String;

    async fn execute(
        &self,
        _: Notify<session::Event>,
    ) -> Result<Self::Ok, Self::Err> {
        Err("mail server is down".into())
    }
}
