//! [`Database`] implementations.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    Date,
};

use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    domain::{
        session::{self, Participant, Status},
        Enrollment, Holiday, Session,
    },
    infra::{database, Database},
    read,
};

use super::{Error, Memory, NonTx, Storage, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(&self.0).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await;
        Ok(())
    }
}

impl<C: Storage> Database<Lock<By<Session, Participant>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Session, Participant>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions already own the whole store.
        Ok(())
    }
}

impl<C: Storage> Database<Select<By<Option<Session>, session::Id>>>
    for Memory<C>
{
    type Ok = Option<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Session>, session::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.sessions.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Select<By<Vec<Session>, read::session::Busy>>>
    for Memory<C>
{
    type Ok = Vec<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Session>, read::session::Busy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::session::Busy {
            participants,
            period,
        } = by.into_inner();
        self.read(|s| {
            s.sessions
                .values()
                .filter(|s| {
                    s.is_active()
                        && s.interval.overlaps(&period)
                        && participants.iter().any(|p| s.involves(*p))
                })
                .cloned()
                .sorted_by_key(|s| s.interval.start())
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Select<By<Vec<Session>, read::session::Agenda>>>
    for Memory<C>
{
    type Ok = Vec<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Session>, read::session::Agenda>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::session::Agenda { user_id, period } = by.into_inner();
        self.read(|s| {
            s.sessions
                .values()
                .filter(|s| {
                    !s.is_deleted()
                        && s.interval.overlaps(&period)
                        && (s.teacher_id == user_id || s.student_id == user_id)
                })
                .cloned()
                .sorted_by_key(|s| s.interval.start())
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Select<By<Vec<Session>, read::session::Due>>>
    for Memory<C>
{
    type Ok = Vec<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Session>, read::session::Due>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::session::Due { now } = by.into_inner();
        self.read(|s| {
            s.sessions
                .values()
                .filter(|s| {
                    !s.is_deleted()
                        && match s.status {
                            Status::Requested
                            | Status::Accepted
                            | Status::Scheduled => s.interval.start() <= now,
                            Status::Ongoing => s.interval.end() <= now,
                            Status::Rejected
                            | Status::Completed
                            | Status::Cancelled => false,
                        }
                })
                .cloned()
                .sorted_by_key(|s| s.interval.start())
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Insert<Session>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if s.sessions.contains_key(&session.id) {
                return Err(Error::AlreadyExists);
            }
            s.put_session(session)
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Update<Session>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(session): Update<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.put_session(session))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Storage>
    Database<Select<By<Option<Enrollment>, read::enrollment::OfStudent>>>
    for Memory<C>
{
    type Ok = Option<Enrollment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Enrollment>, read::enrollment::OfStudent>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::enrollment::OfStudent(student_id) = by.into_inner();
        self.read(|s| {
            s.enrollments
                .values()
                .find(|e| e.is_active() && e.student_id == student_id)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage>
    Database<Select<By<Vec<Enrollment>, read::enrollment::InProgram>>>
    for Memory<C>
{
    type Ok = Vec<Enrollment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Enrollment>, read::enrollment::InProgram>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::enrollment::InProgram(program) = by.into_inner();
        self.read(|s| {
            s.enrollments
                .values()
                .filter(|e| e.is_active() && e.program == program)
                .cloned()
                .sorted_by_key(|e| e.created_at)
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Insert<Enrollment>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(enrollment): Insert<Enrollment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            let taken = s.enrollments.values().any(|e| {
                e.id == enrollment.id
                    || (e.is_active()
                        && enrollment.is_active()
                        && e.student_id == enrollment.student_id)
            });
            if taken {
                return Err(Error::AlreadyExists);
            }
            drop(s.enrollments.insert(enrollment.id, enrollment));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Select<By<Option<Holiday>, Date>>> for Memory<C> {
    type Ok = Option<Holiday>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Holiday>, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let date = by.into_inner();
        self.read(|s| s.holidays.get(&date).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Storage> Database<Insert<Holiday>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(holiday): Insert<Holiday>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            drop(s.holidays.insert(holiday.date, holiday));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Select, Transact, Update},
        DateTime,
    };
    use time::macros::datetime;

    use crate::{
        domain::{
            session::{
                self,
                spec::{interval, session},
                Status,
            },
            user, Session,
        },
        infra::{Database, Memory},
    };

    #[tokio::test]
    async fn refuses_overlapping_writes() {
        let db = Memory::new();
        let teacher = user::Id::new();
        let at = interval(
            datetime!(2024-06-10 10:00 UTC),
            datetime!(2024-06-10 11:15 UTC),
        );
        let first = session(teacher, user::Id::new(), at, Status::Scheduled);
        let second = session(teacher, user::Id::new(), at, Status::Requested);

        db.execute(Insert(first)).await.unwrap();
        let err = db.execute(Insert(second.clone())).await.unwrap_err();
        assert!(err.as_ref().is_overlap());

        let mut cancelled = second;
        cancelled.status = Status::Cancelled;
        db.execute(Insert(cancelled)).await.unwrap();
    }

    #[tokio::test]
    async fn discards_uncommitted_changes() {
        let db = Memory::new();
        let s = session(
            user::Id::new(),
            user::Id::new(),
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
            Status::Scheduled,
        );
        let id = s.id;

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(s.clone())).await.unwrap();
            let staged: Option<Session> =
                tx.execute(Select(By::new(id))).await.unwrap();
            assert!(staged.is_some());
        }
        let found: Option<Session> =
            db.execute(Select(By::<Option<Session>, session::Id>::new(id)))
                .await
                .unwrap();
        assert!(found.is_none());

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(s.clone())).await.unwrap();
        let mut updated = s;
        updated.deleted_at = Some(DateTime::UNIX_EPOCH.coerce());
        tx.execute(Update(updated)).await.unwrap();
        tx.execute(Commit).await.unwrap();

        let found: Option<Session> =
            db.execute(Select(By::new(id))).await.unwrap();
        assert!(found.unwrap().is_deleted());
    }
}
