//! [`Session`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
    domain::{
        session::{
            self, Meeting, Participant, Reschedule, Resolution, Status,
        },
        Interval, Program, Session,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read,
};

/// Expands into a `SELECT` of all the `sessions` columns followed by the
/// provided clauses.
macro_rules! select_sessions {
    ($($clause:literal),* $(,)?) => {
        concat!(
            "SELECT id, title, description, \
                    start_time, end_time, \
                    teacher_id, student_id, subject_id, \
                    program_kind, program_id, \
                    status, meeting_link, meeting_platform, \
                    requested_by, accepted_by, \
                    rejected_by, rejection_reason, \
                    cancelled_by, cancellation_reason, \
                    created_at, updated_at, deleted_at \
             FROM sessions ",
            $($clause),*
        )
    };
}

/// Restores a [`Session`] out of the provided `sessions` [`Row`], without its
/// [`Reschedule`]s.
fn from_row(row: &Row) -> Result<Session, Traced<database::Error>> {
    let malformed = |column| {
        tracerr::new!(database::Error::from(postgres::Error::Malformed(column)))
    };

    let interval = Interval::new(row.get("start_time"), row.get("end_time"))
        .ok_or_else(|| malformed("end_time"))?;
    let program = match (row.get("program_kind"), row.get("program_id")) {
        (Some(kind), Some(id)) => Some(Program::from_parts(kind, id)),
        (None, None) => None,
        _ => return Err(malformed("program_kind")),
    };
    let meeting = match (row.get("meeting_link"), row.get("meeting_platform")) {
        (Some(link), Some(platform)) => Some(Meeting { link, platform }),
        (None, None) => None,
        _ => return Err(malformed("meeting_link")),
    };
    let resolution = |by: &str, reason: &'static str| {
        match (row.get(by), row.get(reason)) {
            (Some(by), Some(reason)) => Ok(Some(Resolution { by, reason })),
            (None, None) => Ok(None),
            _ => Err(malformed(reason)),
        }
    };

    Ok(Session {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        interval,
        teacher_id: row.get("teacher_id"),
        student_id: row.get("student_id"),
        subject_id: row.get("subject_id"),
        program,
        status: row.get("status"),
        meeting,
        requested_by: row.get("requested_by"),
        accepted_by: row.get("accepted_by"),
        rejection: resolution("rejected_by", "rejection_reason")?,
        cancellation: resolution("cancelled_by", "cancellation_reason")?,
        reschedules: vec![],
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    })
}

/// Restores [`Session`]s out of the provided `sessions` [`Row`]s, loading
/// their [`Reschedule`]s.
async fn with_reschedules<C: Connection>(
    conn: &C,
    rows: Vec<Row>,
) -> Result<Vec<Session>, Traced<database::Error>> {
    let mut sessions = rows
        .iter()
        .map(from_row)
        .collect::<Result<Vec<_>, _>>()?;
    if sessions.is_empty() {
        return Ok(sessions);
    }

    let ids = sessions.iter().map(|s| s.id).collect::<Vec<_>>();
    const SQL: &str = "\
        SELECT session_id, \
               previous_start, previous_end, \
               rescheduled_by, rescheduled_at \
        FROM session_reschedules \
        WHERE session_id = ANY($1::UUID[]) \
        ORDER BY session_id, seq";
    let mut history = HashMap::<session::Id, Vec<Reschedule>>::new();
    for row in conn.query(SQL, &[&ids]).await.map_err(tracerr::wrap!())? {
        let previous =
            Interval::new(row.get("previous_start"), row.get("previous_end"))
                .ok_or_else(|| {
                    tracerr::new!(database::Error::from(
                        postgres::Error::Malformed("previous_end"),
                    ))
                })?;
        history.entry(row.get("session_id")).or_default().push(
            Reschedule {
                previous,
                by: row.get("rescheduled_by"),
                at: row.get("rescheduled_at"),
            },
        );
    }
    for s in &mut sessions {
        s.reschedules = history.remove(&s.id).unwrap_or_default();
    }
    Ok(sessions)
}

/// Appends the [`Reschedule`]s of the provided [`Session`] not stored yet.
async fn store_reschedules<C: Connection>(
    conn: &C,
    session: &Session,
) -> Result<(), Traced<database::Error>> {
    const SQL: &str = "\
        INSERT INTO session_reschedules (\
            session_id, seq, \
            previous_start, previous_end, \
            rescheduled_by, rescheduled_at\
        ) \
        VALUES (\
            $1::UUID, $2::INT4, \
            $3::TIMESTAMPTZ, $4::TIMESTAMPTZ, \
            $5::UUID, $6::TIMESTAMPTZ\
        ) \
        ON CONFLICT (session_id, seq) DO NOTHING";
    for (seq, r) in (0_i32..).zip(&session.reschedules) {
        _ = conn
            .exec(
                SQL,
                &[
                    &session.id,
                    &seq,
                    &r.previous.start(),
                    &r.previous.end(),
                    &r.by,
                    &r.at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
    }
    Ok(())
}

impl<C> Database<Lock<By<Session, Participant>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Session, Participant>>,
    ) -> Result<Self::Ok, Self::Err> {
        let participant = by.into_inner();
        let key = i64::from_ne_bytes(
            xxh3_64(participant.id().as_bytes()).to_ne_bytes(),
        );

        const SQL: &str = "SELECT pg_advisory_xact_lock($1::INT8)";
        self.query(SQL, &[&key])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Session>, session::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Session>, session::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = select_sessions!("WHERE id = $1::UUID FOR UPDATE");
        let rows = self.query(SQL, &[&id]).await.map_err(tracerr::wrap!())?;
        Ok(with_reschedules(&**self, rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Session>, read::session::Busy>>> for Postgres<C>
where
    C: Connection,
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
        let (mut teachers, mut students) = (vec![], vec![]);
        for p in participants {
            match p {
                Participant::Teacher(id) => teachers.push(id),
                Participant::Student(id) => students.push(id),
            }
        }
        let active = Status::ALL
            .iter()
            .copied()
            .filter(|s| s.is_active())
            .collect::<Vec<_>>();

        const SQL: &str = select_sessions!(
            "WHERE (teacher_id = ANY($1::UUID[]) \
                    OR student_id = ANY($2::UUID[])) \
                   AND status = ANY($3::INT2[]) \
                   AND deleted_at IS NULL \
                   AND start_time < $5::TIMESTAMPTZ \
                   AND end_time > $4::TIMESTAMPTZ \
             ORDER BY start_time",
        );
        let rows = self
            .query(
                SQL,
                &[
                    &teachers,
                    &students,
                    &active,
                    &period.start(),
                    &period.end(),
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        with_reschedules(&**self, rows)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Session>, read::session::Agenda>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Session>, read::session::Agenda>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::session::Agenda { user_id, period } = by.into_inner();

        const SQL: &str = select_sessions!(
            "WHERE (teacher_id = $1::UUID OR student_id = $1::UUID) \
                   AND deleted_at IS NULL \
                   AND start_time < $3::TIMESTAMPTZ \
                   AND end_time > $2::TIMESTAMPTZ \
             ORDER BY start_time",
        );
        let rows = self
            .query(SQL, &[&user_id, &period.start(), &period.end()])
            .await
            .map_err(tracerr::wrap!())?;
        with_reschedules(&**self, rows)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Session>, read::session::Due>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Session>, read::session::Due>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::session::Due { now } = by.into_inner();

        // Concurrent sweeps skip the rows each other is advancing.
        const SQL: &str = select_sessions!(
            "WHERE deleted_at IS NULL \
                   AND ((status = ANY($1::INT2[]) \
                         AND start_time <= $3::TIMESTAMPTZ) \
                        OR (status = $2::INT2 \
                            AND end_time <= $3::TIMESTAMPTZ)) \
             ORDER BY start_time \
             FOR UPDATE SKIP LOCKED",
        );
        let started =
            vec![Status::Requested, Status::Accepted, Status::Scheduled];
        let rows = self
            .query(SQL, &[&started, &Status::Ongoing, &now])
            .await
            .map_err(tracerr::wrap!())?;
        with_reschedules(&**self, rows)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Session>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO sessions (\
                id, title, description, \
                start_time, end_time, \
                teacher_id, student_id, subject_id, \
                program_kind, program_id, \
                status, meeting_link, meeting_platform, \
                requested_by, accepted_by, \
                rejected_by, rejection_reason, \
                cancelled_by, cancellation_reason, \
                created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ, \
                $6::UUID, $7::UUID, $8::UUID, \
                $9::INT2, $10::UUID, \
                $11::INT2, $12::VARCHAR, $13::INT2, \
                $14::UUID, $15::UUID, \
                $16::UUID, $17::VARCHAR, \
                $18::UUID, $19::VARCHAR, \
                $20::TIMESTAMPTZ, $21::TIMESTAMPTZ, $22::TIMESTAMPTZ\
            )";
        write(&**self, SQL, &session).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Session>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(session): Update<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE sessions \
            SET title = $2::VARCHAR, \
                description = $3::VARCHAR, \
                start_time = $4::TIMESTAMPTZ, \
                end_time = $5::TIMESTAMPTZ, \
                teacher_id = $6::UUID, \
                student_id = $7::UUID, \
                subject_id = $8::UUID, \
                program_kind = $9::INT2, \
                program_id = $10::UUID, \
                status = $11::INT2, \
                meeting_link = $12::VARCHAR, \
                meeting_platform = $13::INT2, \
                requested_by = $14::UUID, \
                accepted_by = $15::UUID, \
                rejected_by = $16::UUID, \
                rejection_reason = $17::VARCHAR, \
                cancelled_by = $18::UUID, \
                cancellation_reason = $19::VARCHAR, \
                created_at = $20::TIMESTAMPTZ, \
                updated_at = $21::TIMESTAMPTZ, \
                deleted_at = $22::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        write(&**self, SQL, &session).await.map_err(tracerr::wrap!())
    }
}

/// Writes the provided [`Session`] with the provided `INSERT` or `UPDATE`
/// statement binding all the `sessions` columns.
async fn write<C: Connection>(
    conn: &C,
    sql: &str,
    session: &Session,
) -> Result<(), Traced<database::Error>> {
    let Session {
        id,
        title,
        description,
        interval,
        teacher_id,
        student_id,
        subject_id,
        program,
        status,
        meeting,
        requested_by,
        accepted_by,
        rejection,
        cancellation,
        reschedules: _,
        created_at,
        updated_at,
        deleted_at,
    } = session;
    let resolution = |r: &Option<Resolution>| {
        r.as_ref().map(|r| (r.by, r.reason.clone())).unzip()
    };
    let (rejected_by, rejection_reason) = resolution(rejection);
    let (cancelled_by, cancellation_reason) = resolution(cancellation);
    let (meeting_link, meeting_platform) = meeting
        .as_ref()
        .map(|m| (m.link.clone(), m.platform))
        .unzip();

    _ = conn
        .exec(
            sql,
            &[
                id,
                title,
                description,
                &interval.start(),
                &interval.end(),
                teacher_id,
                student_id,
                subject_id,
                &program.map(|p| p.kind()),
                &program.map(|p| p.id()),
                status,
                &meeting_link,
                &meeting_platform,
                requested_by,
                accepted_by,
                &rejected_by,
                &rejection_reason,
                &cancelled_by,
                &cancellation_reason,
                created_at,
                updated_at,
                deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())?;
    store_reschedules(conn, session)
        .await
        .map_err(tracerr::wrap!())
}
