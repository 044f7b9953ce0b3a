//! [`Enrollment`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        enrollment::Assignment, program, subject, user, Enrollment, Program,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Expands into a `SELECT` of active `enrollments` along with their
/// aggregated assignments, filtered by the provided condition.
macro_rules! select_active_enrollments {
    ($cond:literal) => {
        concat!(
            "SELECT e.id, e.student_id, \
                    e.program_kind, e.program_id, \
                    e.created_at, e.ended_at, \
                    COALESCE(array_agg(a.subject_id ORDER BY a.subject_id) \
                             FILTER (WHERE a.subject_id IS NOT NULL), \
                             '{}') AS subject_ids, \
                    COALESCE(array_agg(a.teacher_id ORDER BY a.subject_id) \
                             FILTER (WHERE a.subject_id IS NOT NULL), \
                             '{}') AS teacher_ids \
             FROM enrollments AS e \
             LEFT JOIN enrollment_assignments AS a \
                    ON a.enrollment_id = e.id \
             WHERE e.ended_at IS NULL AND ",
            $cond,
            " GROUP BY e.id \
             ORDER BY e.created_at",
        )
    };
}

/// Restores an [`Enrollment`] out of the provided [`Row`].
fn from_row(row: &Row) -> Enrollment {
    let subject_ids: Vec<subject::Id> = row.get("subject_ids");
    let teacher_ids: Vec<user::Id> = row.get("teacher_ids");
    Enrollment {
        id: row.get("id"),
        student_id: row.get("student_id"),
        program: Program::from_parts(
            row.get("program_kind"),
            row.get("program_id"),
        ),
        assignments: subject_ids
            .into_iter()
            .zip(teacher_ids)
            .map(|(subject_id, teacher_id)| Assignment {
                subject_id,
                teacher_id,
            })
            .collect(),
        created_at: row.get("created_at"),
        ended_at: row.get("ended_at"),
    }
}

impl<C> Database<Select<By<Option<Enrollment>, read::enrollment::OfStudent>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Enrollment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Enrollment>, read::enrollment::OfStudent>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::enrollment::OfStudent(student_id) = by.into_inner();

        const SQL: &str =
            select_active_enrollments!("e.student_id = $1::UUID");
        Ok(self
            .query_opt(SQL, &[&student_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Enrollment>, read::enrollment::InProgram>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Enrollment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Enrollment>, read::enrollment::InProgram>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::enrollment::InProgram(program) = by.into_inner();
        let (kind, id): (program::Kind, program::Id) =
            (program.kind(), program.id());

        const SQL: &str = select_active_enrollments!(
            "e.program_kind = $1::INT2 AND e.program_id = $2::UUID"
        );
        Ok(self
            .query(SQL, &[&kind, &id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Enrollment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(enrollment): Insert<Enrollment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Enrollment {
            id,
            student_id,
            program,
            assignments,
            created_at,
            ended_at,
        } = enrollment;

        const SQL: &str = "\
            INSERT INTO enrollments (\
                id, student_id, \
                program_kind, program_id, \
                created_at, ended_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::INT2, $4::UUID, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ\
            )";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &student_id,
                    &program.kind(),
                    &program.id(),
                    &created_at,
                    &ended_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        if assignments.is_empty() {
            return Ok(());
        }
        let (subject_ids, teacher_ids): (Vec<_>, Vec<_>) = assignments
            .into_iter()
            .map(|a| (a.subject_id, a.teacher_id))
            .unzip();

        const ASSIGN_SQL: &str = "\
            INSERT INTO enrollment_assignments (\
                enrollment_id, subject_id, teacher_id\
            ) \
            SELECT $1::UUID, s, t \
            FROM unnest($2::UUID[], $3::UUID[]) AS a(s, t)";
        self.exec(ASSIGN_SQL, &[&id, &subject_ids, &teacher_ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
