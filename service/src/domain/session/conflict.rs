//! Detection of [`Session`]s overlapping in time.

use crate::domain::{
    session::{self, Participant},
    Interval, Session,
};

/// Finds the first active [`Session`] of any of the provided
/// [`Participant`]s overlapping the `candidate` [`Interval`].
///
/// The [`Session`] with the `except` ID (the one being moved or restored) is
/// ignored.
pub fn detect<'s>(
    candidate: &Interval,
    participants: &[Participant],
    sessions: impl IntoIterator<Item = &'s Session>,
    except: Option<session::Id>,
) -> Option<&'s Session> {
    sessions.into_iter().find(|s| {
        Some(s.id) != except
            && s.is_active()
            && s.interval.overlaps(candidate)
            && participants.iter().any(|p| s.involves(*p))
    })
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use time::macros::datetime;

    use crate::domain::{
        session::{spec::{interval, session}, Participant, Status},
        user,
    };

    use super::detect;

    #[test]
    fn finds_overlap_for_any_participant() {
        let (teacher, student) = (user::Id::new(), user::Id::new());
        let busy = session(
            teacher,
            user::Id::new(),
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
            Status::Scheduled,
        );
        let candidate = interval(
            datetime!(2024-06-10 11:00 UTC),
            datetime!(2024-06-10 12:15 UTC),
        );

        let found = detect(
            &candidate,
            &[Participant::Teacher(teacher), Participant::Student(student)],
            [&busy],
            None,
        );

        assert_eq!(found.map(|s| s.id), Some(busy.id));
        assert!(detect(
            &candidate,
            &[Participant::Student(student)],
            [&busy],
            None,
        )
        .is_none());
    }

    #[test]
    fn touching_sessions_do_not_conflict() {
        let teacher = user::Id::new();
        let busy = session(
            teacher,
            user::Id::new(),
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
            Status::Scheduled,
        );
        let candidate = interval(
            datetime!(2024-06-10 11:15 UTC),
            datetime!(2024-06-10 12:30 UTC),
        );

        assert!(detect(
            &candidate,
            &[Participant::Teacher(teacher)],
            [&busy],
            None,
        )
        .is_none());
    }

    #[test]
    fn ignores_inactive_and_excepted_sessions() {
        let teacher = user::Id::new();
        let at = interval(
            datetime!(2024-06-10 10:00 UTC),
            datetime!(2024-06-10 11:15 UTC),
        );
        let cancelled = session(teacher, user::Id::new(), at, Status::Cancelled);
        let mut deleted = session(teacher, user::Id::new(), at, Status::Requested);
        deleted.deleted_at = Some(DateTime::UNIX_EPOCH.coerce());
        let itself = session(teacher, user::Id::new(), at, Status::Scheduled);
        let participants = [Participant::Teacher(teacher)];

        assert!(detect(
            &at,
            &participants,
            [&cancelled, &deleted, &itself],
            Some(itself.id),
        )
        .is_none());
        assert_eq!(
            detect(&at, &participants, [&cancelled, &deleted, &itself], None)
                .map(|s| s.id),
            Some(itself.id),
        );
    }

    #[test]
    fn role_of_participant_matters() {
        let user = user::Id::new();
        let busy = session(
            user,
            user::Id::new(),
            interval(
                datetime!(2024-06-10 10:00 UTC),
                datetime!(2024-06-10 11:15 UTC),
            ),
            Status::Requested,
        );

        assert!(detect(
            &busy.interval,
            &[Participant::Student(user)],
            [&busy],
            None,
        )
        .is_none());
    }
}
