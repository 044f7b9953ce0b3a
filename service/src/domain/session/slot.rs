//! Available [`Slots`] calculation.

use std::{iter::Peekable, time::Duration, vec};

use common::DateTime;

use crate::domain::{calendar::Opening, Interval};

/// Lazy sequence of bookable slots of a day.
///
/// Slots are cut consecutively out of every free part of the day's
/// [`Opening`], each of exactly the requested duration, in chronological
/// order. A free part's remainder shorter than the duration is skipped.
///
/// Cloning restarts the calculation from the clone's current position.
#[derive(Clone, Debug)]
pub struct Slots {
    /// Start of the next candidate slot.
    cursor: DateTime,

    /// [`DateTime`] every slot must end by.
    closes: DateTime,

    /// Duration of every slot.
    duration: Duration,

    /// Occupied [`Interval`]s of the day, sorted by their start.
    busy: Peekable<vec::IntoIter<Interval>>,
}

impl Slots {
    /// Creates new [`Slots`] of the provided [`Opening`] around the provided
    /// `busy` [`Interval`]s.
    ///
    /// [`None`] is returned if the `duration` is zero.
    #[must_use]
    pub fn new(
        opening: Opening,
        busy: impl IntoIterator<Item = Interval>,
        duration: Duration,
    ) -> Option<Self> {
        if duration.is_zero() {
            return None;
        }
        let mut busy = busy.into_iter().collect::<Vec<_>>();
        busy.sort_unstable_by_key(Interval::start);

        Some(Self {
            cursor: opening.interval.start(),
            closes: opening.interval.end(),
            duration,
            busy: busy.into_iter().peekable(),
        })
    }
}

impl Iterator for Slots {
    type Item = Interval;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while self.busy.next_if(|b| b.end() <= self.cursor).is_some() {}

            let slot = Interval::starting_at(self.cursor, self.duration)?;
            if slot.end() > self.closes {
                return None;
            }

            if let Some(busy) = self.busy.next_if(|b| b.overlaps(&slot)) {
                self.cursor = self.cursor.max(busy.end());
                continue;
            }

            self.cursor = slot.end();
            return Some(slot);
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Date, DateTime};
    use time::macros::{date, datetime, time};

    use crate::domain::{calendar::Policy, session::spec::interval, Interval};

    use super::Slots;

    const MINUTES_75: Duration = Duration::from_secs(75 * 60);

    fn slots(date: Date, busy: Vec<Interval>, duration: Duration) -> Vec<Interval> {
        let opening = Policy::default().opening(date, false).unwrap();
        Slots::new(opening, busy, duration).unwrap().collect()
    }

    fn starts(slots: &[Interval]) -> Vec<time::Time> {
        slots
            .iter()
            .map(|s| time::OffsetDateTime::from(s.start()).time())
            .collect()
    }

    #[test]
    fn splits_free_weekday() {
        let slots = slots(Date::from(date!(2024-06-10)), vec![], MINUTES_75);

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
        assert!(slots.iter().all(|s| s.duration() == MINUTES_75));
    }

    #[test]
    fn skips_busy_interval() {
        let busy = interval(
            datetime!(2024-06-10 10:00 UTC),
            datetime!(2024-06-10 11:15 UTC),
        );

        let slots = slots(Date::from(date!(2024-06-10)), vec![busy], MINUTES_75);

        assert!(slots.iter().all(|s| !s.overlaps(&busy)));
        assert_eq!(starts(&slots)[0], time!(11:15));
        assert!(slots
            .iter()
            .any(|s| s.start() == DateTime::try_from(datetime!(2024-06-10 11:15 UTC)).unwrap()));
    }

    #[test]
    fn short_slots_fill_day_up_to_closing() {
        let slots = slots(
            Date::from(date!(2024-06-10)),
            vec![],
            Duration::from_secs(30 * 60),
        );

        assert_eq!(slots.len(), 24);
        assert_eq!(starts(&slots).last(), Some(&time!(20:30)));
        assert_eq!(
            slots.last().map(Interval::end),
            Some(DateTime::try_from(datetime!(2024-06-10 21:00 UTC)).unwrap()),
        );
    }

    #[test]
    fn slices_from_each_free_part() {
        let busy = vec![
            interval(
                datetime!(2024-06-15 13:00 UTC),
                datetime!(2024-06-15 14:00 UTC),
            ),
            interval(
                datetime!(2024-06-15 09:30 UTC),
                datetime!(2024-06-15 10:00 UTC),
            ),
        ];

        let slots = slots(
            Date::from(date!(2024-06-15)),
            busy,
            Duration::from_secs(60 * 60),
        );

        assert_eq!(
            starts(&slots),
            [
                time!(10:00),
                time!(11:00),
                time!(12:00),
                time!(14:00),
                time!(15:00),
            ],
        );
    }

    #[test]
    fn saturday_slots_end_by_closing() {
        for minutes in [30, 45, 60, 75, 90] {
            let slots = slots(
                Date::from(date!(2024-06-15)),
                vec![],
                Duration::from_secs(minutes * 60),
            );

            assert!(!slots.is_empty());
            for s in slots {
                let start = time::OffsetDateTime::from(s.start()).time();
                let end = time::OffsetDateTime::from(s.end()).time();
                assert!(start >= time!(09:00));
                assert!(end <= time!(16:00));
            }
        }
    }

    #[test]
    fn handles_overlapping_busy_intervals() {
        let busy = vec![
            interval(
                datetime!(2024-06-10 08:00 UTC),
                datetime!(2024-06-10 12:00 UTC),
            ),
            interval(
                datetime!(2024-06-10 11:00 UTC),
                datetime!(2024-06-10 19:00 UTC),
            ),
        ];

        let slots = slots(Date::from(date!(2024-06-10)), busy, MINUTES_75);

        assert_eq!(starts(&slots), [time!(19:00)]);
    }

    #[test]
    fn rejects_zero_duration() {
        let opening = Policy::default()
            .opening(Date::from(date!(2024-06-10)), false)
            .unwrap();

        assert!(Slots::new(opening, vec![], Duration::ZERO).is_none());
    }

    #[test]
    fn is_restartable() {
        let opening = Policy::default()
            .opening(Date::from(date!(2024-06-10)), false)
            .unwrap();
        let busy = vec![interval(
            datetime!(2024-06-10 12:00 UTC),
            datetime!(2024-06-10 13:00 UTC),
        )];
        let slots = Slots::new(opening, busy, MINUTES_75).unwrap();

        assert_eq!(
            slots.clone().collect::<Vec<_>>(),
            slots.collect::<Vec<_>>(),
        );
    }
}
