//! [`Interval`] definitions.

use std::time::Duration;

use common::DateTime;

/// Half-open `[start, end)` time interval.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Interval {
    /// [`DateTime`] this [`Interval`] starts at (inclusive).
    start: DateTime,

    /// [`DateTime`] this [`Interval`] ends at (exclusive).
    end: DateTime,
}

impl Interval {
    /// Creates a new [`Interval`] if the provided `end` is strictly after the
    /// provided `start`.
    #[must_use]
    pub fn new(start: DateTime, end: DateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Creates a new [`Interval`] of the provided `duration` starting at the
    /// provided `start`.
    ///
    /// [`None`] is returned if the `duration` is zero.
    #[must_use]
    pub fn starting_at(start: DateTime, duration: Duration) -> Option<Self> {
        Self::new(start, start + duration)
    }

    /// Returns the [`DateTime`] this [`Interval`] starts at.
    #[must_use]
    pub fn start(&self) -> DateTime {
        self.start
    }

    /// Returns the [`DateTime`] this [`Interval`] ends at.
    #[must_use]
    pub fn end(&self) -> DateTime {
        self.end
    }

    /// Returns the length of this [`Interval`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Indicates whether this [`Interval`] overlaps the `other` one.
    ///
    /// Intervals only touching each other's endpoints don't overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use time::macros::datetime;

    use super::Interval;

    fn at(dt: time::OffsetDateTime) -> DateTime {
        dt.try_into().unwrap()
    }

    fn interval(start: time::OffsetDateTime, end: time::OffsetDateTime) -> Interval {
        Interval::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn requires_end_after_start() {
        let moment = at(datetime!(2024-06-10 10:00 UTC));

        assert!(Interval::new(moment, moment).is_none());
        assert!(Interval::new(moment + Duration::from_secs(60), moment).is_none());
        assert!(Interval::starting_at(moment, Duration::ZERO).is_none());
        assert_eq!(
            Interval::starting_at(moment, Duration::from_secs(75 * 60))
                .map(|i| i.duration()),
            Some(Duration::from_secs(75 * 60)),
        );
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let morning =
            interval(datetime!(2024-06-10 10:00 UTC), datetime!(2024-06-10 11:15 UTC));
        let next =
            interval(datetime!(2024-06-10 11:15 UTC), datetime!(2024-06-10 12:30 UTC));
        let previous =
            interval(datetime!(2024-06-10 08:45 UTC), datetime!(2024-06-10 10:00 UTC));

        assert!(!morning.overlaps(&next));
        assert!(!next.overlaps(&morning));
        assert!(!morning.overlaps(&previous));
    }

    #[test]
    fn detects_partial_and_nested_overlaps() {
        let base =
            interval(datetime!(2024-06-10 10:00 UTC), datetime!(2024-06-10 11:15 UTC));
        let partial =
            interval(datetime!(2024-06-10 11:00 UTC), datetime!(2024-06-10 12:15 UTC));
        let nested =
            interval(datetime!(2024-06-10 10:30 UTC), datetime!(2024-06-10 10:45 UTC));

        assert!(base.overlaps(&partial));
        assert!(partial.overlaps(&base));
        assert!(base.overlaps(&nested));
        assert!(nested.overlaps(&base));
        assert!(base.overlaps(&base));
    }
}
