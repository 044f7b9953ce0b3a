//! Calendar policy deciding when sessions may take place.
//!
//! Everything here is pure: holidays are looked up by the caller and passed
//! in as a flag, and "now" is always provided explicitly.

use std::time::Duration;

use common::{Date, DateTime};
use derive_more::{Display, Error};
use smart_default::SmartDefault;
use time::{macros::time, Time, UtcOffset, Weekday};

use crate::domain::Interval;

/// Opening hours of a single day.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    /// Earliest time a session may start at.
    pub opens: Time,

    /// Time every session must end by.
    ///
    /// A session of some duration may start no later than `closes` minus
    /// that duration.
    pub closes: Time,
}

impl Window {
    /// Default [`Window`] of Monday to Friday.
    pub const WEEKDAY: Self = Self {
        opens: time!(09:00),
        closes: time!(21:00),
    };

    /// Default [`Window`] of Saturday.
    pub const SATURDAY: Self = Self {
        opens: time!(09:00),
        closes: time!(16:00),
    };

    /// Creates a new [`Window`] if `opens < closes`.
    #[must_use]
    pub fn new(opens: Time, closes: Time) -> Option<Self> {
        (opens < closes).then_some(Self { opens, closes })
    }
}

/// Limits of how far in advance sessions may be requested.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct BookingWindow {
    /// Minimal number of calendar days between today and the requested date.
    #[default(1)]
    pub min_lead_days: u16,

    /// Maximal time between now and the requested start.
    #[default(Duration::from_secs((10 * 24 + 12) * 60 * 60))]
    pub max_lead: Duration,
}

/// Calendar policy of the platform.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Policy {
    /// Offset of the operating time zone from UTC.
    #[default(UtcOffset::UTC)]
    pub utc_offset: UtcOffset,

    /// [`Window`] of Monday to Friday.
    #[default(Window::WEEKDAY)]
    pub weekday: Window,

    /// [`Window`] of Saturday.
    #[default(Window::SATURDAY)]
    pub saturday: Window,

    /// Duration of a session when none is specified.
    #[default(Duration::from_secs(75 * 60))]
    pub default_duration: Duration,

    /// Shortest allowed duration of a session.
    #[default(Duration::from_secs(15 * 60))]
    pub min_duration: Duration,

    /// [`BookingWindow`] applied to session requests.
    pub booking_window: BookingWindow,
}

/// Absolute opening hours of a specific [`Date`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Opening {
    /// Whole open [`Interval`] of the day.
    pub interval: Interval,
}

/// Rule of a [`Policy`] violated by an [`Interval`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Violation {
    /// Nothing may be booked on the day.
    #[display("`{_0}` is not a working day")]
    Closed(#[error(not(source))] Date),

    /// The day is a public holiday.
    #[display("`{_0}` is a public holiday")]
    Holiday(#[error(not(source))] Date),

    /// Session starts and ends on different days.
    #[display("session must start and end on the same day")]
    SpansDays,

    /// Session is shorter than allowed.
    #[display("session must last at least {} minutes", _0.as_secs() / 60)]
    TooShort(#[error(not(source))] Duration),

    /// Session starts before the day opens.
    #[display("session starts before opening at `{_0}`")]
    BeforeOpening(#[error(not(source))] Time),

    /// Session ends after the day closes.
    #[display("session ends after closing at `{_0}`")]
    AfterClosing(#[error(not(source))] Time),

    /// Requested day is too close to today.
    #[display("session must be requested at least {_0} day(s) in advance")]
    TooSoon(#[error(not(source))] u16),

    /// Requested start is too far in the future.
    #[display("session cannot be requested that far in advance")]
    TooFar,
}

impl Policy {
    /// Returns the [`Date`] the provided moment falls on in the operating time
    /// zone.
    #[must_use]
    pub fn date_of(&self, at: DateTime) -> Date {
        at.date_at(self.utc_offset)
    }

    /// Returns the [`Window`] of the provided [`Date`], if it's a working
    /// day.
    ///
    /// Holidays are not considered here.
    #[must_use]
    pub fn window(&self, date: Date) -> Option<Window> {
        match date.weekday() {
            Weekday::Sunday => None,
            Weekday::Saturday => Some(self.saturday),
            Weekday::Monday
            | Weekday::Tuesday
            | Weekday::Wednesday
            | Weekday::Thursday
            | Weekday::Friday => Some(self.weekday),
        }
    }

    /// Returns the absolute [`Opening`] of the provided [`Date`].
    ///
    /// [`None`] is returned if the day is closed or `is_holiday`.
    #[must_use]
    pub fn opening(&self, date: Date, is_holiday: bool) -> Option<Opening> {
        if is_holiday {
            return None;
        }
        let window = self.window(date)?;
        let at = |t| DateTime::from_local(date, t, self.utc_offset);
        Some(Opening {
            interval: Interval::new(at(window.opens), at(window.closes))?,
        })
    }

    /// Checks whether the provided [`Interval`] lies inside the bookable
    /// hours of its day.
    ///
    /// # Errors
    ///
    /// With the first violated rule.
    pub fn check(
        &self,
        interval: &Interval,
        is_holiday: bool,
    ) -> Result<(), Violation> {
        if interval.duration() < self.min_duration {
            return Err(Violation::TooShort(self.min_duration));
        }

        let start = interval.start().at_offset(self.utc_offset);
        let end = interval.end().at_offset(self.utc_offset);
        if start.date() != end.date() {
            return Err(Violation::SpansDays);
        }

        let date = Date::from(start.date());
        if is_holiday {
            return Err(Violation::Holiday(date));
        }
        let window = self.window(date).ok_or(Violation::Closed(date))?;

        if start.time() < window.opens {
            return Err(Violation::BeforeOpening(window.opens));
        }
        if end.time() > window.closes {
            return Err(Violation::AfterClosing(window.closes));
        }
        Ok(())
    }

    /// Checks whether the provided [`Interval`] may be requested at the
    /// provided moment according to the [`BookingWindow`].
    ///
    /// # Errors
    ///
    /// With the violated [`BookingWindow`] limit.
    pub fn check_booking_window(
        &self,
        interval: &Interval,
        now: DateTime,
    ) -> Result<(), Violation> {
        let BookingWindow {
            min_lead_days,
            max_lead,
        } = self.booking_window;

        let lead_days = self
            .date_of(interval.start())
            .days_since(self.date_of(now));
        if lead_days < i64::from(min_lead_days) {
            return Err(Violation::TooSoon(min_lead_days));
        }
        if interval.start() > now + max_lead {
            return Err(Violation::TooFar);
        }
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Date, DateTime};
    use time::{
        macros::{date, datetime, offset, time},
        OffsetDateTime,
    };

    use super::{Interval, Policy, Violation};

    fn at(dt: OffsetDateTime) -> DateTime {
        dt.try_into().unwrap()
    }

    fn interval(start: OffsetDateTime, end: OffsetDateTime) -> Interval {
        Interval::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn sunday_is_closed() {
        let policy = Policy::default();
        let sunday = Date::from(date!(2024-06-16));

        assert_eq!(policy.window(sunday), None);
        assert_eq!(policy.opening(sunday, false), None);
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-16 10:00 UTC),
                    datetime!(2024-06-16 11:15 UTC),
                ),
                false,
            ),
            Err(Violation::Closed(sunday)),
        );
    }

    #[test]
    fn holiday_is_closed_on_any_weekday() {
        let policy = Policy::default();
        let monday = Date::from(date!(2024-06-10));

        assert_eq!(policy.opening(monday, true), None);
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 10:00 UTC),
                    datetime!(2024-06-10 11:15 UTC),
                ),
                true,
            ),
            Err(Violation::Holiday(monday)),
        );
    }

    #[test]
    fn saturday_window() {
        let policy = Policy::default();

        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 15:15 UTC),
                    datetime!(2024-06-15 16:30 UTC),
                ),
                false,
            ),
            Err(Violation::AfterClosing(time!(16:00))),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 14:45 UTC),
                    datetime!(2024-06-15 16:00 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 15:16 UTC),
                    datetime!(2024-06-15 15:46 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 14:45 UTC),
                    datetime!(2024-06-15 16:00:30 UTC),
                ),
                false,
            ),
            Err(Violation::AfterClosing(time!(16:00))),
        );
    }

    #[test]
    fn weekday_window() {
        let policy = Policy::default();

        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 19:45 UTC),
                    datetime!(2024-06-10 21:00 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 08:59 UTC),
                    datetime!(2024-06-10 10:14 UTC),
                ),
                false,
            ),
            Err(Violation::BeforeOpening(time!(09:00))),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 19:46 UTC),
                    datetime!(2024-06-10 21:01 UTC),
                ),
                false,
            ),
            Err(Violation::AfterClosing(time!(21:00))),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 20:00 UTC),
                    datetime!(2024-06-11 09:00 UTC),
                ),
                false,
            ),
            Err(Violation::SpansDays),
        );
    }

    #[test]
    fn short_session_may_start_until_it_fits_before_closing() {
        let policy = Policy::default();

        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 20:00 UTC),
                    datetime!(2024-06-10 20:30 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 20:30 UTC),
                    datetime!(2024-06-10 21:00 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 20:31 UTC),
                    datetime!(2024-06-10 21:01 UTC),
                ),
                false,
            ),
            Err(Violation::AfterClosing(time!(21:00))),
        );
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 15:30 UTC),
                    datetime!(2024-06-15 16:00 UTC),
                ),
                false,
            ),
            Ok(()),
        );
    }

    #[test]
    fn refuses_too_short_sessions() {
        let policy = Policy::default();

        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 10:00 UTC),
                    datetime!(2024-06-10 10:10 UTC),
                ),
                false,
            ),
            Err(Violation::TooShort(Duration::from_secs(15 * 60))),
        );
    }

    #[test]
    fn evaluates_in_operating_time_zone() {
        let policy = Policy {
            utc_offset: offset!(+3),
            ..Policy::default()
        };

        // 06:30 UTC is 09:30 local.
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-10 06:30 UTC),
                    datetime!(2024-06-10 07:45 UTC),
                ),
                false,
            ),
            Ok(()),
        );
        // Saturday 21:30 UTC is already Sunday locally.
        assert_eq!(
            policy.check(
                &interval(
                    datetime!(2024-06-15 21:30 UTC),
                    datetime!(2024-06-15 22:30 UTC),
                ),
                false,
            ),
            Err(Violation::Closed(Date::from(date!(2024-06-16)))),
        );

        let opening = policy.opening(Date::from(date!(2024-06-10)), false).unwrap();
        assert_eq!(opening.interval.start(), at(datetime!(2024-06-10 06:00 UTC)));
        assert_eq!(opening.interval.end(), at(datetime!(2024-06-10 18:00 UTC)));
    }

    #[test]
    fn booking_window_rejects_same_day() {
        let policy = Policy::default();
        let now = at(datetime!(2024-06-10 08:00 UTC));

        assert_eq!(
            policy.check_booking_window(
                &interval(
                    datetime!(2024-06-10 18:00 UTC),
                    datetime!(2024-06-10 19:15 UTC),
                ),
                now,
            ),
            Err(Violation::TooSoon(1)),
        );
        assert_eq!(
            policy.check_booking_window(
                &interval(
                    datetime!(2024-06-11 09:00 UTC),
                    datetime!(2024-06-11 10:15 UTC),
                ),
                now,
            ),
            Ok(()),
        );
    }

    #[test]
    fn booking_window_limits_lead_time() {
        let policy = Policy::default();
        let now = at(datetime!(2024-06-10 08:00 UTC));

        assert_eq!(
            policy.check_booking_window(
                &interval(
                    datetime!(2024-06-20 20:00 UTC),
                    datetime!(2024-06-20 20:30 UTC),
                ),
                now,
            ),
            Ok(()),
        );
        assert_eq!(
            policy.check_booking_window(
                &interval(
                    datetime!(2024-06-20 20:01 UTC),
                    datetime!(2024-06-20 20:31 UTC),
                ),
                now,
            ),
            Err(Violation::TooFar),
        );
        assert_eq!(
            policy.check_booking_window(
                &interval(
                    datetime!(2024-06-22 10:00 UTC),
                    datetime!(2024-06-22 11:15 UTC),
                ),
                now,
            ),
            Err(Violation::TooFar),
        );
        assert_eq!(
            now + Duration::from_secs((10 * 24 + 12) * 60 * 60),
            at(datetime!(2024-06-20 20:00 UTC)),
        );
    }
}
