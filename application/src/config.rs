//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use service::domain::{calendar, session};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Shared [JWT] secret of the identity provider issuing access tokens.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret"))]
    pub jwt_secret: SecretString,

    /// Calendar configuration.
    pub calendar: Calendar,

    /// Meeting configuration.
    pub meeting: Meeting,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            calendar,
            meeting,
            tasks: Tasks { advance_sessions },
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.expose_secret().as_bytes(),
            ),
            calendar: calendar.into(),
            meeting_base_url: meeting.base_url,
            advance_sessions: service::task::advance_sessions::Config {
                interval: advance_sessions.interval,
            },
        }
    }
}

/// Calendar configuration.
///
/// Times of day are local to the operating time zone.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Calendar {
    /// Offset of the operating time zone from UTC, like `+05:30`.
    #[default(::time::UtcOffset::UTC)]
    #[serde(with = "format::offset")]
    pub utc_offset: ::time::UtcOffset,

    /// Opening hours from Monday to Friday.
    #[default(Window::from(calendar::Window::WEEKDAY))]
    pub weekday: Window,

    /// Opening hours of Saturday.
    #[default(Window::from(calendar::Window::SATURDAY))]
    pub saturday: Window,

    /// Duration of a session when none is specified.
    #[default(time::Duration::from_secs(75 * 60))]
    #[serde(with = "humantime_serde")]
    pub default_duration: time::Duration,

    /// Shortest allowed duration of a session.
    #[default(time::Duration::from_secs(15 * 60))]
    #[serde(with = "humantime_serde")]
    pub min_duration: time::Duration,

    /// Minimal number of days between today and a requested session.
    #[default(1)]
    pub min_lead_days: u16,

    /// Maximal time between now and a requested session start.
    #[default(time::Duration::from_secs((10 * 24 + 12) * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub max_lead: time::Duration,
}

impl From<Calendar> for calendar::Policy {
    fn from(value: Calendar) -> Self {
        let Calendar {
            utc_offset,
            weekday,
            saturday,
            default_duration,
            min_duration,
            min_lead_days,
            max_lead,
        } = value;
        Self {
            utc_offset,
            weekday: weekday.into(),
            saturday: saturday.into(),
            default_duration,
            min_duration,
            booking_window: calendar::BookingWindow {
                min_lead_days,
                max_lead,
            },
        }
    }
}

/// Opening hours of a day, like `"09:00"`.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct Window(calendar::Window);

impl From<calendar::Window> for Window {
    fn from(window: calendar::Window) -> Self {
        Self(window)
    }
}

impl From<Window> for calendar::Window {
    fn from(window: Window) -> Self {
        window.0
    }
}

impl TryFrom<RawWindow> for Window {
    type Error = &'static str;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        calendar::Window::new(raw.opens, raw.closes)
            .map(Self)
            .ok_or("opening hours must satisfy `opens < closes`")
    }
}

/// Unchecked [`Window`] as written in a configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
struct RawWindow {
    /// Earliest time a session may start at.
    #[serde(with = "format::time_of_day")]
    opens: ::time::Time,

    /// Time every session must end by.
    #[serde(with = "format::time_of_day")]
    closes: ::time::Time,
}

/// Meeting configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Meeting {
    /// Base of generated meeting links.
    #[default(default_meeting_base())]
    #[serde(deserialize_with = "format::meeting_link")]
    pub base_url: session::MeetingLink,
}

/// Returns the default base of generated meeting links.
fn default_meeting_base() -> session::MeetingLink {
    #[expect(unsafe_code, reason = "valid link")]
    unsafe {
        session::MeetingLink::new_unchecked("https://meet.jit.si")
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `AdvanceSessions` task configuration.
    pub advance_sessions: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

mod format {
    //! Textual formats of [`Config`] values.
    //!
    //! [`Config`]: super::Config

    use serde::{de::Error as _, Deserialize as _, Deserializer};
    use service::domain::session::MeetingLink;

    pub(super) mod offset {
        //! [`UtcOffset`] in a `+HH:MM` format.

        use serde::{de::Error as _, Deserialize as _, Deserializer};
        use time::{macros::format_description, UtcOffset};

        pub(in super::super) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<UtcOffset, D::Error> {
            let s = String::deserialize(deserializer)?;
            UtcOffset::parse(
                &s,
                format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
            )
            .map_err(D::Error::custom)
        }
    }

    pub(super) mod time_of_day {
        //! [`Time`] in a `HH:MM` format.

        use serde::{de::Error as _, Deserialize as _, Deserializer};
        use time::{macros::format_description, Time};

        pub(in super::super) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Time, D::Error> {
            let s = String::deserialize(deserializer)?;
            Time::parse(&s, format_description!("[hour]:[minute]"))
                .map_err(D::Error::custom)
        }
    }

    /// Deserializes a [`MeetingLink`] from a string.
    pub(super) fn meeting_link<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<MeetingLink, D::Error> {
        let s = String::deserialize(deserializer)?;
        MeetingLink::new(s).ok_or_else(|| D::Error::custom("invalid link"))
    }
}
