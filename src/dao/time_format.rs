//! Serde adapters for the `date` and `time` columns, which the relational store exchanges as
//! plain `YYYY-MM-DD` and `HH:MM[:SS]` strings.

/// `YYYY-MM-DD` calendar dates.
pub mod date {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{Date, macros::format_description};

    /// Render a date as `YYYY-MM-DD`.
    pub fn format(value: &Date) -> Result<String, time::error::Format> {
        value.format(format_description!("[year]-[month]-[day]"))
    }

    /// Parse a `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> Result<Date, time::error::Parse> {
        Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
    }

    pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = format(value).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    /// Same encoding for optional dates (query filters).
    pub mod option {
        use serde::{Deserialize, Deserializer, de};
        use time::Date;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => {
                    super::parse(&raw).map(Some).map_err(de::Error::custom)
                }
                _ => Ok(None),
            }
        }
    }
}

/// Wall-clock times. Accepts `HH:MM` and `HH:MM:SS`, renders `HH:MM`.
pub mod time_of_day {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{Time, macros::format_description};

    /// Render a time as `HH:MM`.
    pub fn format(value: &Time) -> Result<String, time::error::Format> {
        value.format(format_description!("[hour]:[minute]"))
    }

    /// Parse either `HH:MM:SS` or `HH:MM`.
    pub fn parse(raw: &str) -> Result<Time, time::error::Parse> {
        let raw = raw.trim();
        Time::parse(raw, format_description!("[hour]:[minute]:[second]"))
            .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]")))
    }

    pub fn serialize<S>(value: &Time, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = format(value).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Time, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}
