use std::sync::OnceLock;

use chrono::{
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{
  LayoutError,
  Result
};

pub const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";
pub const TIMEZONE_ENV_VAR: &str =
  "PROMOCAL_TIMEZONE";

fn iso_date_regex()
-> Option<&'static Regex> {
  static ISO_DATE_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  ISO_DATE_RE
    .get_or_init(|| {
      Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .map_err(|err| {
          tracing::error!(
            error = %err,
            "internal regex compile \
             failure"
          );
        })
        .ok()
    })
    .as_ref()
}

/// Parses a strict, zero-padded
/// `YYYY-MM-DD` calendar date.
///
/// chrono alone accepts `2024-3-5`; the
/// wire format relies on zero padding so
/// that plain string order equals date
/// order, so that form is refused here.
pub fn parse_iso_date(
  raw: &str
) -> Result<NaiveDate> {
  let trimmed = raw.trim();
  if !iso_date_regex().is_some_and(
    |re| re.is_match(trimmed)
  ) {
    return Err(
      LayoutError::InvalidDate {
        raw: raw.to_string()
      }
    );
  }

  NaiveDate::parse_from_str(
    trimmed,
    ISO_DATE_FORMAT
  )
  .map_err(|_| {
    LayoutError::InvalidDate {
      raw: raw.to_string()
    }
  })
}

#[must_use]
pub fn format_iso_date(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

/// Resolves the zone used for "today".
///
/// `PROMOCAL_TIMEZONE` wins over the
/// configured id. `None` means no usable
/// zone was given and the local calendar
/// date applies.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Option<Tz> {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR).ok();
  pick_timezone(
    from_env.as_deref(),
    configured
  )
}

fn pick_timezone(
  from_env: Option<&str>,
  configured: Option<&str>
) -> Option<Tz> {
  if let Some(raw) = from_env
    && let Some(tz) =
      parse_timezone(raw, TIMEZONE_ENV_VAR)
  {
    return Some(tz);
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return Some(tz);
  }

  tracing::debug!(
    "no usable timezone configured; \
     using the local date"
  );
  None
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// The calendar date "now" falls on in
/// `timezone`. Never derived through a
/// UTC date, which shifts the day near
/// midnight.
#[must_use]
pub fn today_in_timezone(
  timezone: Tz
) -> NaiveDate {
  Utc::now()
    .with_timezone(&timezone)
    .date_naive()
}

/// Today in `timezone`, or the local
/// calendar date when no zone is set.
#[must_use]
pub fn today_for(
  timezone: Option<Tz>
) -> NaiveDate {
  match timezone {
    | Some(tz) => today_in_timezone(tz),
    | None => Local::now().date_naive()
  }
}

pub mod iso_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &super::format_iso_date(*date)
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_iso_date(&raw)
      .map_err(serde::de::Error::custom)
  }

  pub mod option {
    use chrono::NaiveDate;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      date: &Option<NaiveDate>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match date {
        | Some(value) => {
          super::serialize(
            value, serializer
          )
        }
        | None => {
          serializer.serialize_none()
        }
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<
      Option<NaiveDate>,
      D::Error
    >
    where
      D: Deserializer<'de>
    {
      let opt =
        Option::<String>::deserialize(
          deserializer
        )?;
      match opt {
        | Some(raw) => {
          super::super::parse_iso_date(
            &raw
          )
          .map(Some)
          .map_err(
            serde::de::Error::custom
          )
        }
        | None => Ok(None)
      }
    }
  }
}
