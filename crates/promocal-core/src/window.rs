//! Visible calendar windows.
//!
//! A month window is always six full
//! Monday-first weeks (42 cells); a week
//! window is the Monday-to-Sunday strip
//! containing the requested day.

use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use serde::{
  Deserialize,
  Serialize
};

use crate::error::{
  LayoutError,
  Result
};

pub const MONTH_CELLS: usize = 42;
pub const WEEK_CELLS: usize = 7;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
  Month,
  Week
}

/// What the caller wants to see.
///
/// Month and day values outside their
/// usual ranges roll over the way
/// ordinary calendar arithmetic does.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(
  tag = "kind",
  rename_all = "lowercase"
)]
pub enum WindowRequest {
  Month { year: i32, month: i32 },
  Week {
    year:  i32,
    month: i32,
    day:   i32
  }
}

impl WindowRequest {
  pub fn kind(&self) -> WindowKind {
    match self {
      | Self::Month { .. } => {
        WindowKind::Month
      }
      | Self::Week { .. } => {
        WindowKind::Week
      }
    }
  }

  pub fn resolve(
    &self
  ) -> Result<CalendarWindow> {
    match *self {
      | Self::Month { year, month } => {
        month_window(year, month)
      }
      | Self::Week {
        year,
        month,
        day
      } => week_window(year, month, day)
    }
  }
}

/// The ordered, consecutive boundary
/// dates of a visible window.
///
/// Only built by [`month_window`] and
/// [`week_window`], so the first date is
/// always a Monday and the length is
/// always 42 or 7.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct CalendarWindow {
  kind:           WindowKind,
  anchor:         NaiveDate,
  boundary_dates: Vec<NaiveDate>
}

impl CalendarWindow {
  pub fn kind(&self) -> WindowKind {
    self.kind
  }

  /// First of the requested month for
  /// month windows, the requested day
  /// for week windows.
  pub fn anchor(&self) -> NaiveDate {
    self.anchor
  }

  pub fn boundary_dates(
    &self
  ) -> &[NaiveDate] {
    &self.boundary_dates
  }

  pub fn len(&self) -> usize {
    self.boundary_dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boundary_dates.is_empty()
  }

  pub fn first(&self) -> NaiveDate {
    self.boundary_dates[0]
  }

  pub fn last(&self) -> NaiveDate {
    self.boundary_dates[self.len() - 1]
  }

  pub fn last_column(&self) -> usize {
    self.len() - 1
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date >= self.first()
      && date <= self.last()
  }

  /// Whether `[start, end]` shares at
  /// least one day with the window.
  pub fn intersects(
    &self,
    start: NaiveDate,
    end: NaiveDate
  ) -> bool {
    start <= self.last()
      && end >= self.first()
  }

  /// Column of `date`, if visible.
  pub fn column_of(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    if !self.contains(date) {
      return None;
    }
    usize::try_from(
      (date - self.first()).num_days()
    )
    .ok()
  }

  /// Column of `date` clamped into the
  /// window: 0 for days before it, the
  /// last column for days after it.
  pub fn clamped_column(
    &self,
    date: NaiveDate
  ) -> usize {
    if date <= self.first() {
      0
    } else if date >= self.last() {
      self.last_column()
    } else {
      self.column_of(date).unwrap_or(0)
    }
  }

  /// Whether `date` belongs to the month
  /// a month window was requested for.
  /// Every date of a week window counts.
  pub fn is_current_month(
    &self,
    date: NaiveDate
  ) -> bool {
    match self.kind {
      | WindowKind::Month => {
        date.year() == self.anchor.year()
          && date.month()
            == self.anchor.month()
      }
      | WindowKind::Week => {
        self.contains(date)
      }
    }
  }
}

/// The 42-day grid for `month` of
/// `year`.
#[tracing::instrument]
pub fn month_window(
  year: i32,
  month: i32
) -> Result<CalendarWindow> {
  let first =
    normalize_ymd(year, month, 1)?;
  let lead = first
    .weekday()
    .num_days_from_monday()
    as i64;
  let grid_start =
    add_days(first, -lead).ok_or(
      LayoutError::DateOutOfRange {
        year,
        month,
        day: 1
      }
    )?;

  let boundary_dates =
    consecutive_days(
      grid_start,
      MONTH_CELLS
    )
    .ok_or(
      LayoutError::DateOutOfRange {
        year,
        month,
        day: 1
      }
    )?;

  tracing::debug!(
    first = %boundary_dates[0],
    last = %boundary_dates[MONTH_CELLS - 1],
    lead,
    "built month window"
  );

  Ok(CalendarWindow {
    kind: WindowKind::Month,
    anchor: first,
    boundary_dates
  })
}

/// The Monday-to-Sunday strip
/// containing the given day.
#[tracing::instrument]
pub fn week_window(
  year: i32,
  month: i32,
  day: i32
) -> Result<CalendarWindow> {
  let out_of_range =
    LayoutError::DateOutOfRange {
      year,
      month,
      day
    };
  let date =
    normalize_ymd(year, month, day)?;
  let monday = add_days(
    date,
    -(date
      .weekday()
      .num_days_from_monday()
      as i64)
  )
  .ok_or_else(|| out_of_range.clone())?;

  let boundary_dates =
    consecutive_days(monday, WEEK_CELLS)
      .ok_or(out_of_range)?;

  tracing::debug!(
    requested = %date,
    first = %boundary_dates[0],
    "built week window"
  );

  Ok(CalendarWindow {
    kind: WindowKind::Week,
    anchor: date,
    boundary_dates
  })
}

/// Calendar normalization: month 13 is
/// January of the next year, day 0 is
/// the last day of the previous month.
pub fn normalize_ymd(
  year: i32,
  month: i32,
  day: i32
) -> Result<NaiveDate> {
  let out_of_range =
    LayoutError::DateOutOfRange {
      year,
      month,
      day
    };

  let month_offset =
    i64::from(month) - 1;
  let year = i64::from(year)
    + month_offset.div_euclid(12);
  let month =
    month_offset.rem_euclid(12) + 1;

  let year = i32::try_from(year)
    .map_err(|_| out_of_range.clone())?;
  let first = NaiveDate::from_ymd_opt(
    year,
    month as u32,
    1
  )
  .ok_or_else(|| out_of_range.clone())?;

  add_days(first, i64::from(day) - 1)
    .ok_or(out_of_range)
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    Duration::try_days(days)?
  )
}

fn consecutive_days(
  start: NaiveDate,
  count: usize
) -> Option<Vec<NaiveDate>> {
  let mut out =
    Vec::with_capacity(count);
  let mut day = start;
  for idx in 0..count {
    if idx > 0 {
      day = day.succ_opt()?;
    }
    out.push(day);
  }
  Some(out)
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn assert_well_formed(
    window: &CalendarWindow
  ) {
    assert_eq!(
      window.first().weekday(),
      Weekday::Mon
    );
    for pair in
      window.boundary_dates().windows(2)
    {
      assert_eq!(
        pair[0].succ_opt(),
        Some(pair[1])
      );
    }
  }

  #[test]
  fn month_window_has_six_full_weeks() {
    for (year, month) in [
      (2024, 2),
      (2023, 2),
      (2024, 3),
      (2024, 12),
      (2025, 6),
      (2026, 2)
    ] {
      let window =
        month_window(year, month)
          .expect("month window");
      assert_eq!(
        window.len(),
        MONTH_CELLS
      );
      assert_well_formed(&window);
    }
  }

  #[test]
  fn month_window_pads_previous_month() {
    // March 2024 starts on a Friday.
    let window = month_window(2024, 3)
      .expect("month window");
    assert_eq!(
      window.first(),
      date(2024, 2, 26)
    );
    assert_eq!(
      window.boundary_dates()[4],
      date(2024, 3, 1)
    );
    assert_eq!(
      window.last(),
      date(2024, 4, 7)
    );
  }

  #[test]
  fn month_starting_on_monday_has_no_lead()
  {
    // April 2024 starts on a Monday.
    let window = month_window(2024, 4)
      .expect("month window");
    assert_eq!(
      window.first(),
      date(2024, 4, 1)
    );
    assert_eq!(
      window.last(),
      date(2024, 5, 12)
    );
  }

  #[test]
  fn month_thirteen_rolls_into_next_year()
  {
    let rolled = month_window(2024, 13)
      .expect("month window");
    let january = month_window(2025, 1)
      .expect("month window");
    assert_eq!(rolled, january);
    assert!(
      rolled
        .is_current_month(date(
          2025, 1, 31
        ))
    );
  }

  #[test]
  fn month_zero_rolls_into_previous_year()
  {
    let rolled = month_window(2025, 0)
      .expect("month window");
    assert_eq!(
      rolled.anchor(),
      date(2024, 12, 1)
    );
  }

  #[test]
  fn current_month_flags_padding_days() {
    let window = month_window(2024, 3)
      .expect("month window");
    assert!(
      !window.is_current_month(date(
        2024, 2, 29
      ))
    );
    assert!(
      window.is_current_month(date(
        2024, 3, 31
      ))
    );
    assert!(
      !window.is_current_month(date(
        2024, 4, 1
      ))
    );
  }

  #[test]
  fn week_window_starts_on_monday() {
    let window = week_window(2024, 3, 7)
      .expect("week window");
    assert_eq!(window.len(), WEEK_CELLS);
    assert_eq!(
      window.first(),
      date(2024, 3, 4)
    );
    assert_eq!(
      window.last(),
      date(2024, 3, 10)
    );
    assert_well_formed(&window);
  }

  #[test]
  fn week_window_on_sunday_looks_back() {
    let window = week_window(2024, 3, 10)
      .expect("week window");
    assert_eq!(
      window.first(),
      date(2024, 3, 4)
    );
  }

  #[test]
  fn week_window_crosses_year_boundary() {
    let window = week_window(2025, 1, 1)
      .expect("week window");
    assert_eq!(
      window.first(),
      date(2024, 12, 30)
    );
    assert_eq!(
      window.last(),
      date(2025, 1, 5)
    );
  }

  #[test]
  fn week_window_rolls_day_overflow() {
    let rolled = week_window(2024, 1, 32)
      .expect("week window");
    assert_eq!(
      rolled.anchor(),
      date(2024, 2, 1)
    );
    let leap = week_window(2024, 3, 0)
      .expect("week window");
    assert_eq!(
      leap.anchor(),
      date(2024, 2, 29)
    );
  }

  #[test]
  fn columns_clamp_to_window() {
    let window = week_window(2024, 3, 4)
      .expect("week window");
    assert_eq!(
      window.column_of(date(2024, 3, 6)),
      Some(2)
    );
    assert_eq!(
      window.column_of(date(2024, 3, 1)),
      None
    );
    assert_eq!(
      window
        .clamped_column(date(2024, 3, 1)),
      0
    );
    assert_eq!(
      window.clamped_column(date(
        2024, 3, 20
      )),
      6
    );
  }

  #[test]
  fn absurd_year_is_out_of_range() {
    assert!(matches!(
      month_window(i32::MAX, 12),
      Err(
        LayoutError::DateOutOfRange { .. }
      )
    ));
  }

  #[test]
  fn request_round_trips_as_tagged_json()
  {
    let request: WindowRequest =
      serde_json::from_str(
        r#"{"kind":"week","year":2024,"month":3,"day":5}"#
      )
      .expect("deserialize request");
    assert_eq!(
      request,
      WindowRequest::Week {
        year:  2024,
        month: 3,
        day:   5
      }
    );
    assert_eq!(
      request.kind(),
      WindowKind::Week
    );
  }
}
