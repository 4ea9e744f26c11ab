use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};

const EST_OFFSET_SECS: i32 = -5 * 3600;
const EDT_OFFSET_SECS: i32 = -4 * 3600;

/// Explicit `YYYY-MM-DD` wins; otherwise today's calendar date in US/Eastern.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of-date {s:?} (expected YYYY-MM-DD)"));
    }

    let offset = eastern_offset(now_utc)?;
    Ok(now_utc.with_timezone(&offset).date_naive())
}

/// US daylight time runs from 02:00 local on the second Sunday of March to 02:00 local on the
/// first Sunday of November.
fn eastern_offset(now_utc: DateTime<Utc>) -> anyhow::Result<FixedOffset> {
    let year = now_utc.year();
    let dst_start = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)
        .context("no second Sunday in March")?
        .and_hms_opt(7, 0, 0)
        .context("invalid DST start time")?
        .and_utc();
    let dst_end = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)
        .context("no first Sunday in November")?
        .and_hms_opt(6, 0, 0)
        .context("invalid DST end time")?
        .and_utc();

    let secs = if now_utc >= dst_start && now_utc < dst_end {
        EDT_OFFSET_SECS
    } else {
        EST_OFFSET_SECS
    };
    FixedOffset::east_opt(secs).context("invalid US/Eastern offset")
}

/// Start of the news window ending at `as_of_date`.
pub fn lookback_start(as_of_date: NaiveDate, lookback_days: u32) -> NaiveDate {
    as_of_date - Duration::days(i64::from(lookback_days))
}
