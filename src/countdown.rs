use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// Remaining time to a target instant, split the way the countdown
/// renders it. All components are zero once the target has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// True for the first 24 hours after the target.
    pub is_anniversary: bool,
}

impl TimeLeft {
    pub const ZERO: TimeLeft = TimeLeft {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        is_anniversary: false,
    };

    pub fn milestone(&self) -> Option<Milestone> {
        match (self.days, self.hours, self.minutes, self.seconds) {
            (1, 0, 0, 0) => Some(Milestone::OneDay),
            (0, 0, 1, 0) => Some(Milestone::OneMinute),
            _ => None,
        }
    }
}

/// Crossings the countdown celebrates. Exact component matches only;
/// a tick that jumps over one (a tab waking from sleep) stays quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    OneDay,
    OneMinute,
}

pub fn parse_target(iso: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(iso, &Rfc3339)
}

pub fn time_left(target: OffsetDateTime, now: OffsetDateTime) -> TimeLeft {
    let diff = target - now;
    if diff <= Duration::ZERO {
        return TimeLeft {
            is_anniversary: -diff < Duration::hours(24),
            ..TimeLeft::ZERO
        };
    }
    TimeLeft {
        days: diff.whole_days(),
        hours: diff.whole_hours() % 24,
        minutes: diff.whole_minutes() % 60,
        seconds: diff.whole_seconds() % 60,
        is_anniversary: false,
    }
}

/// Human form of a stored target, or None when the stored string does
/// not parse (documents edited by hand, mostly).
pub fn format_target_display(iso: &str) -> Option<String> {
    let target = parse_target(iso).ok()?;
    let description = format_description!(
        "[weekday], [month repr:long] [day padding:none], [year] at \
         [hour repr:12 padding:none]:[minute] [period]"
    );
    target.format(&description).ok()
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("utc timestamps always format")
}
