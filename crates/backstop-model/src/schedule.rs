//! Backup schedules
//!
//! A [`Schedule`] is one of five variants and carries only the fields that
//! variant needs. The flat [`ScheduleDocument`] is what users write; parsing
//! depends on the [`PlanType`] because interval rules differ between plans.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, in_range};
use crate::keyword::Keyword;

keyword_enum! {
    /// Kind of backup plan a schedule belongs to
    pub enum PlanType {
        Standard => "STANDARD",
        PointInTime => "PITR",
        HighFrequency => "HIGH_FREQUENCY",
    }
}

keyword_enum! {
    pub enum Frequency {
        Daily => "DAILY",
        Weekly => "WEEKLY",
        Monthly => "MONTHLY",
        Annually => "ANNUALLY",
        Interval => "INTERVAL",
    }
}

keyword_enum! {
    pub enum Weekday {
        Mon => "MON",
        Tue => "TUE",
        Wed => "WED",
        Thu => "THU",
        Fri => "FRI",
        Sat => "SAT",
        Sun => "SUN",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: i64, minute: i64) -> Result<Self> {
        Ok(Self {
            hour: in_range("time_of_day.hour", hour, 0u8, 23)?,
            minute: in_range("time_of_day.minute", minute, 0u8, 59)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfYear {
    pub month: u8,
    pub day: u8,
}

impl TimeOfYear {
    pub fn new(month: i64, day: i64) -> Result<Self> {
        let month = in_range("time_of_year.month", month, 1u8, 12)?;
        let day = in_range("time_of_year.day", day, 1u8, days_in_month(month))?;
        Ok(Self { month, day })
    }
}

fn days_in_month(month: u8) -> u8 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Length of the window in which a scheduled backup may start, in minutes.
///
/// When omitted the service applies [`StartWindow::DEFAULT_MINUTES`]; the
/// value is never filled in locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StartWindow(u16);

impl StartWindow {
    pub const MIN_MINUTES: u16 = 240;
    pub const MAX_MINUTES: u16 = 1320;
    pub const DEFAULT_MINUTES: u16 = 240;

    pub fn new(minutes: i64) -> Result<Self> {
        in_range(
            "start_window_minutes",
            minutes,
            Self::MIN_MINUTES,
            Self::MAX_MINUTES,
        )
        .map(Self)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

/// The only hour intervals standard plans accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntervalHours {
    Six,
    Eight,
    Twelve,
}

impl IntervalHours {
    pub fn hours(self) -> u8 {
        match self {
            IntervalHours::Six => 6,
            IntervalHours::Eight => 8,
            IntervalHours::Twelve => 12,
        }
    }

    pub fn from_hours(hours: i64) -> Option<Self> {
        match hours {
            6 => Some(IntervalHours::Six),
            8 => Some(IntervalHours::Eight),
            12 => Some(IntervalHours::Twelve),
            _ => None,
        }
    }

    /// Smallest allowed interval that is at least `minutes` long, capped at 12h.
    pub fn round_up_minutes(minutes: u32) -> Self {
        match minutes {
            0..=360 => IntervalHours::Six,
            361..=480 => IntervalHours::Eight,
            _ => IntervalHours::Twelve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interval {
    /// High-frequency plans only.
    Minutes(u32),
    Hours(IntervalHours),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Daily {
        time_of_day: TimeOfDay,
        start_window: Option<StartWindow>,
    },
    Weekly {
        days_of_week: BTreeSet<Weekday>,
        time_of_day: TimeOfDay,
        start_window: Option<StartWindow>,
    },
    Monthly {
        days_of_month: BTreeSet<u8>,
        time_of_day: TimeOfDay,
        start_window: Option<StartWindow>,
    },
    Annually {
        time_of_year: TimeOfYear,
        time_of_day: TimeOfDay,
        start_window: Option<StartWindow>,
    },
    Interval(Interval),
}

// ============ Document shape ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScheduleDocument {
    /// One of DAILY, WEEKLY, MONTHLY, ANNUALLY or INTERVAL.
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDayDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_month: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_year: Option<TimeOfYearDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimeOfDayDocument {
    pub hour: i64,
    pub minute: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimeOfYearDocument {
    pub month: i64,
    pub day: i64,
}

impl ScheduleDocument {
    /// Fields that are set but have no meaning for `frequency`.
    fn foreign_fields(&self, frequency: Frequency) -> Vec<&'static str> {
        use Frequency as F;
        const CALENDAR: &[Frequency] = &[F::Daily, F::Weekly, F::Monthly, F::Annually];
        let fields: [(&str, bool, &[Frequency]); 7] = [
            ("time_of_day", self.time_of_day.is_some(), CALENDAR),
            ("days_of_week", self.days_of_week.is_some(), &[F::Weekly]),
            ("days_of_month", self.days_of_month.is_some(), &[F::Monthly]),
            ("time_of_year", self.time_of_year.is_some(), &[F::Annually]),
            ("interval_minutes", self.interval_minutes.is_some(), &[F::Interval]),
            ("interval_hours", self.interval_hours.is_some(), &[F::Interval]),
            ("start_window_minutes", self.start_window_minutes.is_some(), CALENDAR),
        ];
        fields
            .into_iter()
            .filter(|(_, set, allowed)| *set && !allowed.contains(&frequency))
            .map(|(name, _, _)| name)
            .collect()
    }

    fn time_of_day(&self, frequency: Frequency) -> Result<TimeOfDay> {
        let doc = self
            .time_of_day
            .ok_or_else(|| {
                ValidationError::missing("time_of_day", format!("for {frequency} schedules"))
            })?;
        TimeOfDay::new(doc.hour, doc.minute)
    }

    fn start_window(&self) -> Result<Option<StartWindow>> {
        self.start_window_minutes.map(StartWindow::new).transpose()
    }
}

impl Schedule {
    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Daily { .. } => Frequency::Daily,
            Schedule::Weekly { .. } => Frequency::Weekly,
            Schedule::Monthly { .. } => Frequency::Monthly,
            Schedule::Annually { .. } => Frequency::Annually,
            Schedule::Interval(_) => Frequency::Interval,
        }
    }

    pub fn start_window(&self) -> Option<StartWindow> {
        match self {
            Schedule::Daily { start_window, .. }
            | Schedule::Weekly { start_window, .. }
            | Schedule::Monthly { start_window, .. }
            | Schedule::Annually { start_window, .. } => *start_window,
            Schedule::Interval(_) => None,
        }
    }

    /// Parse a schedule document for a plan of type `plan`.
    ///
    /// Standard and PITR plans accept `interval_hours` of exactly 6, 8 or 12,
    /// or `interval_minutes` which is rounded up to the next allowed hour
    /// interval. High-frequency plans accept positive `interval_minutes` only.
    pub fn parse(doc: &ScheduleDocument, plan: PlanType) -> Result<Self> {
        let frequency = Frequency::parse_field("frequency", &doc.frequency)?;
        if let Some(field) = doc.foreign_fields(frequency).first() {
            return Err(ValidationError::unexpected(
                *field,
                format!("for {frequency} schedules"),
            ));
        }

        match frequency {
            Frequency::Daily => Ok(Schedule::Daily {
                time_of_day: doc.time_of_day(frequency)?,
                start_window: doc.start_window()?,
            }),
            Frequency::Weekly => {
                let days = required_list(&doc.days_of_week, "days_of_week", frequency)?;
                let days_of_week = days
                    .iter()
                    .enumerate()
                    .map(|(i, day)| Weekday::parse_field(&format!("days_of_week[{i}]"), day))
                    .collect::<Result<BTreeSet<_>>>()?;
                Ok(Schedule::Weekly {
                    days_of_week,
                    time_of_day: doc.time_of_day(frequency)?,
                    start_window: doc.start_window()?,
                })
            }
            Frequency::Monthly => {
                let days = required_list(&doc.days_of_month, "days_of_month", frequency)?;
                let days_of_month = days
                    .iter()
                    .enumerate()
                    .map(|(i, day)| in_range(&format!("days_of_month[{i}]"), *day, 1u8, 31))
                    .collect::<Result<BTreeSet<_>>>()?;
                Ok(Schedule::Monthly {
                    days_of_month,
                    time_of_day: doc.time_of_day(frequency)?,
                    start_window: doc.start_window()?,
                })
            }
            Frequency::Annually => {
                let year = doc.time_of_year.ok_or_else(|| {
                    ValidationError::missing("time_of_year", format!("for {frequency} schedules"))
                })?;
                Ok(Schedule::Annually {
                    time_of_year: TimeOfYear::new(year.month, year.day)?,
                    time_of_day: doc.time_of_day(frequency)?,
                    start_window: doc.start_window()?,
                })
            }
            Frequency::Interval => parse_interval(doc, plan).map(Schedule::Interval),
        }
    }

    pub fn to_document(&self) -> ScheduleDocument {
        let mut doc = ScheduleDocument {
            frequency: self.frequency().to_string(),
            start_window_minutes: self.start_window().map(|w| i64::from(w.minutes())),
            ..Default::default()
        };
        let time_doc = |t: &TimeOfDay| TimeOfDayDocument {
            hour: i64::from(t.hour),
            minute: i64::from(t.minute),
        };
        match self {
            Schedule::Daily { time_of_day, .. } => doc.time_of_day = Some(time_doc(time_of_day)),
            Schedule::Weekly {
                days_of_week,
                time_of_day,
                ..
            } => {
                doc.days_of_week = Some(days_of_week.iter().map(ToString::to_string).collect());
                doc.time_of_day = Some(time_doc(time_of_day));
            }
            Schedule::Monthly {
                days_of_month,
                time_of_day,
                ..
            } => {
                doc.days_of_month = Some(days_of_month.iter().map(|d| i64::from(*d)).collect());
                doc.time_of_day = Some(time_doc(time_of_day));
            }
            Schedule::Annually {
                time_of_year,
                time_of_day,
                ..
            } => {
                doc.time_of_year = Some(TimeOfYearDocument {
                    month: i64::from(time_of_year.month),
                    day: i64::from(time_of_year.day),
                });
                doc.time_of_day = Some(time_doc(time_of_day));
            }
            Schedule::Interval(Interval::Minutes(minutes)) => {
                doc.interval_minutes = Some(i64::from(*minutes))
            }
            Schedule::Interval(Interval::Hours(hours)) => {
                doc.interval_hours = Some(i64::from(hours.hours()))
            }
        }
        doc
    }
}

fn required_list<'a, T>(
    list: &'a Option<Vec<T>>,
    field: &str,
    frequency: Frequency,
) -> Result<&'a [T]> {
    match list.as_deref() {
        None => Err(ValidationError::missing(field, format!("for {frequency} schedules"))),
        Some([]) => Err(ValidationError::EmptyList {
            path: "schedule_config".to_string(),
            field: field.to_string(),
        }),
        Some(items) => Ok(items),
    }
}

fn parse_interval(doc: &ScheduleDocument, plan: PlanType) -> Result<Interval> {
    // Wire intervals are 32-bit.
    let max_minutes = i32::MAX as u32;

    if plan == PlanType::HighFrequency {
        if doc.interval_hours.is_some() {
            return Err(ValidationError::unexpected(
                "interval_hours",
                "for HIGH_FREQUENCY plans; use interval_minutes",
            ));
        }
        let minutes = doc
            .interval_minutes
            .ok_or_else(|| {
                ValidationError::missing("interval_minutes", "for HIGH_FREQUENCY plans")
            })?;
        return in_range("interval_minutes", minutes, 1u32, max_minutes).map(Interval::Minutes);
    }

    match (doc.interval_hours, doc.interval_minutes) {
        (Some(_), Some(_)) => Err(ValidationError::unexpected(
            "interval_minutes",
            "when interval_hours is set",
        )),
        (Some(hours), None) => IntervalHours::from_hours(hours)
            .map(Interval::Hours)
            .ok_or_else(|| ValidationError::UnsupportedValue {
                field: "interval_hours".to_string(),
                value: hours.to_string(),
                supported: "6, 8, 12".to_string(),
            }),
        (None, Some(minutes)) => {
            let minutes = in_range("interval_minutes", minutes, 1u32, max_minutes)?;
            Ok(Interval::Hours(IntervalHours::round_up_minutes(minutes)))
        }
        (None, None) => Err(ValidationError::missing(
            "interval_hours",
            format!("for INTERVAL schedules in {plan} plans"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(minutes: Option<i64>, hours: Option<i64>) -> ScheduleDocument {
        ScheduleDocument {
            frequency: "INTERVAL".into(),
            interval_minutes: minutes,
            interval_hours: hours,
            ..Default::default()
        }
    }

    fn daily(hour: i64, minute: i64) -> ScheduleDocument {
        ScheduleDocument {
            frequency: "DAILY".into(),
            time_of_day: Some(TimeOfDayDocument { hour, minute }),
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_interval_minutes_round_up() {
        let cases = [
            (1, IntervalHours::Six),
            (300, IntervalHours::Six),
            (360, IntervalHours::Six),
            (361, IntervalHours::Eight),
            (420, IntervalHours::Eight),
            (480, IntervalHours::Eight),
            (481, IntervalHours::Twelve),
            (600, IntervalHours::Twelve),
            (100_000, IntervalHours::Twelve),
        ];
        for (minutes, expected) in cases {
            assert_eq!(
                Schedule::parse(&interval(Some(minutes), None), PlanType::Standard).unwrap(),
                Schedule::Interval(Interval::Hours(expected)),
                "{minutes} minutes"
            );
        }
    }

    #[test]
    fn test_standard_interval_hours_must_be_allowed() {
        assert_eq!(
            Schedule::parse(&interval(None, Some(8)), PlanType::PointInTime).unwrap(),
            Schedule::Interval(Interval::Hours(IntervalHours::Eight))
        );
        assert!(matches!(
            Schedule::parse(&interval(None, Some(7)), PlanType::Standard).unwrap_err(),
            ValidationError::UnsupportedValue { ref field, .. } if field == "interval_hours"
        ));
    }

    #[test]
    fn test_standard_interval_rejects_both_fields() {
        assert!(Schedule::parse(&interval(Some(400), Some(8)), PlanType::Standard).is_err());
    }

    #[test]
    fn test_high_frequency_interval_minutes() {
        assert_eq!(
            Schedule::parse(&interval(Some(15), None), PlanType::HighFrequency).unwrap(),
            Schedule::Interval(Interval::Minutes(15))
        );
        assert!(Schedule::parse(&interval(Some(0), None), PlanType::HighFrequency).is_err());
        assert!(Schedule::parse(&interval(None, Some(6)), PlanType::HighFrequency).is_err());
    }

    #[test]
    fn test_interval_minutes_overflow_is_rejected() {
        let err = Schedule::parse(
            &interval(Some(i64::from(i32::MAX) + 1), None),
            PlanType::HighFrequency,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_daily_requires_time_of_day() {
        let doc = ScheduleDocument {
            frequency: "DAILY".into(),
            ..Default::default()
        };
        assert!(matches!(
            Schedule::parse(&doc, PlanType::Standard).unwrap_err(),
            ValidationError::MissingField { ref field, .. } if field == "time_of_day"
        ));
    }

    #[test]
    fn test_time_of_day_ranges() {
        assert!(Schedule::parse(&daily(24, 0), PlanType::Standard).is_err());
        assert!(Schedule::parse(&daily(23, 60), PlanType::Standard).is_err());
        assert!(Schedule::parse(&daily(23, 59), PlanType::Standard).is_ok());
    }

    #[test]
    fn test_start_window_is_optional_and_ranged() {
        let parsed = Schedule::parse(&daily(2, 0), PlanType::Standard).unwrap();
        assert_eq!(parsed.start_window(), None);
        assert_eq!(parsed.to_document().start_window_minutes, None);

        let mut doc = daily(2, 0);
        doc.start_window_minutes = Some(239);
        assert!(Schedule::parse(&doc, PlanType::Standard).is_err());
        doc.start_window_minutes = Some(1321);
        assert!(Schedule::parse(&doc, PlanType::Standard).is_err());
        doc.start_window_minutes = Some(1320);
        assert!(Schedule::parse(&doc, PlanType::Standard).is_ok());
    }

    #[test]
    fn test_weekly_requires_days() {
        let mut doc = ScheduleDocument {
            frequency: "WEEKLY".into(),
            time_of_day: Some(TimeOfDayDocument { hour: 1, minute: 0 }),
            ..Default::default()
        };
        assert!(Schedule::parse(&doc, PlanType::Standard).is_err());
        doc.days_of_week = Some(vec![]);
        assert!(Schedule::parse(&doc, PlanType::Standard).is_err());
        doc.days_of_week = Some(vec!["SAT".into(), "MON".into()]);
        let parsed = Schedule::parse(&doc, PlanType::Standard).unwrap();
        assert_eq!(
            parsed.to_document().days_of_week,
            Some(vec!["MON".to_string(), "SAT".to_string()])
        );
    }

    #[test]
    fn test_annual_day_respects_month_length() {
        let doc = |month, day| ScheduleDocument {
            frequency: "ANNUALLY".into(),
            time_of_day: Some(TimeOfDayDocument { hour: 0, minute: 0 }),
            time_of_year: Some(TimeOfYearDocument { month, day }),
            ..Default::default()
        };
        assert!(Schedule::parse(&doc(2, 29), PlanType::Standard).is_ok());
        assert!(Schedule::parse(&doc(4, 31), PlanType::Standard).is_err());
        assert!(Schedule::parse(&doc(13, 1), PlanType::Standard).is_err());
    }

    #[test]
    fn test_fields_of_other_frequencies_are_rejected() {
        let mut doc = daily(3, 30);
        doc.interval_hours = Some(6);
        assert!(matches!(
            Schedule::parse(&doc, PlanType::Standard).unwrap_err(),
            ValidationError::UnexpectedField { ref field, .. } if field == "interval_hours"
        ));
    }

    #[test]
    fn test_monthly_round_trip() {
        let doc = ScheduleDocument {
            frequency: "MONTHLY".into(),
            time_of_day: Some(TimeOfDayDocument { hour: 4, minute: 15 }),
            days_of_month: Some(vec![1, 15, 28]),
            start_window_minutes: Some(300),
            ..Default::default()
        };
        let parsed = Schedule::parse(&doc, PlanType::Standard).unwrap();
        assert_eq!(parsed.to_document(), doc);
    }
}
