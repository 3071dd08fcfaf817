//! Schedule values <-> wire schedule configs

use backstop_api as api;
use backstop_model::schedule::{TimeOfDayDocument, TimeOfYearDocument};
use backstop_model::{Frequency, Interval, Keyword, Schedule, ScheduleDocument, TimeOfDay};

pub(crate) fn to_wire(schedule: &Schedule) -> api::ScheduleConfig {
    let window = schedule.start_window().map(|w| i32::from(w.minutes()));
    let time = |t: &TimeOfDay| api::TimeOfDay {
        hour: i32::from(t.hour),
        minutes: i32::from(t.minute),
    };

    let mut config = api::ScheduleConfig {
        frequency: schedule.frequency().to_string(),
        ..Default::default()
    };
    match schedule {
        Schedule::Daily { time_of_day, .. } => {
            config.daily_config = Some(api::DailyConfig {
                time_of_day: time(time_of_day),
                start_window_minutes: window,
            });
        }
        Schedule::Weekly {
            days_of_week,
            time_of_day,
            ..
        } => {
            config.weekly_config = Some(api::WeeklyConfig {
                days_of_week: days_of_week.iter().map(ToString::to_string).collect(),
                time_of_day: time(time_of_day),
                start_window_minutes: window,
            });
        }
        Schedule::Monthly {
            days_of_month,
            time_of_day,
            ..
        } => {
            config.monthly_config = Some(api::MonthlyConfig {
                days_of_month: days_of_month.iter().map(|d| i32::from(*d)).collect(),
                time_of_day: time(time_of_day),
                start_window_minutes: window,
            });
        }
        Schedule::Annually {
            time_of_year,
            time_of_day,
            ..
        } => {
            config.annually_config = Some(api::AnnuallyConfig {
                time_of_year: api::TimeOfYear {
                    month: i32::from(time_of_year.month),
                    day_of_month: i32::from(time_of_year.day),
                },
                time_of_day: time(time_of_day),
                start_window_minutes: window,
            });
        }
        Schedule::Interval(Interval::Minutes(minutes)) => {
            config.interval_config = Some(api::IntervalConfig {
                // Parsing caps minutes at i32::MAX.
                interval_minutes: Some(i32::try_from(*minutes).unwrap_or(i32::MAX)),
                interval_hours: None,
            });
        }
        Schedule::Interval(Interval::Hours(hours)) => {
            config.interval_config = Some(api::IntervalConfig {
                interval_hours: Some(i32::from(hours.hours())),
                interval_minutes: None,
            });
        }
    }
    config
}

/// Lift a wire config into a schedule document.
///
/// Only the sub-config named by `frequency` is read. An unknown frequency is
/// passed through so that parsing reports it.
pub(crate) fn from_wire(config: &api::ScheduleConfig) -> ScheduleDocument {
    let mut doc = ScheduleDocument {
        frequency: config.frequency.clone(),
        ..Default::default()
    };
    let time = |t: &api::TimeOfDay| {
        Some(TimeOfDayDocument {
            hour: i64::from(t.hour),
            minute: i64::from(t.minutes),
        })
    };

    match Frequency::from_keyword(&config.frequency) {
        Some(Frequency::Daily) => {
            if let Some(daily) = &config.daily_config {
                doc.time_of_day = time(&daily.time_of_day);
                doc.start_window_minutes = daily.start_window_minutes.map(i64::from);
            }
        }
        Some(Frequency::Weekly) => {
            if let Some(weekly) = &config.weekly_config {
                doc.days_of_week = Some(weekly.days_of_week.clone());
                doc.time_of_day = time(&weekly.time_of_day);
                doc.start_window_minutes = weekly.start_window_minutes.map(i64::from);
            }
        }
        Some(Frequency::Monthly) => {
            if let Some(monthly) = &config.monthly_config {
                doc.days_of_month =
                    Some(monthly.days_of_month.iter().map(|d| i64::from(*d)).collect());
                doc.time_of_day = time(&monthly.time_of_day);
                doc.start_window_minutes = monthly.start_window_minutes.map(i64::from);
            }
        }
        Some(Frequency::Annually) => {
            if let Some(annually) = &config.annually_config {
                doc.time_of_year = Some(TimeOfYearDocument {
                    month: i64::from(annually.time_of_year.month),
                    day: i64::from(annually.time_of_year.day_of_month),
                });
                doc.time_of_day = time(&annually.time_of_day);
                doc.start_window_minutes = annually.start_window_minutes.map(i64::from);
            }
        }
        Some(Frequency::Interval) => {
            if let Some(interval) = &config.interval_config {
                doc.interval_hours = interval.interval_hours.map(i64::from);
                doc.interval_minutes = interval.interval_minutes.map(i64::from);
            }
        }
        None => {}
    }
    doc
}
