//! Display projections derived from a raw forecast.
//!
//! Everything here is a pure function of the payload and the view mode. An
//! empty or inverted window produces empty projections, never an error.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

use crate::{
    icon::classify,
    model::{ChartProjection, DailyCard, DateWindow, ForecastPayload, ViewMode},
};

/// Hourly samples shown by [`ViewMode::Next24h`].
pub const NEXT_24H_SAMPLES: usize = 24;

const LABEL_FORMAT: &str = "%H:00";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projections {
    pub chart: ChartProjection,
    pub daily: Vec<DailyCard>,
}

pub fn project(payload: &ForecastPayload, mode: &ViewMode) -> Projections {
    match mode {
        ViewMode::CustomRange(window) => Projections {
            chart: project_chart(payload, window),
            daily: project_daily(payload, Some(window)),
        },
        ViewMode::Next24h => Projections {
            chart: project_chart_next_24h(payload),
            daily: project_daily(payload, None),
        },
    }
}

pub fn hour_label(t: &NaiveDateTime) -> String {
    t.format(LABEL_FORMAT).to_string()
}

/// Hourly temperatures with `window.start <= time <= window.end`, in payload order.
pub fn project_chart(payload: &ForecastPayload, window: &DateWindow) -> ChartProjection {
    collect_chart(
        hourly_samples(payload).filter(|(t, _)| window.contains(**t)),
    )
}

/// The first 24 hourly samples by position, whatever their dates. Null
/// samples among them are skipped.
pub fn project_chart_next_24h(payload: &ForecastPayload) -> ChartProjection {
    collect_chart(hourly_samples(payload).take(NEXT_24H_SAMPLES))
}

/// Daily cards, restricted to the window's days when one is given. Days with
/// a null code or temperature get no card.
pub fn project_daily(payload: &ForecastPayload, window: Option<&DateWindow>) -> Vec<DailyCard> {
    let daily = &payload.daily;
    check_lengths(
        "daily",
        &[
            daily.time.len(),
            daily.weathercode.len(),
            daily.temperature_2m_max.len(),
            daily.temperature_2m_min.len(),
        ],
    );

    daily
        .time
        .iter()
        .zip(&daily.weathercode)
        .zip(&daily.temperature_2m_max)
        .zip(&daily.temperature_2m_min)
        .filter(|(((date, _), _), _)| window.is_none_or(|w| w.contains_date(**date)))
        .filter_map(|(((date, code), max), min)| {
            Some(DailyCard {
                date: *date,
                icon: classify((*code)?),
                temp_max: (*max)?,
                temp_min: (*min)?,
            })
        })
        .collect()
}

fn hourly_samples(
    payload: &ForecastPayload,
) -> impl Iterator<Item = (&NaiveDateTime, Option<f64>)> {
    let hourly = &payload.hourly;
    check_lengths("hourly", &[hourly.time.len(), hourly.temperature_2m.len()]);
    hourly.time.iter().zip(hourly.temperature_2m.iter().copied())
}

/// Null samples are dropped after selection, so they leave a gap rather than
/// pulling in a later hour.
fn collect_chart<'a>(
    samples: impl Iterator<Item = (&'a NaiveDateTime, Option<f64>)>,
) -> ChartProjection {
    let (labels, values) = samples
        .filter_map(|(t, temp)| Some((hour_label(t), temp?)))
        .unzip();
    ChartProjection { labels, values }
}

fn check_lengths(series: &str, lengths: &[usize]) {
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        warn!(series, ?lengths, "Forecast arrays differ in length; truncating to shortest");
    }
}
