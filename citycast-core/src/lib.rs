//! Core library for the `citycast` CLI.
//!
//! This crate defines:
//! - City resolution through a remote directory, backed by a persistent cache
//! - Forecast retrieval for an optional date window
//! - Chart and daily-card projections of a forecast
//! - View state with invocation tokens and chart lifetime handling
//!
//! It is used by `citycast-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod icon;
pub mod invocation;
pub mod model;
pub mod pipeline;
pub mod projector;
pub mod provider;
pub mod resolver;
pub mod view;

pub use cache::{FileStore, KeyValueStore, LocationCache, MemoryStore};
pub use chart::{ChartSlot, ChartTarget};
pub use config::Config;
pub use error::ForecastError;
pub use icon::{IconCategory, classify};
pub use invocation::{InvocationToken, InvocationTracker};
pub use model::{
    ChartProjection, CurrentWeather, DailyCard, DailySeries, DateWindow, ForecastPayload,
    HourlySeries, LocationRecord, ViewMode,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use projector::{Projections, project, project_chart, project_chart_next_24h, project_daily};
pub use provider::{CityDirectory, ForecastProvider};
pub use resolver::LocationResolver;
pub use view::{LoadOutcome, ViewState, WeatherView};
