use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use citycast_core::{
    Config, DateWindow, FileStore, ForecastError, LoadOutcome, LocationCache, Pipeline, ViewMode,
    WeatherView,
};
use inquire::{Confirm, Password, Select, Text};
use tracing::{debug, warn};

use crate::render::{self, Canvas, TerminalChart};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "City weather forecasts in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Forecast for a date range, filtered to that range.
    #[value(name = "custom-range")]
    CustomRange,
    /// The next 24 hours and every day the service returns.
    #[value(name = "next-24h")]
    Next24h,
}

impl ModeArg {
    fn from_config(value: &str) -> anyhow::Result<Self> {
        <ModeArg as ValueEnum>::from_str(value, true).map_err(|_| {
            anyhow::anyhow!(
                "Unknown default_mode '{value}' in config. Supported: {}, {}.",
                ViewMode::CUSTOM_RANGE,
                ViewMode::NEXT_24H
            )
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the city directory credentials and defaults.
    Configure,

    /// Show current weather, an hourly chart and daily cards for a city.
    Show {
        /// City id in the GeoDB directory, e.g. "3453" or "Q90".
        city_id: String,

        /// Which view to build; defaults to the configured mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// First day of the range (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the range (YYYY-MM-DD); defaults to a week after today.
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Inspect the location cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached cities.
    List,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city_id,
                mode,
                start,
                end,
            } => {
                let config = Config::load()?;
                let mode = resolve_mode(&config, mode, start, end, Local::now().date_naive())?;
                show(&config, &city_id, mode).await
            }
            Command::Cache {
                action: CacheCommand::List,
            } => list_cache(),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("GeoDB (RapidAPI) key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_directory_api_key(api_key.trim().to_string());
    }

    let host = Text::new("GeoDB host:")
        .with_default(&config.directory.api_host)
        .prompt()
        .context("Failed to read API host")?;
    config.directory.api_host = host;

    let mode = Select::new(
        "Default view:",
        vec![ViewMode::CUSTOM_RANGE, ViewMode::NEXT_24H],
    )
    .prompt()
    .context("Failed to read default view")?;
    config.set_default_mode(mode);

    config.forecast.extended_hourly = Confirm::new("Request hourly humidity and wind too?")
        .with_default(config.forecast.extended_hourly)
        .prompt()
        .context("Failed to read hourly option")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config, city_id: &str, mode: ViewMode) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let canvas = Canvas::default();
    let view = WeatherView::new(pipeline, TerminalChart::new(canvas.clone()));

    let outcome = view.load(city_id, mode).await;
    let state = view.state();

    let result = match outcome {
        LoadOutcome::Ready => {
            print!("{}", render::forecast_view(&state, &canvas.contents(), &mode));
            Ok(())
        }
        LoadOutcome::Failed(err) => {
            warn!(city_id, retryable = err.is_retryable(), "Forecast load failed");
            let message = failure_message(state.error, &err);
            Err(anyhow::Error::new(err).context(message))
        }
        LoadOutcome::Superseded => {
            debug!(city_id, "Forecast load superseded");
            Err(anyhow::anyhow!("Forecast request was superseded"))
        }
    };

    view.teardown();
    result
}

/// The view's error line, plus a hint when running again may help.
fn failure_message(shown: Option<String>, err: &ForecastError) -> String {
    let message = shown.unwrap_or_else(|| err.user_message());
    if err.is_retryable() {
        format!("{message} This is usually temporary; run the command again.")
    } else {
        message
    }
}

fn list_cache() -> anyhow::Result<()> {
    let config = Config::load()?;
    let dir = config.cache_dir()?;
    let cache = LocationCache::new(Arc::new(FileStore::new(&dir)));

    let ids = cache
        .city_ids()
        .with_context(|| format!("Failed to read cache directory: {}", dir.display()))?;

    if ids.is_empty() {
        println!("No cached cities in {}", dir.display());
        return Ok(());
    }

    for id in ids {
        match cache.get(&id) {
            Some(record) => println!("{}", render::cache_line(&id, &record)),
            None => println!("{id:>10}  <unreadable entry>"),
        }
    }
    Ok(())
}

/// Pick the view mode: explicit flag, then implied by date flags, then config,
/// then custom-range. Missing range ends come from the default week.
fn resolve_mode(
    config: &Config,
    mode: Option<ModeArg>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> anyhow::Result<ViewMode> {
    let has_dates = start.is_some() || end.is_some();

    let mode = match (mode, &config.default_mode) {
        (Some(mode), _) => mode,
        (None, _) if has_dates => ModeArg::CustomRange,
        (None, Some(configured)) => ModeArg::from_config(configured)?,
        (None, None) => ModeArg::CustomRange,
    };

    match mode {
        ModeArg::Next24h => {
            if has_dates {
                bail!("--start/--end only apply to --mode custom-range");
            }
            Ok(ViewMode::Next24h)
        }
        ModeArg::CustomRange => {
            let default = DateWindow::default_from(today);
            let first = start.unwrap_or(default.start.date());
            let last = end.unwrap_or(default.end.date());
            if first > last {
                bail!("--start ({first}) must not be after --end ({last})");
            }
            Ok(ViewMode::CustomRange(DateWindow::from_dates(first, last)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_a_week_from_today() {
        let today = ymd(2024, 3, 1);
        let mode = resolve_mode(&Config::default(), None, None, None, today).unwrap();
        assert_eq!(mode, ViewMode::CustomRange(DateWindow::default_from(today)));
    }

    #[test]
    fn configured_mode_applies_without_flags() {
        let mut cfg = Config::default();
        cfg.set_default_mode("next-24h");
        let mode = resolve_mode(&cfg, None, None, None, ymd(2024, 3, 1)).unwrap();
        assert_eq!(mode, ViewMode::Next24h);
    }

    #[test]
    fn date_flags_imply_custom_range() {
        let mut cfg = Config::default();
        cfg.set_default_mode("next-24h");
        let mode = resolve_mode(&cfg, None, None, Some(ymd(2024, 3, 3)), ymd(2024, 3, 1)).unwrap();
        assert_eq!(
            mode,
            ViewMode::CustomRange(DateWindow::from_dates(ymd(2024, 3, 1), ymd(2024, 3, 3)))
        );
    }

    #[test]
    fn rejects_inverted_range_and_dates_with_next_24h() {
        let cfg = Config::default();
        let today = ymd(2024, 3, 1);

        let err = resolve_mode(&cfg, None, Some(ymd(2024, 3, 5)), Some(ymd(2024, 3, 2)), today)
            .unwrap_err();
        assert!(err.to_string().contains("must not be after"));

        let err = resolve_mode(&cfg, Some(ModeArg::Next24h), Some(today), None, today).unwrap_err();
        assert!(err.to_string().contains("custom-range"));
    }

    #[test]
    fn unknown_configured_mode_errors() {
        let mut cfg = Config::default();
        cfg.set_default_mode("weekly");
        let err = resolve_mode(&cfg, None, None, None, ymd(2024, 3, 1)).unwrap_err();
        assert!(err.to_string().contains("Unknown default_mode"));
    }

    #[test]
    fn failure_message_hints_only_for_retryable_errors() {
        let network = ForecastError::Network("status 503".into());
        let msg = failure_message(Some(network.user_message()), &network);
        assert!(msg.starts_with("Could not load weather data."));
        assert!(msg.ends_with("run the command again."));

        let missing = ForecastError::NotFound("Q0".into());
        assert_eq!(failure_message(None, &missing), "No city found for id 'Q0'.");
    }

    #[test]
    fn cli_parses_show() {
        let cli = Cli::try_parse_from([
            "citycast", "show", "3453", "--mode", "custom-range", "--start", "2024-03-01",
        ])
        .unwrap();

        match cli.command {
            Command::Show { city_id, mode, start, end } => {
                assert_eq!(city_id, "3453");
                assert_eq!(mode, Some(ModeArg::CustomRange));
                assert_eq!(start, Some(ymd(2024, 3, 1)));
                assert!(end.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
