//! View-side state for one city page.
//!
//! Each `load` is an invocation: only the most recent one may write state or
//! touch the chart, and a run either lands completely or leaves only an error
//! message behind.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    chart::{ChartSlot, ChartTarget},
    error::ForecastError,
    invocation::InvocationTracker,
    model::{ChartProjection, DailyCard, ForecastPayload, LocationRecord, ViewMode},
    pipeline::{Pipeline, PipelineOutput},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub location: Option<LocationRecord>,
    pub forecast: Option<ForecastPayload>,
    pub chart: Option<ChartProjection>,
    pub daily: Vec<DailyCard>,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Ready,
    Failed(ForecastError),
    /// A newer load started before this one finished; nothing was applied.
    Superseded,
}

pub struct WeatherView<T: ChartTarget> {
    pipeline: Pipeline,
    tracker: InvocationTracker,
    state: Mutex<ViewState>,
    chart: Mutex<ChartSlot<T>>,
}

impl<T: ChartTarget> WeatherView<T> {
    pub fn new(pipeline: Pipeline, target: T) -> Self {
        Self {
            pipeline,
            tracker: InvocationTracker::new(),
            state: Mutex::new(ViewState::default()),
            chart: Mutex::new(ChartSlot::new(target)),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state.lock().clone()
    }

    pub async fn load(&self, city_id: &str, mode: ViewMode) -> LoadOutcome {
        let token = self.tracker.begin();
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }

        match self.pipeline.run(city_id, &mode, &token).await {
            Ok(Some(output)) => {
                self.apply(output, &mode);
                LoadOutcome::Ready
            }
            Ok(None) => LoadOutcome::Superseded,
            Err(err) => {
                warn!(city_id, error = %err, "Forecast pipeline failed");
                self.chart.lock().clear();
                *self.state.lock() = ViewState {
                    error: Some(err.user_message()),
                    ..ViewState::default()
                };
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Stop accepting results from in-flight loads and release the chart.
    pub fn teardown(&self) {
        debug!("Tearing down weather view");
        self.tracker.cancel_all();
        self.chart.lock().clear();
        self.state.lock().loading = false;
    }

    fn apply(&self, output: PipelineOutput, mode: &ViewMode) {
        let PipelineOutput {
            location,
            forecast,
            projections,
        } = output;

        self.chart
            .lock()
            .render(&chart_title(mode), &projections.chart);

        *self.state.lock() = ViewState {
            loading: false,
            error: None,
            location: Some(location),
            forecast: Some(forecast),
            chart: Some(projections.chart),
            daily: projections.daily,
        };
    }
}

pub fn chart_title(mode: &ViewMode) -> String {
    match mode {
        ViewMode::CustomRange(window) => format!(
            "Temperature forecast ({} - {})",
            window.start.format(DATE_FORMAT),
            window.end.format(DATE_FORMAT)
        ),
        ViewMode::Next24h => "Temperature forecast (next 24h)".to_string(),
    }
}
