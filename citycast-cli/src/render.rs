//! Terminal rendering of the forecast view.

use std::sync::Arc;

use citycast_core::{
    ChartProjection, ChartTarget, LocationRecord, ViewMode, ViewState, classify,
};
use parking_lot::Mutex;

const CHART_HEIGHT: usize = 8;
const CHART_MAX_WIDTH: usize = 96;
const AXIS_WIDTH: usize = 6;
const LABEL_EVERY: usize = 6;

/// Text area the chart is drawn into; shared between the chart target and the printer.
#[derive(Debug, Clone, Default)]
pub struct Canvas(Arc<Mutex<Option<String>>>);

impl Canvas {
    pub fn contents(&self) -> String {
        self.0.lock().clone().unwrap_or_default()
    }
}

/// Draws temperature line charts as text.
#[derive(Debug)]
pub struct TerminalChart {
    canvas: Canvas,
    next_id: u64,
    live: Option<u64>,
}

impl TerminalChart {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            next_id: 0,
            live: None,
        }
    }
}

impl ChartTarget for TerminalChart {
    type Handle = u64;

    fn create(&mut self, title: &str, projection: &ChartProjection) -> u64 {
        self.next_id += 1;
        self.live = Some(self.next_id);
        *self.canvas.0.lock() = Some(draw_chart(title, projection));
        self.next_id
    }

    fn dispose(&mut self, handle: u64) {
        if self.live == Some(handle) {
            self.live = None;
            *self.canvas.0.lock() = None;
        }
    }
}

pub fn draw_chart(title: &str, projection: &ChartProjection) -> String {
    let mut lines = vec![title.to_string()];

    if projection.is_empty() {
        lines.push("  (no hourly data in this range)".to_string());
        return lines.join("\n") + "\n";
    }

    let step = projection.len().div_ceil(CHART_MAX_WIDTH);
    let columns: Vec<(&str, f64)> = projection
        .labels
        .iter()
        .zip(&projection.values)
        .step_by(step)
        .map(|(label, value)| (label.as_str(), *value))
        .collect();

    let min = columns.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = columns.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(f64::EPSILON);
    let row_of = |v: f64| ((v - min) / span * (CHART_HEIGHT - 1) as f64).round() as usize;

    for row in (0..CHART_HEIGHT).rev() {
        let axis = if row == CHART_HEIGHT - 1 {
            format!("{max:>AXIS_WIDTH$.1}")
        } else if row == 0 {
            format!("{min:>AXIS_WIDTH$.1}")
        } else {
            " ".repeat(AXIS_WIDTH)
        };
        let plot: String = columns
            .iter()
            .map(|(_, v)| if row_of(*v) == row { '•' } else { ' ' })
            .collect();
        lines.push(format!("{axis} │{}", plot.trim_end()));
    }

    lines.push(format!("{} └{}", " ".repeat(AXIS_WIDTH), "─".repeat(columns.len())));

    let mut axis_labels = String::new();
    for (i, (label, _)) in columns.iter().enumerate().step_by(LABEL_EVERY) {
        while axis_labels.len() < i {
            axis_labels.push(' ');
        }
        axis_labels.push_str(label.get(..2).unwrap_or(*label));
    }
    lines.push(format!("{}  {}", " ".repeat(AXIS_WIDTH), axis_labels));

    lines.join("\n") + "\n"
}

pub fn forecast_view(state: &ViewState, chart: &str, mode: &ViewMode) -> String {
    let mut out = String::new();

    if let Some(location) = &state.location {
        out.push_str(&format!("{}, {}", location.name, location.country));
        if !location.region.is_empty() {
            out.push_str(&format!(" ({})", location.region));
        }
        out.push('\n');
    }

    if let Some(forecast) = &state.forecast {
        let now = &forecast.current_weather;
        out.push_str(&format!(
            "  {} {:.1}°C  wind {:.1} km/h  at {}\n",
            classify(now.weathercode).symbol(),
            now.temperature,
            now.windspeed,
            now.time.format("%H:%M"),
        ));
    }

    out.push('\n');
    out.push_str(chart);
    out.push('\n');

    let heading = match mode {
        ViewMode::CustomRange(window) => format!(
            "Daily forecast ({} - {})",
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d")
        ),
        ViewMode::Next24h => "Daily forecast".to_string(),
    };
    out.push_str(&heading);
    out.push('\n');

    if state.daily.is_empty() {
        out.push_str("  (no days in this range)\n");
    }
    for card in &state.daily {
        out.push_str(&format!(
            "  {}  {} {:<5}  ↑ {:.1}°C  ↓ {:.1}°C\n",
            card.date.format("%a %Y-%m-%d"),
            card.icon.symbol(),
            card.icon.label(),
            card.temp_max,
            card.temp_min,
        ));
    }

    out
}

pub fn cache_line(id: &str, record: &LocationRecord) -> String {
    format!(
        "{id:>10}  {}, {} ({:.4}, {:.4})",
        record.name, record.country_code, record.latitude, record.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(values: &[f64]) -> ChartProjection {
        ChartProjection {
            labels: (0..values.len()).map(|h| format!("{:02}:00", h % 24)).collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn empty_chart_says_so() {
        let text = draw_chart("T", &ChartProjection::default());
        assert!(text.starts_with("T\n"));
        assert!(text.contains("no hourly data"));
    }

    #[test]
    fn chart_marks_extremes_on_outer_rows() {
        let text = draw_chart("T", &projection(&[1.0, 5.0, 3.0]));
        let lines: Vec<&str> = text.lines().collect();

        // title, 8 plot rows, axis, labels
        assert_eq!(lines.len(), 1 + CHART_HEIGHT + 2);
        assert!(lines[1].starts_with("   5.0 │ •"));
        assert!(lines[CHART_HEIGHT].starts_with("   1.0 │•"));
        assert!(lines.last().unwrap().trim_start().starts_with("00"));
    }

    #[test]
    fn wide_series_is_downsampled() {
        let values: Vec<f64> = (0..192).map(|i| i as f64).collect();
        let text = draw_chart("T", &projection(&values));
        let axis = text.lines().nth(1 + CHART_HEIGHT).unwrap();
        assert_eq!(axis.chars().filter(|c| *c == '─').count(), 96);
    }

    #[test]
    fn terminal_chart_clears_canvas_on_dispose() {
        let canvas = Canvas::default();
        let mut chart = TerminalChart::new(canvas.clone());

        let first = chart.create("A", &projection(&[1.0]));
        let second = chart.create("B", &projection(&[2.0]));
        chart.dispose(first);
        assert!(canvas.contents().starts_with("B"));

        chart.dispose(second);
        assert!(canvas.contents().is_empty());
    }
}
