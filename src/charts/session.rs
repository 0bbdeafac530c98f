use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::series::{ChartMetric, Grouping, Series};

pub const DEFAULT_PALETTE: [&str; 25] = [
    "#4285F4", "#EA4335", "#FBBC05", "#34A853", "#7065A2", "#FF6D01", "#00A4EF", "#F25022",
    "#7FBA00", "#8BC34A", "#03A9F4", "#FF5722", "#9C27B0", "#673AB7", "#3F51B5", "#2196F3",
    "#00BCD4", "#009688", "#4CAF50", "#CDDC39", "#FFEB3B", "#FFC107", "#FF9800", "#795548",
    "#9E9E9E",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("a chart is already displayed; replace or dispose it first")]
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub color: String,
    pub series: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub metric: ChartMetric,
    pub grouping: Grouping,
    pub datasets: Vec<Dataset>,
}

/// Owns the one chart on screen and the colors its datasets hold.
///
/// Colors come from the palette first; once it is used up, extra colors are
/// generated so no two live datasets share one.
#[derive(Debug, Clone)]
pub struct ChartSession {
    palette: Vec<String>,
    used: BTreeSet<String>,
    generated: u32,
    current: Option<Chart>,
}

impl Default for ChartSession {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ChartSession {
    pub fn new(palette: Vec<String>) -> Self {
        Self {
            palette,
            used: BTreeSet::new(),
            generated: 0,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Chart> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn create(
        &mut self,
        metric: ChartMetric,
        grouping: Grouping,
        series: Vec<(String, Series)>,
    ) -> Result<&Chart, ChartError> {
        if self.current.is_some() {
            return Err(ChartError::AlreadyActive);
        }
        let chart = self.build(metric, grouping, series);
        Ok(self.current.insert(chart))
    }

    /// Dispose whatever is displayed, then create.
    pub fn replace(
        &mut self,
        metric: ChartMetric,
        grouping: Grouping,
        series: Vec<(String, Series)>,
    ) -> &Chart {
        self.dispose();
        let chart = self.build(metric, grouping, series);
        self.current.insert(chart)
    }

    fn build(&mut self, metric: ChartMetric, grouping: Grouping, series: Vec<(String, Series)>) -> Chart {
        let datasets = series
            .into_iter()
            .map(|(label, series)| Dataset {
                color: self.acquire_color(),
                label,
                series,
            })
            .collect();
        Chart {
            metric,
            grouping,
            datasets,
        }
    }

    /// Drop the current chart and release its colors.
    pub fn dispose(&mut self) -> Option<Chart> {
        let chart = self.current.take()?;
        for dataset in &chart.datasets {
            self.used.remove(&dataset.color);
        }
        debug!("Disposed chart with {} datasets", chart.datasets.len());
        Some(chart)
    }

    fn acquire_color(&mut self) -> String {
        if let Some(color) = self.palette.iter().find(|c| !self.used.contains(*c)).cloned() {
            self.used.insert(color.clone());
            return color;
        }

        loop {
            let color = generated_color(self.generated);
            self.generated = self.generated.wrapping_add(1);
            if self.used.insert(color.clone()) {
                return color;
            }
        }
    }
}

/// Spread hues by the golden angle so consecutive colors stay far apart.
fn generated_color(n: u32) -> String {
    let hue = (n as f64 * 137.508) % 360.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.65, 0.9);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasets(n: usize) -> Vec<(String, Series)> {
        (0..n)
            .map(|i| (format!("Team {}", i + 1), Series::default()))
            .collect()
    }

    fn colors(chart: &Chart) -> Vec<String> {
        chart.datasets.iter().map(|d| d.color.clone()).collect()
    }

    #[test]
    fn test_create_fails_while_active() {
        let mut session = ChartSession::default();
        session.create(ChartMetric::Total, Grouping::PerMatch, datasets(2)).unwrap();
        assert_eq!(
            session.create(ChartMetric::Auto, Grouping::PerMatch, datasets(1)).unwrap_err(),
            ChartError::AlreadyActive
        );
        assert_eq!(session.current().unwrap().metric, ChartMetric::Total);
    }

    #[test]
    fn test_dispose_releases_colors() {
        let mut session = ChartSession::default();
        let first = colors(session.create(ChartMetric::Total, Grouping::PerMatch, datasets(3)).unwrap());
        assert_eq!(first, vec!["#4285F4", "#EA4335", "#FBBC05"]);

        assert!(session.dispose().is_some());
        assert!(!session.is_active());
        assert!(session.dispose().is_none());

        let second = colors(session.create(ChartMetric::Total, Grouping::PerMatch, datasets(3)).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_replace_reuses_palette() {
        let mut session = ChartSession::default();
        session.create(ChartMetric::Total, Grouping::PerMatch, datasets(2)).unwrap();
        let chart = session.replace(ChartMetric::Defense, Grouping::Average, datasets(2));
        assert_eq!(chart.metric, ChartMetric::Defense);
        assert_eq!(colors(chart), vec!["#4285F4", "#EA4335"]);
    }

    #[test]
    fn test_colors_distinct_past_palette() {
        let mut session = ChartSession::default();
        let chart = session.create(ChartMetric::Total, Grouping::PerMatch, datasets(40)).unwrap();
        let unique: BTreeSet<String> = colors(chart).into_iter().collect();
        assert_eq!(unique.len(), 40);
    }
}
