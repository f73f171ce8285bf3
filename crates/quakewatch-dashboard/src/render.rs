//! Table rendering via `minijinja`.
//!
//! The summary table and the closest-city rows are HTML templates compiled
//! into the binary. Operators can restyle them without recompiling by
//! pointing `display.template_dir` at a directory holding replacement
//! `summary.html` and/or `city_row.html` files. Every interpolated value
//! is HTML-escaped.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use minijinja::{AutoEscape, Environment, context};
use quakewatch_types::{ClosestCity, EarthquakeSnapshot};
use serde::Serialize;

use crate::error::DashboardError;
use crate::labels::Labels;

const SUMMARY: &str = "summary.html";
const CITY_ROW: &str = "city_row.html";

/// Display format for timestamps (`DD.MM.YYYY HH:mm:ss`, local time).
const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// One label/value row of the summary table.
#[derive(Debug, Serialize)]
struct SummaryRow {
    label: &'static str,
    value: String,
}

/// Preformatted closest-city cells.
#[derive(Debug, Serialize)]
struct CityCells {
    name: String,
    code: String,
    distance: String,
    population: u64,
}

/// Renders snapshot tables into HTML fragments.
pub struct Renderer {
    env: Environment<'static>,
    labels: &'static Labels,
}

impl Renderer {
    /// Create a renderer using the built-in templates.
    pub fn new(labels: &'static Labels) -> Result<Self, DashboardError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template(SUMMARY, include_str!("../templates/summary.html"))?;
        env.add_template(CITY_ROW, include_str!("../templates/city_row.html"))?;
        Ok(Self { env, labels })
    }

    /// Create a renderer whose templates may be replaced from `dir`.
    ///
    /// Files missing from `dir` fall back to the built-in templates.
    pub fn with_template_dir(labels: &'static Labels, dir: &Path) -> Result<Self, DashboardError> {
        let mut renderer = Self::new(labels)?;
        for name in [SUMMARY, CITY_ROW] {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|e| {
                DashboardError::Template(format!("failed to read {}: {e}", path.display()))
            })?;
            renderer.env.add_template_owned(name, source)?;
            tracing::info!(template = name, path = %path.display(), "template override loaded");
        }
        Ok(renderer)
    }

    /// Labels this renderer was built with.
    pub const fn labels(&self) -> &'static Labels {
        self.labels
    }

    /// Render the summary table for a snapshot.
    pub fn summary_table(&self, snapshot: &EarthquakeSnapshot) -> Result<String, DashboardError> {
        let names = &self.labels.summary_rows;
        let next = snapshot
            .next_earthquake
            .map_or_else(|| self.labels.no_prediction.to_owned(), format_timestamp);

        let rows = [
            SummaryRow {
                label: names.average_magnitude,
                value: format!("{:.2}", snapshot.average_magnitude),
            },
            SummaryRow {
                label: names.next_earthquake,
                value: next,
            },
            SummaryRow {
                label: names.depth,
                value: snapshot.earthquake_depth.to_string(),
            },
            SummaryRow {
                label: names.location,
                value: snapshot.earthquake_location.clone(),
            },
            SummaryRow {
                label: names.magnitude,
                value: snapshot.earthquake_magnitude.to_string(),
            },
            SummaryRow {
                label: names.recent_count,
                value: snapshot.recent_earthquake_count.to_string(),
            },
            SummaryRow {
                label: names.last_update,
                value: format_timestamp(snapshot.last_update),
            },
            SummaryRow {
                label: names.today,
                value: format_timestamp(snapshot.today_date),
            },
        ];

        let html = self
            .env
            .get_template(SUMMARY)?
            .render(context! { headings => self.labels.summary_headings, rows => rows })?;
        Ok(html)
    }

    /// Render one closest-city table row.
    pub fn city_row(&self, city: &ClosestCity) -> Result<String, DashboardError> {
        let cells = CityCells {
            name: city.name.clone(),
            code: city.city_code.to_string(),
            distance: format!("{:.2}", city.distance),
            population: city.population,
        };
        let html = self
            .env
            .get_template(CITY_ROW)?
            .render(context! { city => cells })?;
        Ok(html)
    }
}

/// Format a timestamp for display in local time.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use quakewatch_types::{CityCode, Reading};

    use super::*;
    use crate::labels::{EN, TR};

    fn snapshot() -> EarthquakeSnapshot {
        let ts = Utc
            .with_ymd_and_hms(2030, 3, 4, 5, 6, 7)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        EarthquakeSnapshot {
            average_magnitude: 2.345_678,
            next_earthquake: Some(ts),
            earthquake_depth: Reading::Number(7.5),
            earthquake_location: "MARMARA DENIZI".to_owned(),
            earthquake_magnitude: 4.2,
            recent_earthquake_count: 42,
            last_update: ts,
            today_date: ts,
            closest_cities: Vec::new(),
        }
    }

    #[test]
    fn summary_contains_formatted_values() {
        let renderer = Renderer::new(&TR).unwrap();
        let snap = snapshot();
        let html = renderer.summary_table(&snap).unwrap();

        assert!(html.contains("<td>2.35</td>"));
        assert!(html.contains("<td>7.5</td>"));
        assert!(html.contains("<td>MARMARA DENIZI</td>"));
        assert!(html.contains("<td>4.2</td>"));
        assert!(html.contains("<td>42</td>"));
        assert!(html.contains(&format_timestamp(snap.last_update)));
        assert!(html.contains("Ortalama Büyüklük (Mag)"));
        assert_eq!(html.matches("<tr>").count(), 9, "header row plus eight data rows");
    }

    #[test]
    fn missing_prediction_uses_label() {
        let renderer = Renderer::new(&EN).unwrap();
        let mut snap = snapshot();
        snap.next_earthquake = None;
        let html = renderer.summary_table(&snap).unwrap();
        assert!(html.contains("No prediction available"));
    }

    #[test]
    fn location_is_escaped() {
        let renderer = Renderer::new(&EN).unwrap();
        let mut snap = snapshot();
        snap.earthquake_location = "<script>alert(1)</script>".to_owned();
        let html = renderer.summary_table(&snap).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn city_distance_has_two_decimals() {
        let renderer = Renderer::new(&EN).unwrap();
        let a = ClosestCity {
            name: "A".to_owned(),
            city_code: CityCode::Number(1),
            distance: 12.345,
            population: 100,
        };
        let b = ClosestCity {
            name: "B".to_owned(),
            city_code: CityCode::Number(2),
            distance: 0.5,
            population: 50,
        };

        let row_a = renderer.city_row(&a).unwrap();
        let row_b = renderer.city_row(&b).unwrap();
        assert!(row_a.contains("<td>12.35 m</td>"));
        assert!(row_a.contains("<td>A</td>"));
        assert!(row_a.contains("<td>100</td>"));
        assert!(row_b.contains("<td>0.50 m</td>"));
        assert!(row_b.contains("<td>2</td>"));
    }

    #[test]
    fn template_dir_overrides_city_row() {
        let unique = format!(
            "quakewatch_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("city_row.html"), "<tr class=\"city\"><td>{{ city.name }}</td></tr>").ok();

        let renderer = Renderer::with_template_dir(&EN, &dir).unwrap();
        let city = ClosestCity {
            name: "Izmir".to_owned(),
            city_code: CityCode::Number(35),
            distance: 1.0,
            population: 1,
        };
        let row = renderer.city_row(&city).unwrap();
        assert_eq!(row, "<tr class=\"city\"><td>Izmir</td></tr>");

        // The summary template was not overridden.
        let html = renderer.summary_table(&snapshot()).unwrap();
        assert!(html.contains("table-bordered"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
