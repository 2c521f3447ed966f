use crate::domain::chart::ChartSettings;
use crate::domain::fixed_buffer::BufferError;
use crate::domain::line::VariableConfig;
use crate::domain::series::{DEFAULT_HISTORY_LIMIT, Series};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "DASHBOARD";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("chart variable `{0}` is configured more than once")]
    DuplicateVariable(String),
    #[error("chart variable `{variable}` has min {min} above max {max}")]
    InvertedDomain { variable: String, min: f64, max: f64 },
    #[error("chart setting `{0}` must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Origin of the local CouchDB-compatible server.
    pub url: String,
    pub name: String,
    /// Database to replicate from at startup.
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl DatabaseSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartFileConfig {
    #[serde(default)]
    pub settings: ChartFileSettings,
    #[serde(default)]
    pub variables: Vec<VariableEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartFileSettings {
    pub line_limit: usize,
    /// Per-line memory cap. Unset keeps the built-in default.
    pub history_limit: Option<usize>,
    pub tick_interval_secs: u64,
    pub utc_offset_minutes: i32,
    pub width: u32,
    pub height: u32,
    /// Fixed eviction seed, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ChartFileSettings {
    fn default() -> Self {
        Self {
            line_limit: 500,
            history_limit: None,
            tick_interval_secs: 5,
            utc_offset_minutes: 0,
            width: 800,
            height: 600,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VariableEntry {
    pub variable: String,
    pub title: String,
    #[serde(default)]
    pub unit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub color: String,
}

impl ChartFileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;
        for (name, value) in [
            ("line_limit", settings.line_limit as u64),
            ("history_limit", settings.history_limit.map_or(1, |n| n as u64)),
            ("tick_interval_secs", settings.tick_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.variables {
            if !seen.insert(entry.variable.as_str()) {
                return Err(ConfigError::DuplicateVariable(entry.variable.clone()));
            }
            if let (Some(min), Some(max)) = (entry.min, entry.max) {
                if min > max {
                    return Err(ConfigError::InvertedDomain {
                        variable: entry.variable.clone(),
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn variable_configs(&self) -> Vec<VariableConfig> {
        self.variables
            .iter()
            .map(|entry| VariableConfig {
                variable: entry.variable.clone(),
                title: entry.title.clone(),
                unit: entry.unit.clone(),
                min: entry.min,
                max: entry.max,
                color: entry.color.clone(),
            })
            .collect()
    }

    /// Empty series for every configured variable. Eviction is seeded from
    /// entropy unless a seed is configured.
    pub fn series(&self) -> Result<Series, BufferError> {
        let configs = self.variable_configs();
        match (self.settings.history_limit, self.settings.seed) {
            (None, None) => Ok(Series::from_configs(&configs)),
            (limit, seed) => Series::with_history(
                &configs,
                limit.unwrap_or(DEFAULT_HISTORY_LIMIT.get()),
                seed,
            ),
        }
    }

    pub fn chart_settings(&self) -> ChartSettings {
        ChartSettings {
            line_limit: self.settings.line_limit,
            tick_interval: Duration::from_secs(self.settings.tick_interval_secs),
            utc_offset_minutes: self.settings.utc_offset_minutes,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR)
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_chart_config() -> anyhow::Result<ChartFileConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/chart"))
        .build()?;

    let chart: ChartFileConfig = settings.try_deserialize()?;
    chart.validate()?;
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r##"
        [settings]
        line_limit = 250
        utc_offset_minutes = -300

        [[variables]]
        variable = "air_temperature"
        title = "Air Temperature"
        unit = "°"
        min = 0
        max = 40
        color = "#DC3545"

        [[variables]]
        variable = "water_potential_hydrogen"
        title = "Water pH"
        color = "#28A745"
    "##;

    #[test]
    fn test_chart_config_parses_with_defaults() {
        let chart: ChartFileConfig = toml::from_str(CHART).unwrap();
        assert!(chart.validate().is_ok());
        assert_eq!(chart.settings.history_limit, None);

        let settings = chart.chart_settings();
        assert_eq!(settings.line_limit, 250);
        assert_eq!(settings.tick_interval, Duration::from_secs(5));
        assert_eq!(settings.utc_offset_minutes, -300);

        let variables = chart.variable_configs();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].fixed_domain(), Some((0.0, 40.0)));
        assert_eq!(variables[1].unit, "");
        assert_eq!(variables[1].fixed_domain(), None);
    }

    #[test]
    fn test_rejects_duplicate_variables() {
        let mut chart: ChartFileConfig = toml::from_str(CHART).unwrap();
        let duplicate = chart.variables[0].clone();
        chart.variables.push(duplicate);
        assert_eq!(
            chart.validate(),
            Err(ConfigError::DuplicateVariable("air_temperature".to_string()))
        );
    }

    #[test]
    fn test_rejects_inverted_domain() {
        let mut chart: ChartFileConfig = toml::from_str(CHART).unwrap();
        chart.variables[0].min = Some(50.0);
        assert_eq!(
            chart.validate(),
            Err(ConfigError::InvertedDomain {
                variable: "air_temperature".to_string(),
                min: 50.0,
                max: 40.0,
            })
        );
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut chart: ChartFileConfig = toml::from_str(CHART).unwrap();
        chart.settings.line_limit = 0;
        assert_eq!(chart.validate(), Err(ConfigError::Zero("line_limit")));

        chart.settings.line_limit = 250;
        chart.settings.history_limit = Some(0);
        assert_eq!(chart.validate(), Err(ConfigError::Zero("history_limit")));
        assert_eq!(chart.series().err(), Some(BufferError::ZeroLimit));
    }

    #[test]
    fn test_series_has_a_line_pair_per_variable() {
        let mut chart: ChartFileConfig = toml::from_str(CHART).unwrap();
        let series = chart.series().unwrap();
        assert_eq!(series.lines().len(), 4);
        assert!(series.is_empty());

        chart.settings.history_limit = Some(50);
        chart.settings.seed = Some(7);
        let series = chart.series().unwrap();
        assert_eq!(series.lines().len(), 4);
        assert!(series.is_empty());
    }

    #[test]
    fn test_dashboard_config_defaults() {
        let dashboard: DashboardConfig = toml::from_str(
            r#"
            [database]
            url = "http://localhost:5984"
            name = "environmental_data_point"
            "#,
        )
        .unwrap();
        assert_eq!(dashboard.server.bind, "0.0.0.0:8080");
        assert_eq!(dashboard.database.remote, None);
        assert_eq!(dashboard.database.poll_interval(), Duration::from_secs(5));
    }
}
