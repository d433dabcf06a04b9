extern crate anyhow;
extern crate chrono_tz;
extern crate serde;
extern crate serde_json;
extern crate serde_with;

use anyhow::Context;
use crate::result;
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

const DEFAULT_SCHEDULE_URL: &str = "http://localhost:8080/api/schedule/:stopId?maxRetry=:maxRetry";

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Meters.
    pub max_distance: f64,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub update_interval: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub update_interval_on_fail: Duration,

    // Passed through to the schedule proxy, which retries upstream on its own.
    pub max_retry: u32,

    pub max_subsequent_attempts: u32,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub notification_fade_timeout: Duration,

    pub time_zone: String,

    pub api: Api,

    pub favourites: Vec<FavouriteStop>,

    pub stop_info: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Api {
    pub url: ApiUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiUrls {
    pub schedule: String,
}

impl Default for ApiUrls {
    fn default() -> ApiUrls {
        return ApiUrls{
            schedule: DEFAULT_SCHEDULE_URL.to_string(),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavouriteStop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for Config {
    fn default() -> Config {
        return Config{
            max_distance: 500.0,
            update_interval: Duration::from_secs(20),
            update_interval_on_fail: Duration::from_secs(60),
            max_retry: 3,
            max_subsequent_attempts: 5,
            notification_fade_timeout: Duration::from_secs(5),
            time_zone: "Europe/Minsk".to_string(),
            api: Api::default(),
            favourites: vec![],
            stop_info: "stop-info.json".to_string(),
        };
    }
}

impl Config {
    pub fn tz(&self) -> result::TTWatchResult<chrono_tz::Tz> {
        return self.time_zone.parse::<chrono_tz::Tz>()
            .map_err(|err| result::make_error(&format!(
                "Unknown time zone '{}': {}", self.time_zone, err)));
    }

    fn validate(&self) -> result::TTWatchResult<()> {
        if self.update_interval_on_fail < self.update_interval {
            return Err(result::make_error(&format!(
                "updateIntervalOnFail ({:?}) must not be shorter than updateInterval ({:?})",
                self.update_interval_on_fail, self.update_interval)));
        }
        if !self.api.url.schedule.contains(":stopId") {
            return Err(result::make_error("api.url.schedule has no :stopId placeholder"));
        }
        self.tz()?;
        return Ok(());
    }
}

pub fn from_str(raw_json: &str) -> result::TTWatchResult<Config> {
    let config: Config = serde_json::from_str(raw_json)
        .with_context(|| format!("while parsing config"))?;
    config.validate()?;
    return Ok(config);
}

pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> result::TTWatchResult<Config> {
    let debug_path = path.as_ref().to_string_lossy().to_string();
    if !path.as_ref().exists() {
        warn!("No config at '{}', using defaults", debug_path);
        return Ok(Config::default());
    }
    let raw_json = std::fs::read_to_string(path)
        .with_context(|| format!("Opening config from '{}'", debug_path))?;
    return from_str(&raw_json);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn parses_full_config() {
        let raw_json = std::fs::read_to_string("testdata/config.json")
            .expect("Error reading config.json");

        let config = super::from_str(&raw_json).expect("config");

        assert_eq!(300.0, config.max_distance);
        assert_eq!(Duration::from_millis(15000), config.update_interval);
        assert_eq!(Duration::from_millis(45000), config.update_interval_on_fail);
        assert_eq!(2, config.max_retry);
        assert_eq!(5, config.max_subsequent_attempts);
        assert_eq!(Duration::from_millis(4000), config.notification_fade_timeout);
        assert_eq!("http://proxy.example/schedule/:stopId?retry=:maxRetry", config.api.url.schedule);
        assert_eq!(2, config.favourites.len());
        assert_eq!("15386", config.favourites[0].id);
        assert_eq!(chrono_tz::Europe::Minsk, config.tz().expect("tz"));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = super::from_str("{}").expect("config");
        assert_eq!(super::Config::default(), config);
    }

    #[test]
    fn rejects_degraded_interval_shorter_than_healthy() {
        let result = super::from_str(r#"{"updateInterval": 30000, "updateIntervalOnFail": 1000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_template_without_stop() {
        let result = super::from_str(r#"{"api": {"url": {"schedule": "http://x/"}}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_time_zone() {
        assert!(super::from_str(r#"{"timeZone": "Mars/Olympus"}"#).is_err());
    }

    #[test]
    fn absent_file_means_defaults() {
        let config = super::from_file("testdata/does-not-exist.json").expect("config");
        assert_eq!(super::Config::default(), config);
    }
}
