extern crate anyhow;
extern crate serde_json;

use anyhow::Context;
use crate::config;
use crate::result;

const EARTH_RADIUS_M: f64 = 6371000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub routes: Vec<String>,
    pub coords: Coords,
}

/// One row of a stop-selection menu.
#[derive(Debug, Clone, PartialEq)]
pub struct StopItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub distance_m: Option<u32>,
}

pub fn stop_info_from_file<P: AsRef<std::path::Path>>(path: P) -> result::TTWatchResult<Vec<StopInfo>> {
    let debug_path = path.as_ref().to_string_lossy().to_string();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening stop info from '{}'", debug_path))?;
    let reader = std::io::BufReader::new(file);
    let stops: Vec<StopInfo> = serde_json::from_reader(reader)
        .with_context(|| format!("while parsing stop info"))?;
    return Ok(stops);
}

pub fn favourites(config: &config::Config) -> Vec<StopItem> {
    return config.favourites.iter().map(|s| StopItem{
        id: s.id.clone(),
        title: s.name.clone(),
        subtitle: s.description.clone(),
        distance_m: None,
    }).collect();
}

// Flat-earth approximation, plenty for a few hundred meters.
pub fn approximate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let x = (lon2 - lon1).to_radians() * lat1.to_radians().cos();
    let y = (lat2 - lat1).to_radians();
    return EARTH_RADIUS_M * (x * x + y * y).sqrt();
}

pub fn nearest(stops: &[StopInfo], lat: f64, lon: f64, max_distance: f64) -> Vec<StopItem> {
    let mut found: Vec<(f64, &StopInfo)> = stops.iter()
        .map(|stop| (approximate_distance(lat, lon, stop.coords.lat, stop.coords.lon), stop))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();

    found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    return found.iter().map(|(distance, stop)| StopItem{
        id: stop.id.clone(),
        title: stop.name.clone(),
        subtitle: stop.routes.join(","),
        distance_m: Some(distance.floor() as u32),
    }).collect();
}

pub fn parse_position(raw: &str) -> result::TTWatchResult<(f64, f64)> {
    let parts: Vec<f64> = raw
        .split(",")
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .collect();

    if parts.len() != 2 {
        return Err(result::make_error(&format!(
            "Invalid position '{}', expected LAT,LON", raw)));
    }

    return Ok((parts[0], parts[1]));
}
