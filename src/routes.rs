extern crate serde;
extern crate serde_json;

use crate::timecode;

// End stop names of trips heading back to the trolleybus depot.
pub const DEPOT_MARKER: &str = "Троллейбусный парк";
const DEPOT_ABBREVIATION: &str = "ТП";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SchedulePayload {
    pub stop_name: String,
    #[serde(default)]
    pub routes: Vec<RawRoute>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RawRoute {
    #[serde(rename = "Type")]
    pub route_type: String,
    pub number: String,
    pub end_stop: String,
    #[serde(default)]
    pub info: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRoute {
    pub route_id: String,
    pub is_depot_bound: bool,
    pub end_stop: String,
    pub times: Vec<String>,
    pub soonest_minutes: i64,
}

impl NormalizedRoute {
    /// Depot-bound trips always order after regular ones.
    pub fn sort_key(&self) -> (bool, i64) {
        return (self.is_depot_bound, self.soonest_minutes);
    }

    pub fn first_time(&self) -> &str {
        return self.times.first().map(String::as_str).unwrap_or("");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub routes: Vec<NormalizedRoute>,
    pub regular_count: usize,
    pub depot_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FollowableRoute {
    pub route_id: String,
    pub end_stop: String,
}

impl Schedule {
    pub fn empty() -> Schedule {
        return Schedule{
            routes: vec![],
            regular_count: 0,
            depot_count: 0,
        };
    }

    pub fn text_lines(&self) -> Vec<TextLine> {
        let mut lines = vec![];
        for route in &self.routes {
            if route.is_depot_bound {
                lines.push(TextLine{
                    text: format!("{} [{}]: {}", route.route_id, route.end_stop, route.times.join(",")),
                    bold: false,
                });
            } else {
                lines.push(TextLine{
                    text: format!("{}: {}", route.route_id, route.times.join(",")),
                    bold: true,
                });
                lines.push(TextLine{
                    text: route.end_stop.clone(),
                    bold: false,
                });
            }
        }
        return lines;
    }

    pub fn followable(&self) -> Vec<FollowableRoute> {
        return self.routes.iter()
            .filter(|r| !r.is_depot_bound)
            .map(|r| FollowableRoute{
                route_id: r.route_id.clone(),
                end_stop: r.end_stop.clone(),
            })
            .collect();
    }
}

fn display_end_stop(end_stop: &str) -> String {
    return end_stop
        .replace(DEPOT_MARKER, DEPOT_ABBREVIATION)
        .replace('№', "N");
}

pub fn normalize_route(raw: &RawRoute) -> NormalizedRoute {
    let soonest_minutes = raw.info.first()
        .map(|token| timecode::parse(token))
        .unwrap_or(timecode::UNPARSEABLE);

    return NormalizedRoute{
        route_id: format!("{}{}", raw.route_type, raw.number),
        is_depot_bound: raw.end_stop.contains(DEPOT_MARKER),
        end_stop: display_end_stop(&raw.end_stop),
        times: raw.info.clone(),
        soonest_minutes: soonest_minutes,
    };
}

pub fn normalize(raw_routes: &[RawRoute]) -> Schedule {
    let mut routes: Vec<NormalizedRoute> = raw_routes.iter().map(normalize_route).collect();
    // sort_by_key is stable, so equal keys keep feed order.
    routes.sort_by_key(|r| r.sort_key());

    let depot_count = routes.iter().filter(|r| r.is_depot_bound).count();
    return Schedule{
        regular_count: routes.len() - depot_count,
        depot_count: depot_count,
        routes: routes,
    };
}
