extern crate reqwest;
extern crate serde_json;
extern crate std;

use std::future::Future;

use crate::routes::SchedulePayload;

pub type FetchResult = std::result::Result<SchedulePayload, FetchFailure>;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    // Nothing usable came back: no connection, bad status without a body we
    // understand, or a body that isn't a schedule.
    Transport(String),
    // The feed answered with an explicit error object.
    Feed(String),
}

impl FetchFailure {
    pub fn is_feed_reported(&self) -> bool {
        match *self {
            FetchFailure::Feed(_) => return true,
            FetchFailure::Transport(_) => return false,
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            FetchFailure::Transport(ref reason) => {
                return write!(f, "Transport failure: {}", reason);
            },
            FetchFailure::Feed(ref message) => {
                return write!(f, "Feed error: {}", message);
            },
        }
    }
}

impl std::error::Error for FetchFailure {}

pub trait ScheduleFetcher {
    fn fetch(&self, url: String) -> impl Future<Output = FetchResult>;
}

pub fn schedule_url(template: &str, stop_id: &str, max_retry: u32) -> String {
    return template
        .replace(":stopId", stop_id)
        .replace(":maxRetry", &max_retry.to_string());
}

/// Interprets a response body, successful or not.
pub fn parse_body(ok_status: bool, body: &str) -> FetchResult {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            return Err(FetchFailure::Transport(format!("unreadable body: {}", err)));
        }
    };

    if let Some(message) = feed_error(&value) {
        return Err(FetchFailure::Feed(message));
    }

    if !ok_status {
        return Err(FetchFailure::Transport(format!("unexpected response: {}", body)));
    }

    return serde_json::from_value::<SchedulePayload>(value)
        .map_err(|err| FetchFailure::Transport(format!("malformed schedule: {}", err)));
}

fn feed_error(value: &serde_json::Value) -> Option<String> {
    let error = value.get("error").or(value.get("Error"))?;
    if error.is_null() {
        return None;
    }
    match error.as_str() {
        Some(message) => return Some(message.to_string()),
        None => return Some(error.to_string()),
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> HttpFetcher {
        return HttpFetcher{
            client: reqwest::Client::new(),
        };
    }

    async fn fetch_body(&self, url: &str) -> std::result::Result<(bool, String), reqwest::Error> {
        let response = self.client.get(url)
            .header(reqwest::header::USER_AGENT, "ttwatch from http://mrjon.es")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let ok_status = response.status().is_success();
        let body = response.text().await?;
        return Ok((ok_status, body));
    }
}

impl ScheduleFetcher for HttpFetcher {
    fn fetch(&self, url: String) -> impl Future<Output = FetchResult> {
        return async move {
            debug!("Fetching {}", url);
            match self.fetch_body(&url).await {
                Ok((ok_status, body)) => return parse_body(ok_status, &body),
                Err(err) => return Err(FetchFailure::Transport(format!("{}", err))),
            }
        };
    }
}
