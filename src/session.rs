// One open schedule view: the poll state machine plus everything that has to
// survive between polls (followed routes, last notified arrival).
//
// The session never sleeps or does I/O itself. Every entry point returns a
// Step telling the driver in poll.rs what to arm next.

use std::time::Duration;

use tokio::time::Instant;

use crate::config;
use crate::feed;
use crate::follow::FollowSet;
use crate::routes;
use crate::tracker;

const ERROR_TITLE: &str = "Error loading schedule";
const CONNECTIVITY_HINT: &str = "Please, check your internet connection and make sure proxy server is alive";

pub trait ScheduleSink {
    fn render(&mut self, stop_name: &str, schedule: &routes::Schedule);
    fn notify(&mut self, notification: &tracker::Notification);
    fn show_error(&mut self, error: &ErrorSurface);
    fn clear_error(&mut self);
    /// The follow menu: routes of the latest poll and whether each is followed.
    fn show_followable(&mut self, routes: &[(routes::FollowableRoute, bool)]);

    /// When the notification overlay should come down, if one is up.
    fn overlay_deadline(&self) -> Option<Instant> {
        return None;
    }

    /// Called by the driver once `overlay_deadline` has passed.
    fn overlay_expired(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSurface {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

impl ErrorSurface {
    pub fn for_failure(failure: &feed::FetchFailure) -> ErrorSurface {
        let (subtitle, body) = match *failure {
            feed::FetchFailure::Feed(ref message) => ("Feed failure", message.clone()),
            feed::FetchFailure::Transport(_) => ("Connection failure", CONNECTIVITY_HINT.to_string()),
        };
        return ErrorSurface{
            title: ERROR_TITLE.to_string(),
            subtitle: subtitle.to_string(),
            body: body,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Drop whatever is pending and issue this fetch now.
    Fetch(FetchRequest),
    /// Drop whatever is pending and fire on_timer_fired after the delay.
    Wait(Duration),
    /// Nothing pending until the user does something.
    Idle,
    /// Keep whatever is already pending.
    Unchanged,
    /// The view is gone.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Fetching(u64),
    Scheduled,
    TornDown,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub url_template: String,
    pub max_retry: u32,
    pub max_attempts: u32,
    pub healthy_interval: Duration,
    pub degraded_interval: Duration,
}

impl PollSettings {
    pub fn from_config(config: &config::Config) -> PollSettings {
        return PollSettings{
            url_template: config.api.url.schedule.clone(),
            max_retry: config.max_retry,
            max_attempts: config.max_subsequent_attempts,
            healthy_interval: config.update_interval,
            degraded_interval: config.update_interval_on_fail,
        };
    }
}

pub struct ScheduleViewSession {
    stop_id: String,
    settings: PollSettings,
    phase: Phase,
    refresh: bool,
    attempt_count: u32,
    next_ticket: u64,
    error_shown: bool,
    follow: FollowSet,
    tracker: tracker::NextArrivalTracker,
    last_schedule: routes::Schedule,
}

impl ScheduleViewSession {
    pub fn new(stop_id: &str, settings: PollSettings) -> ScheduleViewSession {
        return ScheduleViewSession{
            stop_id: stop_id.to_string(),
            settings: settings,
            phase: Phase::Idle,
            refresh: true,
            attempt_count: 0,
            next_ticket: 0,
            error_shown: false,
            follow: FollowSet::new(),
            tracker: tracker::NextArrivalTracker::new(),
            last_schedule: routes::Schedule::empty(),
        };
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        return self.phase;
    }

    #[cfg(test)]
    pub fn attempt_count(&self) -> u32 {
        return self.attempt_count;
    }

    pub fn is_torn_down(&self) -> bool {
        return self.phase == Phase::TornDown;
    }

    #[cfg(test)]
    pub fn following(&self) -> &FollowSet {
        return &self.follow;
    }

    #[cfg(test)]
    pub fn last_reported(&self) -> Option<&tracker::NextArrival> {
        return self.tracker.previous();
    }

    /// Routes from the latest poll the user can pick to follow, with their
    /// current follow state.
    pub fn followable(&self) -> Vec<(routes::FollowableRoute, bool)> {
        return self.last_schedule.followable().into_iter()
            .map(|r| {
                let followed = self.follow.contains(&r.route_id);
                (r, followed)
            })
            .collect();
    }

    pub fn request_url(&self) -> String {
        return feed::schedule_url(&self.settings.url_template, &self.stop_id, self.settings.max_retry);
    }

    pub fn start<S: ScheduleSink>(&mut self, refresh: bool, sink: &mut S) -> Step {
        if self.is_torn_down() {
            return Step::Stop;
        }
        if self.error_shown {
            sink.clear_error();
            self.error_shown = false;
        }
        self.refresh = refresh;
        return self.issue_fetch();
    }

    fn issue_fetch(&mut self) -> Step {
        self.next_ticket += 1;
        self.phase = Phase::Fetching(self.next_ticket);
        return Step::Fetch(FetchRequest{
            ticket: self.next_ticket,
            url: self.request_url(),
        });
    }

    fn after_cycle(&mut self, delay: Duration) -> Step {
        if self.refresh {
            self.phase = Phase::Scheduled;
            return Step::Wait(delay);
        }
        self.phase = Phase::Idle;
        return Step::Idle;
    }

    pub fn on_fetch_complete<S: ScheduleSink>(&mut self, ticket: u64, result: feed::FetchResult, sink: &mut S) -> Step {
        if self.phase != Phase::Fetching(ticket) {
            debug!("Ignoring response for ticket {} in phase {:?}", ticket, self.phase);
            if self.is_torn_down() {
                return Step::Stop;
            }
            return Step::Unchanged;
        }

        match result {
            Ok(payload) => {
                self.attempt_count = 0;
                let schedule = routes::normalize(&payload.routes);
                info!("Schedule updated for {}: {} regular, {} to depot",
                      payload.stop_name, schedule.regular_count, schedule.depot_count);
                sink.render(&payload.stop_name, &schedule);

                if !self.follow.is_empty() {
                    let next = tracker::find_next(&schedule.routes, &self.follow);
                    if let Some(notification) = self.tracker.observe(next) {
                        info!("Notifying {}", notification.text());
                        sink.notify(&notification);
                    }
                }

                self.last_schedule = schedule;
                let interval = self.settings.healthy_interval;
                return self.after_cycle(interval);
            },
            Err(failure) => {
                if !failure.is_feed_reported() && self.attempt_count < self.settings.max_attempts {
                    self.attempt_count += 1;
                    warn!("Failed attempt #{}: {}", self.attempt_count, failure);
                    return self.issue_fetch();
                }

                error!("Giving up on this cycle after {} retries: {}", self.attempt_count, failure);
                self.attempt_count = 0;
                sink.show_error(&ErrorSurface::for_failure(&failure));
                self.error_shown = true;
                let interval = self.settings.degraded_interval;
                return self.after_cycle(interval);
            },
        }
    }

    pub fn on_timer_fired<S: ScheduleSink>(&mut self, sink: &mut S) -> Step {
        match self.phase {
            Phase::Scheduled => return self.start(true, sink),
            Phase::TornDown => return Step::Stop,
            _ => {
                debug!("Stale timer in phase {:?}", self.phase);
                return Step::Unchanged;
            },
        }
    }

    /// The select button: poll now instead of waiting for the timer.
    pub fn refresh_now<S: ScheduleSink>(&mut self, sink: &mut S) -> Step {
        match self.phase {
            Phase::Fetching(_) => {
                info!("Refresh requested while a fetch is in flight, ignoring");
                return Step::Unchanged;
            },
            Phase::TornDown => return Step::Stop,
            Phase::Idle | Phase::Scheduled => {
                let refresh = self.refresh;
                return self.start(refresh, sink);
            },
        }
    }

    /// The follow menu was closed with this selection.
    pub fn select_following<I, T>(&mut self, route_ids: I) -> Step
    where I: IntoIterator<Item = T>, T: AsRef<str> {
        self.follow.replace(route_ids);
        info!("Routes to follow: {:?}", self.follow.snapshot());
        return self.reschedule_after_follow_change();
    }

    pub fn toggle_follow(&mut self, route_id: &str) -> Step {
        let followed = self.follow.toggle(route_id);
        info!("{} {}", if followed { "Following" } else { "Unfollowing" }, route_id);
        return self.reschedule_after_follow_change();
    }

    fn reschedule_after_follow_change(&mut self) -> Step {
        match self.phase {
            Phase::TornDown => return Step::Stop,
            // The response in flight will already use the new selection.
            Phase::Fetching(_) => return Step::Unchanged,
            Phase::Idle | Phase::Scheduled => {
                if !self.refresh {
                    return Step::Unchanged;
                }
                self.phase = Phase::Scheduled;
                return Step::Wait(self.settings.healthy_interval);
            },
        }
    }

    pub fn teardown(&mut self) -> Step {
        info!("Closing schedule view for stop {}", self.stop_id);
        self.phase = Phase::TornDown;
        self.attempt_count = 0;
        self.error_shown = false;
        self.follow.clear();
        self.tracker.reset();
        self.last_schedule = routes::Schedule::empty();
        return Step::Stop;
    }
}
