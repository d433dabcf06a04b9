extern crate tokio;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::feed;
use crate::session::{ScheduleSink, ScheduleViewSession, Step};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RefreshNow,
    ToggleFollow(String),
    SelectFollowing(Vec<String>),
    ShowFollowable,
    Close,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (verb, rest) = match line.find(char::is_whitespace) {
        Some(index) => (&line[..index], line[index..].trim()),
        None => (line, ""),
    };

    match verb {
        "r" => return Some(Command::RefreshNow),
        "l" => return Some(Command::ShowFollowable),
        "q" => return Some(Command::Close),
        "f" if !rest.is_empty() => return Some(Command::ToggleFollow(rest.to_string())),
        "F" => return Some(Command::SelectFollowing(
            rest.split(",")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect())),
        _ => return None,
    }
}

type InFlight<'a> = (u64, Pin<Box<dyn Future<Output = feed::FetchResult> + 'a>>);

async fn fetch_done(in_flight: &mut Option<InFlight<'_>>) -> (u64, feed::FetchResult) {
    match in_flight {
        Some((ticket, fetch)) => return (*ticket, fetch.as_mut().await),
        None => return std::future::pending().await,
    }
}

async fn timer_done(timer: &mut Option<Pin<Box<tokio::time::Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn overlay_done(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn apply<S: ScheduleSink>(session: &mut ScheduleViewSession, command: Command, sink: &mut S) -> Step {
    debug!("Command {:?}", command);
    match command {
        Command::RefreshNow => return session.refresh_now(sink),
        Command::ToggleFollow(route_id) => return session.toggle_follow(&route_id),
        Command::SelectFollowing(route_ids) => return session.select_following(route_ids),
        Command::ShowFollowable => {
            sink.show_followable(&session.followable());
            return Step::Unchanged;
        },
        Command::Close => return session.teardown(),
    }
}

/// Drives one schedule view until it is closed. At most one fetch and one
/// timer are pending at any time; arming either replaces what was there.
///
/// The sink's notification overlay is taken down when its deadline passes.
///
/// A closed command channel means no more user input: the view keeps going
/// while anything is pending and is torn down once it goes idle.
pub async fn run_session<'a, F, S>(
    session: &mut ScheduleViewSession,
    refresh: bool,
    fetcher: &'a F,
    sink: &mut S,
    commands: &mut mpsc::Receiver<Command>)
where F: feed::ScheduleFetcher, S: ScheduleSink {
    let mut in_flight: Option<InFlight<'a>> = None;
    let mut timer: Option<Pin<Box<tokio::time::Sleep>>> = None;
    let mut commands_open = true;

    let mut step = session.start(refresh, sink);
    loop {
        match step {
            Step::Fetch(request) => {
                timer = None;
                in_flight = Some((request.ticket, Box::pin(fetcher.fetch(request.url))));
            },
            Step::Wait(delay) => {
                debug!("Next update in {:?}", delay);
                in_flight = None;
                timer = Some(Box::pin(tokio::time::sleep(delay)));
            },
            Step::Idle => {
                in_flight = None;
                timer = None;
            },
            Step::Unchanged => {},
            Step::Stop => return,
        }

        if !commands_open && in_flight.is_none() && timer.is_none() {
            session.teardown();
            return;
        }

        let overlay = sink.overlay_deadline();
        step = tokio::select! {
            (ticket, result) = fetch_done(&mut in_flight) => {
                in_flight = None;
                session.on_fetch_complete(ticket, result, sink)
            },
            _ = timer_done(&mut timer) => {
                timer = None;
                session.on_timer_fired(sink)
            },
            _ = overlay_done(overlay) => {
                sink.overlay_expired();
                Step::Unchanged
            },
            command = commands.recv(), if commands_open => {
                match command {
                    Some(command) => apply(session, command, sink),
                    None => {
                        debug!("No more commands");
                        commands_open = false;
                        Step::Unchanged
                    },
                }
            },
        };
    }
}
