extern crate chrono;
extern crate chrono_tz;
extern crate std;

use std::io::Write;
use std::time::Duration;

use tokio::time::Instant;

use crate::routes;
use crate::session;
use crate::tracker;

const SEPARATOR: &str = "----------------------------------------";

fn report(what: &str, result: std::io::Result<()>) {
    if let Err(err) = result {
        warn!("Could not write {} to the console: {}", what, err);
    }
}

// Stand-in for the watch screen: a title, the schedule lines, and a big
// notification overlay that hides the schedule while it's up.
pub struct ConsoleView<W: Write> {
    out: W,
    tz: chrono_tz::Tz,
    fade_timeout: Duration,
    overlay_until: Option<Instant>,
    layout: Option<(usize, usize)>,
    last: Option<(String, routes::Schedule)>,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W, tz: chrono_tz::Tz, fade_timeout: Duration) -> ConsoleView<W> {
        return ConsoleView{
            out: out,
            tz: tz,
            fade_timeout: fade_timeout,
            overlay_until: None,
            layout: None,
            last: None,
        };
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        return self.out;
    }

    fn now(&self) -> String {
        return chrono::Utc::now().with_timezone(&self.tz).format("%H:%M:%S").to_string();
    }

    fn overlay_active(&self) -> bool {
        return self.overlay_until.map(|until| Instant::now() < until).unwrap_or(false);
    }

    fn write_schedule(&mut self) -> std::io::Result<()> {
        let now = self.now();
        let (stop_name, schedule) = match &self.last {
            Some(last) => last,
            None => return Ok(()),
        };
        writeln!(self.out, "== {}: {}", now, stop_name)?;
        for line in schedule.text_lines() {
            if line.bold {
                writeln!(self.out, "{}", line.text)?;
            } else {
                writeln!(self.out, "    {}", line.text)?;
            }
        }
        return self.out.flush();
    }

    fn write_notification(&mut self, notification: &tracker::Notification) -> std::io::Result<()> {
        writeln!(self.out, "\x07")?;
        writeln!(self.out, "  >>> {} <<<", notification.text())?;
        return self.out.flush();
    }

    fn write_error(&mut self, error: &session::ErrorSurface) -> std::io::Result<()> {
        writeln!(self.out, "!! {}\n!! {}\n{}", error.title, error.subtitle, error.body)?;
        return self.out.flush();
    }

    fn write_followable(&mut self, routes: &[(routes::FollowableRoute, bool)]) -> std::io::Result<()> {
        if routes.is_empty() {
            writeln!(self.out, "No routes to follow yet")?;
        }
        for (route, followed) in routes {
            writeln!(self.out, "{}{}\n    {}",
                     route.route_id, if *followed { " +" } else { "" }, route.end_stop)?;
        }
        return self.out.flush();
    }
}

impl<W: Write> session::ScheduleSink for ConsoleView<W> {
    fn render(&mut self, stop_name: &str, schedule: &routes::Schedule) {
        let counts = (schedule.regular_count, schedule.depot_count);
        if self.layout != Some(counts) {
            debug!("Layout changed {:?} -> {:?}, rebuilding", self.layout, counts);
            report("separator", writeln!(self.out, "{}", SEPARATOR));
            self.layout = Some(counts);
        }

        self.last = Some((stop_name.to_string(), schedule.clone()));
        if self.overlay_active() {
            debug!("Notification still up, redrawing once it fades");
            return;
        }
        self.overlay_until = None;
        report("schedule", self.write_schedule());
    }

    fn notify(&mut self, notification: &tracker::Notification) {
        info!("notification: vibro & light!");
        report("notification", self.write_notification(notification));
        self.overlay_until = Some(Instant::now() + self.fade_timeout);
    }

    fn show_error(&mut self, error: &session::ErrorSurface) {
        report("error", self.write_error(error));
    }

    fn clear_error(&mut self) {
        debug!("Clearing error card");
        report("error", writeln!(self.out, "!! cleared, retrying"));
    }

    fn show_followable(&mut self, routes: &[(routes::FollowableRoute, bool)]) {
        report("follow menu", self.write_followable(routes));
    }

    fn overlay_deadline(&self) -> Option<Instant> {
        return self.overlay_until;
    }

    fn overlay_expired(&mut self) {
        if self.overlay_until.take().is_some() {
            debug!("Notification faded, restoring schedule");
            report("schedule", self.write_schedule());
        }
    }
}
