use crate::follow::FollowSet;
use crate::routes::NormalizedRoute;

// The watch font has no Cyrillic glyphs for these.
const TRANSLITERATION: [(char, char); 4] = [
    ('А', 'A'),
    ('Т', 'T'),
    ('с', 'c'),
    ('а', 'a'),
];

const TIME_LABELS: [(&str, &str); 2] = [
    ("D", "delayed"),
    ("<1", "now"),
];

/// Soonest arrival among followed routes, as last reported to the user.
#[derive(Debug, Clone)]
pub struct NextArrival {
    pub route_id: String,
    pub display_time: String,
    pub sort_key: i64,
}

// Compares only what the user sees; sort_key is ignored.
impl PartialEq for NextArrival {
    fn eq(&self, other: &NextArrival) -> bool {
        return self.route_id == other.route_id && self.display_time == other.display_time;
    }
}

impl Eq for NextArrival {}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub route_id: String,
    pub display_time: String,
}

impl Notification {
    pub fn for_arrival(next: &NextArrival) -> Notification {
        let route_id = next.route_id.chars()
            .map(|c| TRANSLITERATION.iter()
                 .find(|(from, _)| *from == c)
                 .map(|(_, to)| *to)
                 .unwrap_or(c))
            .collect();

        let display_time = TIME_LABELS.iter()
            .find(|(code, _)| *code == next.display_time)
            .map(|(_, label)| label.to_string())
            .unwrap_or(next.display_time.clone());

        return Notification{
            route_id: route_id,
            display_time: display_time,
        };
    }

    pub fn text(&self) -> String {
        return format!("{}: {}", self.route_id, self.display_time);
    }
}

pub fn find_next(routes: &[NormalizedRoute], follow: &FollowSet) -> Option<NextArrival> {
    let mut best: Option<&NormalizedRoute> = None;
    for route in routes {
        if route.is_depot_bound || !follow.contains(&route.route_id) {
            continue;
        }
        // Strictly less: the first route with the minimum wins.
        if best.map_or(true, |b| route.soonest_minutes < b.soonest_minutes) {
            debug!("Next candidate {} at {:?}", route.route_id, route.times);
            best = Some(route);
        }
    }

    return best.map(|route| NextArrival{
        route_id: route.route_id.clone(),
        display_time: route.first_time().to_string(),
        sort_key: route.soonest_minutes,
    });
}

pub fn has_changed(previous: Option<&NextArrival>, current: Option<&NextArrival>) -> bool {
    match (previous, current) {
        (_, None) => return false,
        (None, Some(_)) => return true,
        (Some(previous), Some(current)) => return previous != current,
    }
}

/// Remembers the last reported arrival so each change is announced once.
#[derive(Debug, Default)]
pub struct NextArrivalTracker {
    previous: Option<NextArrival>,
}

impl NextArrivalTracker {
    pub fn new() -> NextArrivalTracker {
        return NextArrivalTracker{ previous: None };
    }

    #[cfg(test)]
    pub fn previous(&self) -> Option<&NextArrival> {
        return self.previous.as_ref();
    }

    pub fn observe(&mut self, current: Option<NextArrival>) -> Option<Notification> {
        info!("Previous nearest: {:?}, current nearest: {:?}",
              self.previous.as_ref().map(|n| (&n.route_id, &n.display_time)),
              current.as_ref().map(|n| (&n.route_id, &n.display_time)));

        if !has_changed(self.previous.as_ref(), current.as_ref()) {
            return None;
        }

        let current = current?;
        let notification = Notification::for_arrival(&current);
        self.previous = Some(current);
        return Some(notification);
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::follow::FollowSet;
    use crate::routes;
    use crate::routes::tests::raw;

    fn next(route_id: &str, display_time: &str, sort_key: i64) -> super::NextArrival {
        return super::NextArrival{
            route_id: route_id.to_string(),
            display_time: display_time.to_string(),
            sort_key: sort_key,
        };
    }

    fn following(ids: &[&str]) -> FollowSet {
        let mut follow = FollowSet::new();
        follow.replace(ids.iter());
        return follow;
    }

    #[test]
    fn picks_soonest_followed() {
        let schedule = routes::normalize(&vec![
            raw("А", "1", "X", &["5"]),
            raw("А", "2", "Y", &["<1"]),
            raw("Т", "3", "Z", &["2"]),
        ]);

        let found = super::find_next(&schedule.routes, &following(&["А1", "Т3"]))
            .expect("expected an arrival");
        assert_eq!("Т3", found.route_id);
        assert_eq!("2", found.display_time);
        assert_eq!(2, found.sort_key);
    }

    #[test]
    fn never_picks_depot_route() {
        let schedule = routes::normalize(&vec![
            raw("Т", "40", "Троллейбусный парк №2", &["<1"]),
            raw("Т", "40", "Вокзал", &["9"]),
        ]);

        let found = super::find_next(&schedule.routes, &following(&["Т40"]))
            .expect("expected an arrival");
        assert_eq!("9", found.display_time);

        let depot_only = routes::normalize(&vec![
            raw("Т", "40", "Троллейбусный парк №2", &["<1"]),
        ]);
        assert_eq!(None, super::find_next(&depot_only.routes, &following(&["Т40"])));
    }

    #[test]
    fn nothing_when_not_following() {
        let schedule = routes::normalize(&vec![raw("А", "1", "X", &["5"])]);
        assert_eq!(None, super::find_next(&schedule.routes, &FollowSet::new()));
        assert_eq!(None, super::find_next(&schedule.routes, &following(&["А777"])));
    }

    #[test]
    fn ties_go_to_first_route() {
        let routes = vec![
            routes::normalize_route(&raw("А", "1", "X", &["4"])),
            routes::normalize_route(&raw("А", "2", "Y", &["4"])),
        ];
        let found = super::find_next(&routes, &following(&["А2", "А1"])).expect("arrival");
        assert_eq!("А1", found.route_id);
    }

    #[test]
    fn has_changed_ignores_sort_key() {
        let a = next("Т3", "<1", 0);
        let b = next("Т3", "<1", 57);
        assert!(!super::has_changed(Some(&a), Some(&b)));
        assert!(super::has_changed(Some(&a), Some(&next("Т3", "3", 3))));
        assert!(super::has_changed(Some(&a), Some(&next("Т4", "<1", 0))));
        assert!(super::has_changed(None, Some(&a)));
        assert!(!super::has_changed(Some(&a), None));
        assert!(!super::has_changed(None, None));
    }

    #[test]
    fn observe_reports_each_change_once() {
        let mut tracker = super::NextArrivalTracker::new();

        assert!(tracker.observe(Some(next("Т3", "5", 5))).is_some());
        assert_eq!(None, tracker.observe(Some(next("Т3", "5", 5))));
        assert_eq!(None, tracker.observe(None));
        assert_eq!("5", tracker.previous().expect("previous").display_time);
        assert!(tracker.observe(Some(next("Т3", "4", 4))).is_some());

        tracker.reset();
        assert!(tracker.previous().is_none());
        assert!(tracker.observe(Some(next("Т3", "4", 4))).is_some());
    }

    #[test]
    fn notification_text() {
        let notification = super::Notification::for_arrival(&next("Тс", "D", 100));
        assert_eq!("Tc", notification.route_id);
        assert_eq!("delayed", notification.display_time);

        let notification = super::Notification::for_arrival(&next("А100", "<1", 0));
        assert_eq!("A100: now", notification.text());

        let notification = super::Notification::for_arrival(&next("Аа12", "7", 7));
        assert_eq!("Aa12: 7", notification.text());
    }
}
