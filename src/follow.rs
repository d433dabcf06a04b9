/// Routes the user wants to be alerted about. Only lives as long as the
/// schedule view that owns it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowSet {
    route_ids: Vec<String>,
}

impl FollowSet {
    pub fn new() -> FollowSet {
        return FollowSet{ route_ids: vec![] };
    }

    /// Returns whether the route is followed after the toggle.
    pub fn toggle(&mut self, route_id: &str) -> bool {
        match self.route_ids.iter().position(|id| id == route_id) {
            Some(index) => {
                self.route_ids.remove(index);
                return false;
            },
            None => {
                self.route_ids.push(route_id.to_string());
                return true;
            },
        }
    }

    pub fn contains(&self, route_id: &str) -> bool {
        return self.route_ids.iter().any(|id| id == route_id);
    }

    pub fn snapshot(&self) -> Vec<String> {
        return self.route_ids.clone();
    }

    /// Takes over whatever the selection menu reported, dropping duplicates.
    pub fn replace<I, S>(&mut self, route_ids: I)
    where I: IntoIterator<Item = S>, S: AsRef<str> {
        self.route_ids.clear();
        for route_id in route_ids {
            let route_id = route_id.as_ref().trim();
            if !route_id.is_empty() && !self.contains(route_id) {
                self.route_ids.push(route_id.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.route_ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        return self.route_ids.is_empty();
    }
}
