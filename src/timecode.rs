// Arrival tokens as the feed sends them: either a plain number of minutes or
// one of a handful of letter codes.

/// Value for tokens that are neither a known code nor an integer.
/// Sorts after every real arrival.
pub const UNPARSEABLE: i64 = i64::MAX;

const SENTINELS: [(&str, i64); 4] = [
    ("-", 1000),  // no vehicle scheduled soon
    ("D", 100),   // delayed
    ("<1", 0),    // arriving now
    ("A", -1),    // already left
];

pub fn sentinel(token: &str) -> Option<i64> {
    return SENTINELS.iter()
        .find(|(code, _)| *code == token)
        .map(|(_, minutes)| *minutes);
}

pub fn parse(token: &str) -> i64 {
    let token = token.trim();
    if let Some(minutes) = sentinel(token) {
        return minutes;
    }
    return token.parse::<i64>().unwrap_or(UNPARSEABLE);
}
