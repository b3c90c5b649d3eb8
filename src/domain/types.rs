/// A candidate fragment of page text whose similarity to the watched class
/// name reached the configured threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub candidate: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    NoMatches,
    AlreadyNotified,
    Notified { matches: usize },
}
