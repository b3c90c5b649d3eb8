use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::{
    config::{AppConfig, ConfigError, WatchConfig},
    domain::{Email, Match, RunOutcome},
    infrastructure::notifier::{DeliveryError, Notifier, SmtpNotifier},
    matcher::fuzzy_search,
    state::{FileStateStore, NotificationState, StateStore},
    web_content::{extract_text, FetchError, PageSource, WebContentFetcher},
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to send notification: {0}")]
    Delivery(#[from] DeliveryError),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 2,
            RunError::Fetch(_) => 3,
            RunError::Delivery(_) => 4,
        }
    }
}

/// One fetch, match, notify pass over the cancellations page.
pub struct LectureWatch<P, N, S> {
    watch: WatchConfig,
    url: Url,
    sender: String,
    recipient: String,
    pages: P,
    notifier: N,
    state: NotificationState<S>,
}

impl<P, N, S> LectureWatch<P, N, S>
where
    P: PageSource,
    N: Notifier,
    S: StateStore,
{
    pub fn new(config: &AppConfig, pages: P, notifier: N, store: S) -> Self {
        Self {
            watch: config.watch.clone(),
            url: config.web.url.clone(),
            sender: config.mail.username.clone(),
            recipient: config.mail.recipient.clone(),
            pages,
            notifier,
            state: NotificationState::new(store),
        }
    }

    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome, RunError> {
        tracing::info!(target: "fetch", url = %self.url, "fetching page");
        let html = self.pages.fetch(&self.url).await?;

        let text = extract_text(&html);
        let matches = fuzzy_search(&text, &self.watch.class_name, self.watch.threshold);
        if matches.is_empty() {
            tracing::info!(
                target: "matcher",
                class = %self.watch.class_name,
                "no matches found today"
            );
            return Ok(RunOutcome::NoMatches);
        }
        tracing::info!(
            target: "matcher",
            class = %self.watch.class_name,
            total = matches.len(),
            best = matches[0].score,
            "matches found"
        );

        if self.state.read() == Some(today) {
            tracing::info!(target: "state", %today, "already notified today; skipping email");
            return Ok(RunOutcome::AlreadyNotified);
        }

        let email = self.compose_email(&matches);
        tracing::info!(target: "mail", to = %email.to, "sending notification");
        self.notifier.send(&email).await?;
        self.state.write(today);
        tracing::info!(target: "mail", "notification sent and state updated");

        Ok(RunOutcome::Notified {
            matches: matches.len(),
        })
    }

    fn compose_email(&self, matches: &[Match]) -> Email {
        let class = &self.watch.class_name;
        let mut lines = vec![
            format!("Possible cancellation(s) for '{class}' detected at {}", self.url),
            String::new(),
            "Top matches (similarity score):".to_string(),
        ];
        lines.extend(
            matches
                .iter()
                .take(self.watch.max_reported)
                .map(|m| format!("- [{:.2}] {}", m.score, m.candidate)),
        );

        Email {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: format!("[MCAST] Possible cancelled lecture for {class}"),
            body: lines.join("\n"),
        }
    }
}

/// Wires the production collaborators and performs a single run.
pub async fn execute(config: AppConfig) -> Result<RunOutcome, RunError> {
    let http_client = Client::builder()
        .user_agent(format!(
            "Mozilla/5.0 (compatible; lecture-watch/{}; +https://github.com/)",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(FetchError::Client)?;

    let fetcher = WebContentFetcher::new(http_client, config.web.clone());
    let notifier = SmtpNotifier::new(&config.mail)?;
    let store = FileStateStore::new(&config.state.path);
    tracing::debug!(target: "state", path = %store.path().display(), "using state file");

    let today = today_in(config.watch.timezone);
    LectureWatch::new(&config, fetcher, notifier, store)
        .run(today)
        .await
}

pub fn today_in(timezone: Option<Tz>) -> NaiveDate {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    }
}
