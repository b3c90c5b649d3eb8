use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Node, Selector};
use thiserror::Error;
use url::Url;

use crate::config::WebContentConfig;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: Url, status: StatusCode },
}

#[async_trait]
pub trait PageSource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct WebContentFetcher {
    client: Client,
    config: WebContentConfig,
}

impl WebContentFetcher {
    pub fn new(client: Client, config: WebContentConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl PageSource for WebContentFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        response.text().await.map_err(request_error)
    }
}

/// Flattens page markup into newline separated text. Text under the first
/// `<main>` element is preferred; pages without one are read whole.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let main = Selector::parse("main")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    let root = match main {
        Some(element) => *element,
        None => *document.root_element(),
    };

    root.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
            })
        })
        .map(|(_, text)| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
