use log::{debug, info};
use reqwest::StatusCode;
use scraper::{Html, Node, Selector};
use thiserror::Error;

use crate::utils::config::ScraperConfig;

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch page: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// Visible text of one fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

pub trait PageLoader {
    /// Fetches `url`. An empty list means the page had no readable content.
    async fn load(&self, url: &str) -> Result<Vec<PageDocument>, LoadError>;
}

/// Plain HTTP fetch plus HTML-to-text; no JavaScript rendering.
pub struct WebPageLoader {
    client: reqwest::Client,
    user_agent: String,
}

impl WebPageLoader {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl PageLoader for WebPageLoader {
    async fn load(&self, url: &str) -> Result<Vec<PageDocument>, LoadError> {
        info!("fetching page from: {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status,
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("received {} bytes of html", html.len());

        Ok(html_to_document(url, &html).into_iter().collect())
    }
}

/// Extracts the title and visible text; `None` when the page has no text.
pub fn html_to_document(url: &str, html: &str) -> Option<PageDocument> {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let content = document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    matches!(
                        ancestor.value(),
                        Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name())
                    )
                });
                let text = text.trim();
                (!hidden && !text.is_empty()).then_some(text)
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if content.is_empty() {
        debug!("no readable text found at {}", url);
        return None;
    }

    Some(PageDocument {
        url: url.to_string(),
        title,
        content,
    })
}
