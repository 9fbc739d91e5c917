//! Repository discovery.
//!
//! Finds the owner's portfolio repositories by topic through the GitHub
//! search API. [`RepoDiscovery`] is the seam the corpus loader depends on.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::CorpusConfig;

/// Lists clone URLs for an owner's repositories tagged with a topic.
#[async_trait]
pub trait RepoDiscovery: Send + Sync {
    /// Clone URLs in the order the source returned them.
    async fn discover(&self, owner: &str, topic: &str) -> Result<Vec<String>>;
}

/// [`RepoDiscovery`] backed by `GET /search/repositories`.
pub struct GitHubDiscovery {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubDiscovery {
    pub fn new(config: &CorpusConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
        })
    }
}

#[async_trait]
impl RepoDiscovery for GitHubDiscovery {
    async fn discover(&self, owner: &str, topic: &str) -> Result<Vec<String>> {
        let url = format!("{}/search/repositories", self.api_url);
        let query = search_query(owner, topic);

        let mut request = self
            .client
            .get(&url)
            .query(&[("q", query.as_str())])
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("GitHub search request failed: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("GitHub API error {}: {}", status, body);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .with_context(|| "GitHub search returned a non-JSON body")?;
        parse_search_response(&json)
    }
}

pub fn search_query(owner: &str, topic: &str) -> String {
    format!("user:{} topic:{}", owner, topic)
}

/// Extract `items[].clone_url`. A missing `items` array is malformed;
/// items without a clone URL are skipped.
pub fn parse_search_response(json: &serde_json::Value) -> Result<Vec<String>> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid GitHub search response: missing items array"))?;

    Ok(items
        .iter()
        .filter_map(|item| item.get("clone_url").and_then(|u| u.as_str()))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_format() {
        assert_eq!(search_query("dana", "portfolio"), "user:dana topic:portfolio");
    }

    #[test]
    fn clone_urls_in_order() {
        let json = json!({
            "total_count": 3,
            "items": [
                { "name": "rocket", "clone_url": "https://github.com/dana/rocket.git" },
                { "name": "broken" },
                { "name": "garden", "clone_url": "https://github.com/dana/garden.git" }
            ]
        });
        assert_eq!(
            parse_search_response(&json).unwrap(),
            vec![
                "https://github.com/dana/rocket.git",
                "https://github.com/dana/garden.git"
            ]
        );
    }

    #[test]
    fn empty_items_is_empty_result() {
        let json = json!({ "total_count": 0, "items": [] });
        assert!(parse_search_response(&json).unwrap().is_empty());
    }

    #[test]
    fn missing_items_is_malformed() {
        let json = json!({ "message": "API rate limit exceeded" });
        assert!(parse_search_response(&json).is_err());
    }

    #[tokio::test]
    async fn unreachable_api_is_an_error() {
        let config = CorpusConfig {
            github_api_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let discovery = GitHubDiscovery::new(&config).unwrap();
        assert!(discovery.discover("dana", "portfolio").await.is_err());
    }
}
