//! Picture lookup for a card, against a Pixabay-compatible search API.
use crate::config::ImagesConfig;
use crate::error::{Error, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ImageHit {
    #[serde(rename = "previewURL")]
    pub preview_url: String,
    #[serde(rename = "webformatURL")]
    pub webformat_url: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<ImageHit>,
}

pub struct ImageClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    per_page: u32,
}

impl ImageClient {
    pub fn new(config: &ImagesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            per_page: config.per_page,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn search(&self, query: &str) -> Result<Vec<ImageHit>> {
        let url = self.request_url(query)?;
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        parse_hits(&body)
    }

    /// Like [`ImageClient::search`], but failures only produce a warning.
    pub fn suggest(&self, query: &str) -> Vec<ImageHit> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.search(query).unwrap_or_else(|e| {
            log::warn!("Image lookup for '{query}' failed: {e}");
            Vec::new()
        })
    }

    fn request_url(&self, query: &str) -> Result<Url> {
        let Some(key) = &self.api_key else {
            return Err(Error::Validation("image lookup has no API key".into()));
        };
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("nothing to search for".into()));
        }
        // Pixabay wants per_page within 3..=200
        let per_page = self.per_page.clamp(3, 200).to_string();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", key.as_str()),
                ("q", query),
                ("image_type", "photo"),
                ("safesearch", "true"),
                ("per_page", per_page.as_str()),
            ],
        )
        .map_err(|e| Error::Validation(format!("bad image endpoint: {e}")))
    }
}

fn parse_hits(body: &str) -> Result<Vec<ImageHit>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> ImageClient {
        ImageClient::new(&ImagesConfig {
            api_key: key.map(str::to_string),
            ..ImagesConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_disabled_without_key() {
        let images = client(None);
        assert!(!images.is_enabled());
        assert!(images.request_url("dog").is_err());
        assert!(images.suggest("dog").is_empty());
        assert!(!client(Some("  ")).is_enabled());
    }

    #[test]
    fn test_request_url() {
        let url = client(Some("secret")).request_url(" red apple ").unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("key=secret"));
        assert!(query.contains("q=red+apple"));
        assert!(query.contains("per_page=6"));
    }

    #[test]
    fn test_parse_hits() {
        let body = r#"{"total":1,"totalHits":1,"hits":[{"id":1,"previewURL":"https://cdn/p.jpg","webformatURL":"https://cdn/w.jpg","tags":"apple, fruit"}]}"#;
        let hits = parse_hits(body).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].webformat_url, "https://cdn/w.jpg");
        assert_eq!(hits[0].tags, "apple, fruit");
    }
}
