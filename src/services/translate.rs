//! Translation lookup against a MyMemory-compatible REST endpoint.
use crate::config::TranslationConfig;
use crate::error::{Error, Result};
use crate::models::Language;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationResponse {
    response_data: ResponseData,
    #[serde(default)]
    response_status: serde_json::Value,
    #[serde(default)]
    response_details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: String,
}

pub struct TranslationClient {
    client: Client,
    endpoint: String,
    email: Option<String>,
}

impl TranslationClient {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            email: config.email.clone(),
        })
    }

    pub fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("nothing to translate".into()));
        }
        let url = self.request_url(text, from, to)?;
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        parse_response(&body)
    }

    /// Best-effort translation: any failure is logged and yields `None` so the
    /// user can type the translation by hand.
    pub fn suggest(&self, text: &str, from: Language, to: Language) -> Option<String> {
        match self.translate(text, from, to) {
            Ok(translated) => Some(translated),
            Err(e) => {
                log::warn!("Translation of '{text}' failed: {e}");
                None
            }
        }
    }

    fn request_url(&self, text: &str, from: Language, to: Language) -> Result<Url> {
        let langpair = format!("{}|{}", from.iso_639_1(), to.iso_639_1());
        let mut params = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = &self.email {
            params.push(("de", email.as_str()));
        }
        Url::parse_with_params(&self.endpoint, &params)
            .map_err(|e| Error::Validation(format!("bad translation endpoint: {e}")))
    }
}

fn parse_response(body: &str) -> Result<String> {
    let response: TranslationResponse = serde_json::from_str(body)?;

    let status = match &response.response_status {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    };
    if status.is_some_and(|code| code != 200) {
        let details = response.response_details.unwrap_or_default();
        return Err(Error::Validation(format!("translation service refused: {details}")));
    }

    let translated = response.response_data.translated_text.trim().to_string();
    if translated.is_empty() {
        return Err(Error::NotFound);
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(email: Option<&str>) -> TranslationClient {
        TranslationClient::new(&TranslationConfig {
            email: email.map(str::to_string),
            ..TranslationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_url() {
        let url = client(None)
            .request_url("good morning", Language::English, Language::Polish)
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("api.mymemory.translated.net"));
        assert!(pairs.contains(&("q".to_string(), "good morning".to_string())));
        assert!(pairs.contains(&("langpair".to_string(), "en|pl".to_string())));
    }

    #[test]
    fn test_request_url_with_email() {
        let url = client(Some("me@example.com"))
            .request_url("dog", Language::German, Language::French)
            .unwrap();
        assert!(url.as_str().contains("de=me%40example.com"));
        assert!(url.as_str().contains("langpair=de%7Cfr"));
    }

    #[test]
    fn test_parse_ok_response() {
        let body = r#"{"responseData":{"translatedText":"dzień dobry ","match":1},"responseStatus":200,"responseDetails":""}"#;
        assert_eq!(parse_response(body).unwrap(), "dzień dobry");
    }

    #[test]
    fn test_parse_error_status() {
        let body = r#"{"responseData":{"translatedText":"QUOTA EXCEEDED"},"responseStatus":"429","responseDetails":"quota"}"#;
        assert!(matches!(parse_response(body), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_response("<html>"), Err(Error::Json(_))));
        let empty = r#"{"responseData":{"translatedText":""},"responseStatus":200}"#;
        assert!(matches!(parse_response(empty), Err(Error::NotFound)));
    }

    #[test]
    fn test_empty_text_fails_open() {
        let client = client(None);
        assert!(client.translate("   ", Language::English, Language::Polish).is_err());
        assert_eq!(client.suggest("   ", Language::English, Language::Polish), None);
    }
}
