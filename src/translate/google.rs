use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::interface::TranslatorInterface;
use crate::config::TranslationConfig;
use crate::error::TranslationError;
use crate::languages::LanguageCode;

/// Client for the Google Cloud Translation v2 REST endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequestBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponseBody {
    data: Option<TranslateData>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Option<Vec<TranslatedItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedItem {
    translated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

impl GoogleTranslateClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> anyhow::Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl TranslatorInterface for GoogleTranslateClient {
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, TranslationError> {
        if text.is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let body = TranslateRequestBody {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: "text",
        };

        debug!("Sending translation request: {} -> {}, {} chars", source, target, text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Translation request failed: {}", e);
                TranslationError::from(e)
            })?;

        let status = response.status();
        let payload = response.text().await.map_err(|e| {
            error!("Failed to read translation response: {}", e);
            TranslationError::from(e)
        })?;

        debug!("Translation response status: {}", status);
        parse_response(&payload)
    }
}

/// Extract the first translation from a provider response body.
///
/// The body is inspected regardless of HTTP status since the provider
/// reports errors as a JSON object on 4xx responses.
fn parse_response(payload: &str) -> Result<String, TranslationError> {
    let body: TranslateResponseBody = serde_json::from_str(payload).map_err(|e| {
        error!("Unexpected translation response: {}", e);
        TranslationError::MalformedResponse
    })?;

    let first = body
        .data
        .and_then(|data| data.translations)
        .and_then(|translations| translations.into_iter().next())
        .and_then(|item| item.translated_text);

    if let Some(translated) = first {
        return Ok(translated);
    }

    if let Some(provider_error) = body.error {
        let message = provider_error
            .message
            .unwrap_or_else(|| "Unknown error".to_string());
        error!("API Error: {}", message);
        return Err(TranslationError::Api(message));
    }

    error!("Translation response has no translations");
    Err(TranslationError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const PATH: &str = "/language/translate/v2";

    async fn spawn_provider(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}{}", addr, PATH)
    }

    fn client(endpoint: String, timeout: Duration) -> GoogleTranslateClient {
        GoogleTranslateClient::new(endpoint, "test-key".to_string(), timeout).unwrap()
    }

    #[test]
    fn test_from_config_builds_client() {
        let config = TranslationConfig {
            api_key: "test-key".to_string(),
            ..TranslationConfig::default()
        };
        let client = GoogleTranslateClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint, config.endpoint);
        assert_eq!(client.api_key, "test-key");
    }

    #[test]
    fn test_parse_success_is_verbatim() {
        let payload = r#"{"data":{"translations":[{"translatedText":"  hola &amp; adiós \n"},{"translatedText":"second"}]}}"#;
        assert_eq!(parse_response(payload).unwrap(), "  hola &amp; adiós \n");
    }

    #[test]
    fn test_parse_empty_translation_is_success() {
        let payload = r#"{"data":{"translations":[{"translatedText":""}]}}"#;
        assert_eq!(parse_response(payload).unwrap(), "");
    }

    #[test]
    fn test_parse_api_error() {
        let payload = r#"{"error":{"code":400,"message":"Invalid Value","errors":[]}}"#;
        assert_eq!(
            parse_response(payload),
            Err(TranslationError::Api("Invalid Value".to_string()))
        );
    }

    #[test]
    fn test_parse_malformed_shapes() {
        for payload in [
            "not json",
            "{}",
            r#"{"data":{}}"#,
            r#"{"data":{"translations":[]}}"#,
            r#"{"data":{"translations":"hola"}}"#,
            r#"{"data":{"translations":[{"text":"hola"}]}}"#,
        ] {
            assert_eq!(
                parse_response(payload),
                Err(TranslationError::MalformedResponse),
                "payload: {}",
                payload
            );
        }
    }

    #[tokio::test]
    async fn test_translate_sends_expected_request() {
        async fn echo(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Json<Value> {
            let summary = format!(
                "{}|{}|{}|{}|{}",
                query.get("key").cloned().unwrap_or_default(),
                body["q"].as_str().unwrap_or_default(),
                body["source"].as_str().unwrap_or_default(),
                body["target"].as_str().unwrap_or_default(),
                body["format"].as_str().unwrap_or_default(),
            );
            Json(json!({ "data": { "translations": [{ "translatedText": summary }] } }))
        }

        let endpoint = spawn_provider(Router::new().route(PATH, post(echo))).await;
        let translated = client(endpoint, Duration::from_secs(5))
            .translate("hello", LanguageCode::En, LanguageCode::Es)
            .await
            .unwrap();

        assert_eq!(translated, "test-key|hello|en|es|text");
    }

    #[tokio::test]
    async fn test_translate_surfaces_provider_error_on_4xx() {
        async fn reject() -> impl IntoResponse {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "code": 400, "message": "Invalid Value" } })),
            )
        }

        let endpoint = spawn_provider(Router::new().route(PATH, post(reject))).await;
        let result = client(endpoint, Duration::from_secs(5))
            .translate("hello", LanguageCode::En, LanguageCode::Es)
            .await;

        assert_eq!(result, Err(TranslationError::Api("Invalid Value".to_string())));
    }

    #[tokio::test]
    async fn test_translate_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(format!("http://{}{}", addr, PATH), Duration::from_secs(5))
            .translate("hello", LanguageCode::En, LanguageCode::Es)
            .await;

        assert!(matches!(result, Err(TranslationError::Connection(_))));
    }

    #[tokio::test]
    async fn test_translate_times_out() {
        async fn stall() -> Json<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "data": { "translations": [{ "translatedText": "late" }] } }))
        }

        let endpoint = spawn_provider(Router::new().route(PATH, post(stall))).await;
        let result = client(endpoint, Duration::from_millis(200))
            .translate("hello", LanguageCode::En, LanguageCode::Es)
            .await;

        assert_eq!(result, Err(TranslationError::Timeout));
    }

    #[tokio::test]
    async fn test_empty_input_skips_network() {
        // Nothing listens here; an attempted request would be a connection error.
        let result = client("http://127.0.0.1:9/unused".to_string(), Duration::from_secs(1))
            .translate("", LanguageCode::En, LanguageCode::Es)
            .await;

        assert_eq!(result, Err(TranslationError::EmptyInput));
    }
}
