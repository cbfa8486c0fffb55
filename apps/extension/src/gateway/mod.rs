/// Backend Gateway: the single point of entry for all backend LLM calls.
///
/// ARCHITECTURAL RULE: only the orchestrator talks to this module. The side
/// panel and the content agent never reach the backend directly.
///
/// One attempt per call: no retries, no backoff. Failures carry the endpoint,
/// status and raw body so they can be shown to the user verbatim.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::messaging::{CoverLetterData, FieldMapping, FormFieldData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SemanticAnalysis,
    GenerateCoverLetter,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::SemanticAnalysis => "/api/llm/semantic-analysis",
            Endpoint::GenerateCoverLetter => "/api/llm/generate-cover-letter",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API call failed ({endpoint}): {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("API call failed ({endpoint}): {status} - {body}")]
    Api {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The two remote operations the orchestrator needs.
/// Carried by the orchestrator as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn semantic_analysis(
        &self,
        form_field_data: &FormFieldData,
    ) -> Result<FieldMapping, GatewayError>;

    async fn generate_cover_letter(&self, request: &CoverLetterData)
        -> Result<String, GatewayError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SemanticAnalysisBody<'a> {
    form_field_data: &'a FormFieldData,
}

#[derive(Debug, Deserialize)]
struct SemanticAnalysisReply {
    mapping: FieldMapping,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverLetterReply {
    cover_letter: String,
}

/// Authenticated JSON-over-HTTP client for the backend.
#[derive(Clone)]
pub struct BackendGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl BackendGateway {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().map_err(GatewayError::Client)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `body` as JSON to `endpoint` and parses the JSON reply.
    pub async fn call<B, T>(&self, endpoint: Endpoint, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = endpoint.path();
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::Http {
                endpoint: path,
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| GatewayError::Http {
            endpoint: path,
            source,
        })?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                endpoint: path,
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(endpoint = path, status = status.as_u16(), "backend call succeeded");

        serde_json::from_str(&text).map_err(|source| GatewayError::Decode {
            endpoint: path,
            source,
        })
    }
}

#[async_trait]
impl Backend for BackendGateway {
    async fn semantic_analysis(
        &self,
        form_field_data: &FormFieldData,
    ) -> Result<FieldMapping, GatewayError> {
        let reply: SemanticAnalysisReply = self
            .call(
                Endpoint::SemanticAnalysis,
                &SemanticAnalysisBody { form_field_data },
            )
            .await?;
        Ok(reply.mapping)
    }

    async fn generate_cover_letter(
        &self,
        request: &CoverLetterData,
    ) -> Result<String, GatewayError> {
        let reply: CoverLetterReply = self.call(Endpoint::GenerateCoverLetter, request).await?;
        Ok(reply.cover_letter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn email_field() -> FormFieldData {
        FormFieldData {
            label: "Primary Email Address".to_string(),
            placeholder: "e.g. john.doe@example.com".to_string(),
            dom_path: "/html/body/form/input[3]".to_string(),
        }
    }

    fn gateway(server: &MockServer) -> BackendGateway {
        BackendGateway::new(server.base_url(), "test-token", Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(
            Endpoint::SemanticAnalysis.path(),
            "/api/llm/semantic-analysis"
        );
        assert_eq!(
            Endpoint::GenerateCoverLetter.path(),
            "/api/llm/generate-cover-letter"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = BackendGateway::new("http://localhost:3000/", "t", None).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_semantic_analysis_sends_bearer_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/llm/semantic-analysis")
                    .header("authorization", "Bearer test-token")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "formFieldData": {
                            "label": "Primary Email Address",
                            "placeholder": "e.g. john.doe@example.com",
                            "dom_path": "/html/body/form/input[3]"
                        }
                    }));
                then.status(200)
                    .json_body(json!({ "mapping": { "path": "basics.email" } }));
            })
            .await;

        let mapping = gateway(&server)
            .semantic_analysis(&email_field())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(mapping.path, "basics.email");
    }

    #[tokio::test]
    async fn test_non_success_status_preserves_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/llm/semantic-analysis");
                then.status(500).body("internal error");
            })
            .await;

        let err = gateway(&server)
            .semantic_analysis(&email_field())
            .await
            .unwrap_err();

        match &err {
            GatewayError::Api {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(*endpoint, "/api/llm/semantic-analysis");
                assert_eq!(*status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "API call failed (/api/llm/semantic-analysis): 500 - internal error"
        );
    }

    #[tokio::test]
    async fn test_call_is_attempted_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/llm/generate-cover-letter");
                then.status(503).body("unavailable");
            })
            .await;

        let request = CoverLetterData {
            job_description: "Senior engineer".to_string(),
            json_resume: json!({}),
            relevance_scores: json!({}),
        };
        assert!(gateway(&server).generate_cover_letter(&request).await.is_err());
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/llm/semantic-analysis");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let err = gateway(&server)
            .semantic_analysis(&email_field())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Decode {
                endpoint: "/api/llm/semantic-analysis",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cover_letter_body_and_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/llm/generate-cover-letter")
                    .json_body(json!({
                        "jobDescription": "Senior engineer",
                        "jsonResume": { "basics": { "name": "Alice Johnson" } },
                        "relevanceScores": { "skills": { "React": 95 } }
                    }));
                then.status(200)
                    .json_body(json!({ "coverLetter": "Dear hiring team," }));
            })
            .await;

        let request = CoverLetterData {
            job_description: "Senior engineer".to_string(),
            json_resume: json!({ "basics": { "name": "Alice Johnson" } }),
            relevance_scores: json!({ "skills": { "React": 95 } }),
        };
        let letter = gateway(&server)
            .generate_cover_letter(&request)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(letter, "Dear hiring team,");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        // Nothing listens on port 9 on test hosts.
        let gateway =
            BackendGateway::new("http://127.0.0.1:9", "t", Some(Duration::from_secs(2))).unwrap();
        let err = gateway.semantic_analysis(&email_field()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Http { .. }));
        assert!(err.to_string().contains("/api/llm/semantic-analysis"));
    }
}
