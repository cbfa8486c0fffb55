//! Orchestrator: the background agent, and the only caller of the backend.
//!
//! Flow per request: action match → backend call → `{status, ...}` reply.
//! Requests run concurrently on the hub; each reply goes to its own caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::gateway::Backend;
use crate::messaging::{is_restricted_url, Listener, Payload, Request, Response, Tab};

/// Outcome of a toolbar-icon click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidePanel {
    Opened,
    /// Browser-internal page; the panel cannot be enabled there.
    Refused,
}

pub struct Orchestrator {
    backend: Arc<dyn Backend>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Decides whether the side panel may open for `tab`. Never fails:
    /// restricted pages are logged and refused.
    pub fn on_action_clicked(&self, tab: &Tab) -> SidePanel {
        if is_restricted_url(&tab.url) {
            warn!(
                tab = %tab.id,
                url = %tab.url,
                "Side panel cannot be opened on this page (restricted URL)"
            );
            return SidePanel::Refused;
        }
        info!(tab = %tab.id, "Side panel enabled");
        SidePanel::Opened
    }
}

#[async_trait]
impl Listener for Orchestrator {
    fn name(&self) -> &'static str {
        "orchestrator"
    }

    fn accepts(&self, request: &Request) -> bool {
        matches!(
            request,
            Request::SemanticAnalysis { .. } | Request::GenerateCoverLetter { .. }
        )
    }

    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::SemanticAnalysis { data } => {
                match self.backend.semantic_analysis(&data.form_field_data).await {
                    Ok(mapping) => {
                        info!(path = %mapping.path, "Semantic analysis result");
                        Response::success(Payload::Mapping { mapping })
                    }
                    Err(e) => {
                        error!("Semantic analysis failed: {e}");
                        Response::error(e.to_string())
                    }
                }
            }
            Request::GenerateCoverLetter { data } => {
                match self.backend.generate_cover_letter(&data).await {
                    Ok(cover_letter) => {
                        info!(chars = cover_letter.len(), "Cover letter generated");
                        Response::success(Payload::CoverLetter { cover_letter })
                    }
                    Err(e) => {
                        error!("Cover letter generation failed: {e}");
                        Response::error(e.to_string())
                    }
                }
            }
            other => Response::error(format!(
                "{} is not handled by the orchestrator",
                other.action()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{BackendGateway, GatewayError};
    use crate::messaging::{
        CoverLetterData, FieldMapping, FormFieldData, MessageHub, SemanticAnalysisData, TabId,
    };
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    /// Backend answering from fixed data after a configurable delay.
    struct ScriptedBackend {
        mapping_path: Option<String>,
        delay: Duration,
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn semantic_analysis(
            &self,
            form_field_data: &FormFieldData,
        ) -> Result<FieldMapping, GatewayError> {
            tokio::time::sleep(self.delay).await;
            match &self.mapping_path {
                Some(path) => Ok(FieldMapping { path: path.clone() }),
                None => Err(GatewayError::Api {
                    endpoint: "/api/llm/semantic-analysis",
                    status: 500,
                    body: format!("cannot map {}", form_field_data.label),
                }),
            }
        }

        async fn generate_cover_letter(
            &self,
            request: &CoverLetterData,
        ) -> Result<String, GatewayError> {
            Ok(format!("Dear team, re: {}", request.job_description))
        }
    }

    fn scripted(path: Option<&str>, delay_ms: u64) -> Orchestrator {
        Orchestrator::new(Arc::new(ScriptedBackend {
            mapping_path: path.map(str::to_string),
            delay: Duration::from_millis(delay_ms),
        }))
    }

    fn semantic_request(label: &str) -> Request {
        Request::SemanticAnalysis {
            data: SemanticAnalysisData {
                form_field_data: FormFieldData {
                    label: label.to_string(),
                    placeholder: String::new(),
                    dom_path: "/html/body/form/input[1]".to_string(),
                },
            },
        }
    }

    fn cover_letter_request(job: &str) -> Request {
        Request::GenerateCoverLetter {
            data: CoverLetterData {
                job_description: job.to_string(),
                json_resume: json!({}),
                relevance_scores: json!({}),
            },
        }
    }

    #[tokio::test]
    async fn test_semantic_analysis_success_carries_mapping() {
        let response = scripted(Some("basics.phone"), 0)
            .handle(semantic_request("Phone"))
            .await;
        assert_eq!(
            response,
            Response::success(Payload::Mapping {
                mapping: FieldMapping {
                    path: "basics.phone".to_string()
                }
            })
        );
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_error_status() {
        let response = scripted(None, 0).handle(semantic_request("Phone")).await;
        assert_eq!(
            response,
            Response::error("API call failed (/api/llm/semantic-analysis): 500 - cannot map Phone")
        );
    }

    #[test]
    fn test_page_actions_are_not_accepted() {
        let orchestrator = scripted(None, 0);
        assert!(!orchestrator.accepts(&Request::GetFormFieldData));
        assert!(orchestrator.accepts(&semantic_request("x")));
        assert!(orchestrator.accepts(&cover_letter_request("x")));
    }

    #[tokio::test]
    async fn test_concurrent_analysis_and_cover_letter_do_not_cross() {
        let runtime = MessageHub::new()
            .with_listener(scripted(Some("basics.email"), 60))
            .spawn();

        let (analysis, letter) = tokio::join!(
            runtime.send(semantic_request("Email")),
            runtime.send(cover_letter_request("Rust engineer")),
        );

        assert_eq!(
            analysis.unwrap(),
            Response::success(Payload::Mapping {
                mapping: FieldMapping {
                    path: "basics.email".to_string()
                }
            })
        );
        assert_eq!(
            letter.unwrap(),
            Response::success(Payload::CoverLetter {
                cover_letter: "Dear team, re: Rust engineer".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_through_http_gateway() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/llm/generate-cover-letter");
                then.status(200)
                    .json_body(json!({ "coverLetter": "Dear hiring manager," }));
            })
            .await;

        let gateway = BackendGateway::new(server.base_url(), "t", None).unwrap();
        let runtime = MessageHub::new()
            .with_listener(Orchestrator::new(Arc::new(gateway)))
            .spawn();

        let response = runtime.send(cover_letter_request("Senior")).await.unwrap();
        assert_eq!(
            response,
            Response::success(Payload::CoverLetter {
                cover_letter: "Dear hiring manager,".to_string()
            })
        );
    }

    #[test]
    fn test_side_panel_refused_on_restricted_pages() {
        let orchestrator = scripted(None, 0);
        let restricted = Tab {
            id: TabId(1),
            url: "chrome://extensions".to_string(),
        };
        let regular = Tab {
            id: TabId(2),
            url: "https://jobs.example.com/apply".to_string(),
        };
        assert_eq!(orchestrator.on_action_clicked(&restricted), SidePanel::Refused);
        assert_eq!(orchestrator.on_action_clicked(&regular), SidePanel::Opened);
    }
}
