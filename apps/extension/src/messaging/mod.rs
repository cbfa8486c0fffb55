//! Message contract shared by the side panel, the orchestrator and the content agent.
//!
//! Requests are tagged by `action`, responses by `status`, matching the JSON
//! envelopes the agents exchange:
//!
//! ```text
//! { id, action, data?, path?, value? }  →  { status: "success" | "error", ...payload }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod hub;
pub mod tabs;

pub use hub::{AgentHandle, Listener, MessageHub, MessagingError};
pub use tabs::{is_restricted_url, Tab, TabId, TabRegistry};

// ────────────────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────────────────

/// Metadata of the form field the user is focused on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFieldData {
    pub label: String,
    pub placeholder: String,
    pub dom_path: String,
}

/// Where in the resume record the value for a form field lives, e.g. `basics.phone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticAnalysisData {
    pub form_field_data: FormFieldData,
}

/// Also the exact body of the backend's generate-cover-letter call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterData {
    pub job_description: String,
    pub json_resume: Value,
    pub relevance_scores: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Content agent: describe the focused form field.
    GetFormFieldData,
    /// Content agent: write `value` into the field at `dom_path`, or into the
    /// focused field when no target is given. `path` is the resume path it came from.
    PerformAutofill {
        path: String,
        value: Value,
        #[serde(rename = "domPath", default, skip_serializing_if = "Option::is_none")]
        dom_path: Option<String>,
    },
    /// Orchestrator: map form field metadata to a resume path.
    SemanticAnalysis { data: SemanticAnalysisData },
    /// Orchestrator: draft a cover letter.
    GenerateCoverLetter { data: CoverLetterData },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GetFormFieldData => "GET_FORM_FIELD_DATA",
            Request::PerformAutofill { .. } => "PERFORM_AUTOFILL",
            Request::SemanticAnalysis { .. } => "SEMANTIC_ANALYSIS",
            Request::GenerateCoverLetter { .. } => "GENERATE_COVER_LETTER",
        }
    }
}

/// A request stamped with its correlation id. Lives for one request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: Request,
}

impl Envelope {
    pub fn new(request: Request) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Responses
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success(Payload),
    Error { message: String },
}

/// Action-specific success fields. `Empty` must stay last: it matches any object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    FormData {
        #[serde(rename = "formData")]
        form_data: FormFieldData,
    },
    Mapping {
        mapping: FieldMapping,
    },
    CoverLetter {
        #[serde(rename = "coverLetter")]
        cover_letter: String,
    },
    Empty {},
}

impl Response {
    pub fn success(payload: Payload) -> Self {
        Response::Success(payload)
    }

    pub fn ack() -> Self {
        Response::Success(Payload::Empty {})
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}
