//! Content Agent: answers page-level requests for the tab it is attached to.
//!
//! Stateless between requests: `PERFORM_AUTOFILL` names its target field by
//! DOM path. Without one it falls back to the focused field, so it also works
//! without a preceding `GET_FORM_FIELD_DATA`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::messaging::{FormFieldData, Listener, Payload, Request, Response};
use crate::models::value_as_text;

const NO_FIELD_MESSAGE: &str = "No relevant form field found on this page.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Form field {0} no longer exists on the page")]
    FieldMissing(String),
}

/// The visited page, as far as the content agent needs to see it.
pub trait Page: Send + Sync {
    /// The field the user is currently focused on, if one can be identified.
    fn focused_field(&self) -> Option<FormFieldData>;

    fn write(&self, dom_path: &str, value: &str) -> Result<(), PageError>;
}

pub struct ContentAgent {
    page: Arc<dyn Page>,
}

impl ContentAgent {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self { page }
    }

    fn autofill(&self, path: &str, value: &serde_json::Value, target: Option<String>) -> Response {
        let dom_path = match target {
            Some(dom_path) => dom_path,
            None => match self.page.focused_field() {
                Some(field) => field.dom_path,
                None => return Response::error(NO_FIELD_MESSAGE),
            },
        };
        let text = value_as_text(value);

        match self.page.write(&dom_path, &text) {
            Ok(()) => {
                info!(path, value = %text, dom_path = %dom_path, "autofill executed");
                Response::ack()
            }
            Err(e) => Response::error(e.to_string()),
        }
    }
}

#[async_trait]
impl Listener for ContentAgent {
    fn name(&self) -> &'static str {
        "content-agent"
    }

    fn accepts(&self, request: &Request) -> bool {
        matches!(
            request,
            Request::GetFormFieldData | Request::PerformAutofill { .. }
        )
    }

    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GetFormFieldData => match self.page.focused_field() {
                Some(form_data) => Response::success(Payload::FormData { form_data }),
                None => Response::error(NO_FIELD_MESSAGE),
            },
            Request::PerformAutofill {
                path,
                value,
                dom_path,
            } => self.autofill(&path, &value, dom_path),
            other => Response::error(format!(
                "{} is not handled by the content agent",
                other.action()
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MockPage
// ────────────────────────────────────────────────────────────────────────────

/// A value written into a page field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub dom_path: String,
    pub value: String,
}

#[derive(Default)]
struct PageState {
    /// Fields in focus order; the first one is focused.
    fields: Vec<FormFieldData>,
    values: BTreeMap<String, String>,
    writes: Vec<FieldWrite>,
}

/// In-memory page standing in for real DOM access. Records every write.
#[derive(Default)]
pub struct MockPage {
    state: Mutex<PageState>,
}

impl MockPage {
    /// A page with the application form's email field focused.
    pub fn new() -> Self {
        Self::with_fields(vec![FormFieldData {
            label: "Primary Email Address".to_string(),
            placeholder: "e.g. john.doe@example.com".to_string(),
            dom_path: "/html/body/form/input[3]".to_string(),
        }])
    }

    pub fn with_fields(fields: Vec<FormFieldData>) -> Self {
        Self {
            state: Mutex::new(PageState {
                fields,
                ..PageState::default()
            }),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a field behind the ones already on the page.
    pub fn add_field(&self, field: FormFieldData) {
        self.state().fields.push(field);
    }

    pub fn remove_field(&self, dom_path: &str) {
        self.state().fields.retain(|f| f.dom_path != dom_path);
    }

    pub fn value_of(&self, dom_path: &str) -> Option<String> {
        self.state().values.get(dom_path).cloned()
    }

    pub fn writes(&self) -> Vec<FieldWrite> {
        self.state().writes.clone()
    }
}

impl Page for MockPage {
    fn focused_field(&self) -> Option<FormFieldData> {
        self.state().fields.first().cloned()
    }

    fn write(&self, dom_path: &str, value: &str) -> Result<(), PageError> {
        let mut state = self.state();
        if !state.fields.iter().any(|f| f.dom_path == dom_path) {
            return Err(PageError::FieldMissing(dom_path.to_string()));
        }
        state
            .values
            .insert(dom_path.to_string(), value.to_string());
        state.writes.push(FieldWrite {
            dom_path: dom_path.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}
