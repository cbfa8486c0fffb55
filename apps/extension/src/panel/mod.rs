//! Panel Controller: the user-facing entry point.
//!
//! Owns the Profile (single mutation surface, saved after every change),
//! runs the Autofill and Cover Letter workflows, and publishes its view
//! (workflow state + output) on a `watch` channel for whatever renders it.
//!
//! Autofill:     Validating → FetchingField → Analyzing → WritingBack → Done | Error
//! Cover letter: Requesting → Done | Error
//!
//! Only one workflow runs at a time; a second trigger while one is pending
//! is rejected with `WorkflowError::Busy`.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::errors::WorkflowError;
use crate::messaging::{
    AgentHandle, CoverLetterData, Payload, Request, Response, SemanticAnalysisData, TabRegistry,
};
use crate::models::{build_resume_record, resolve_path, value_as_text, Profile, ProfileField};
use crate::store::ProfileStore;

const FORM_DATA_FAILED: &str = "Failed to get form data from current page.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    Validating,
    FetchingField,
    Analyzing,
    WritingBack,
    Requesting,
    Done,
    Error,
}

impl WorkflowState {
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            WorkflowState::Validating
                | WorkflowState::FetchingField
                | WorkflowState::Analyzing
                | WorkflowState::WritingBack
                | WorkflowState::Requesting
        )
    }
}

/// What the panel currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub state: WorkflowState,
    pub result: Option<String>,
    pub error: Option<String>,
}

pub struct PanelController {
    store: Arc<dyn ProfileStore>,
    runtime: AgentHandle,
    tabs: TabRegistry,
    profile: Mutex<Profile>,
    base_resume: Option<Value>,
    view: watch::Sender<PanelView>,
}

impl PanelController {
    /// Loads the profile once and builds the controller. A failing store
    /// degrades to an empty in-memory profile.
    pub async fn start(
        store: Arc<dyn ProfileStore>,
        runtime: AgentHandle,
        tabs: TabRegistry,
    ) -> Self {
        let profile = match store.load().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Could not load the stored profile, starting empty: {e}");
                Profile::default()
            }
        };
        let (view, _) = watch::channel(PanelView::default());

        Self {
            store,
            runtime,
            tabs,
            profile: Mutex::new(profile),
            base_resume: None,
            view,
        }
    }

    /// Base resume document (work history etc.) the profile is overlaid onto.
    pub fn with_base_resume(mut self, resume: Value) -> Self {
        self.base_resume = Some(resume);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PanelView {
        self.view.borrow().clone()
    }

    /// Triggering controls are disabled while a workflow is pending.
    pub fn controls_enabled(&self) -> bool {
        !self.view.borrow().state.is_pending()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Profile editing
    // ────────────────────────────────────────────────────────────────────────

    pub async fn profile(&self) -> Profile {
        self.profile.lock().await.clone()
    }

    pub async fn update_field(&self, field: ProfileField, value: impl Into<String>) -> Profile {
        let mut profile = self.profile.lock().await;
        profile.update_field(field, value);
        self.persist(&profile).await;
        profile.clone()
    }

    /// Appends uploaded or dropped documents. Returns how many were added.
    pub async fn add_documents<I, S>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut profile = self.profile.lock().await;
        let added = profile.add_documents(names);
        if added > 0 {
            self.persist(&profile).await;
        }
        added
    }

    /// Removes the first document with this name.
    pub async fn remove_document(&self, name: &str) -> bool {
        let mut profile = self.profile.lock().await;
        let removed = profile.remove_document(name);
        if removed {
            self.persist(&profile).await;
        }
        removed
    }

    /// Saves while the profile lock is held, so stored order matches edit order.
    async fn persist(&self, profile: &Profile) {
        if let Err(e) = self.store.save(profile).await {
            warn!("Profile not persisted, keeping changes in memory: {e}");
        }
    }

    pub async fn resume_record(&self) -> Value {
        let profile = self.profile.lock().await;
        build_resume_record(self.base_resume.as_ref(), &profile)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Workflows
    // ────────────────────────────────────────────────────────────────────────

    /// Fills the focused field of the active tab from the resume record.
    /// Returns the confirmation message shown on success.
    pub async fn autofill(&self) -> Result<String, WorkflowError> {
        self.begin(WorkflowState::Validating)?;
        let outcome = self.run_autofill().await;
        self.finish(&outcome);
        outcome
    }

    /// Drafts a cover letter for `job_description`. Returns the letter verbatim.
    pub async fn generate_cover_letter(
        &self,
        job_description: &str,
        relevance_scores: Value,
    ) -> Result<String, WorkflowError> {
        self.begin(WorkflowState::Requesting)?;
        let outcome = self
            .run_cover_letter(job_description, relevance_scores)
            .await;
        self.finish(&outcome);
        outcome
    }

    async fn run_autofill(&self) -> Result<String, WorkflowError> {
        let missing = self.profile.lock().await.missing_required();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            return Err(WorkflowError::Validation(format!(
                "Please fill in the required profile fields: {}",
                labels.join(", ")
            )));
        }

        self.advance(WorkflowState::FetchingField);
        let tab = self
            .tabs
            .active()
            .await
            .ok_or_else(|| WorkflowError::AgentUnavailable("No active tab found.".to_string()))?;
        let form_data = match self.tabs.send(tab.id, Request::GetFormFieldData).await {
            Ok(Response::Success(Payload::FormData { form_data })) => form_data,
            Ok(other) => {
                warn!(tab = %tab.id, ?other, "content agent could not describe a form field");
                return Err(WorkflowError::AgentUnavailable(FORM_DATA_FAILED.to_string()));
            }
            Err(e) => {
                warn!(tab = %tab.id, "content agent unreachable: {e}");
                return Err(WorkflowError::AgentUnavailable(FORM_DATA_FAILED.to_string()));
            }
        };

        self.advance(WorkflowState::Analyzing);
        let request = Request::SemanticAnalysis {
            data: SemanticAnalysisData {
                form_field_data: form_data.clone(),
            },
        };
        let mapping = match self.runtime.send(request).await? {
            Response::Success(Payload::Mapping { mapping }) => mapping,
            Response::Error { message } => return Err(WorkflowError::Remote(message)),
            Response::Success(other) => {
                return Err(WorkflowError::Remote(format!(
                    "Unexpected reply to SEMANTIC_ANALYSIS: {other:?}"
                )))
            }
        };

        self.advance(WorkflowState::WritingBack);
        let record = self.resume_record().await;
        let value = resolve_path(&record, &mapping.path)
            .cloned()
            .ok_or_else(|| WorkflowError::Resolution {
                path: mapping.path.clone(),
            })?;
        let text = value_as_text(&value);

        let write = Request::PerformAutofill {
            path: mapping.path.clone(),
            value,
            dom_path: Some(form_data.dom_path.clone()),
        };
        match self.tabs.send(tab.id, write).await {
            Ok(Response::Success(_)) => {}
            Ok(Response::Error { message }) => return Err(WorkflowError::WriteFailed(message)),
            Err(e) => return Err(WorkflowError::AgentUnavailable(e.to_string())),
        }

        info!(path = %mapping.path, "Autofill completed");
        Ok(format!(
            "Mapped to: {}. Autofill (value: {text}) executed.",
            mapping.path
        ))
    }

    async fn run_cover_letter(
        &self,
        job_description: &str,
        relevance_scores: Value,
    ) -> Result<String, WorkflowError> {
        let request = Request::GenerateCoverLetter {
            data: CoverLetterData {
                job_description: job_description.to_string(),
                json_resume: self.resume_record().await,
                relevance_scores,
            },
        };

        match self.runtime.send(request).await? {
            Response::Success(Payload::CoverLetter { cover_letter }) => Ok(cover_letter),
            Response::Error { message } => Err(WorkflowError::Remote(message)),
            Response::Success(other) => Err(WorkflowError::Remote(format!(
                "Unexpected reply to GENERATE_COVER_LETTER: {other:?}"
            ))),
        }
    }

    /// Enters the first pending state, unless a workflow is already pending.
    fn begin(&self, state: WorkflowState) -> Result<(), WorkflowError> {
        let started = self.view.send_if_modified(|view| {
            if view.state.is_pending() {
                return false;
            }
            *view = PanelView {
                state,
                result: None,
                error: None,
            };
            true
        });

        if started {
            debug!(?state, "workflow started");
            Ok(())
        } else {
            Err(WorkflowError::Busy)
        }
    }

    fn advance(&self, state: WorkflowState) {
        debug!(?state, "workflow step");
        self.view.send_modify(|view| view.state = state);
    }

    fn finish(&self, outcome: &Result<String, WorkflowError>) {
        self.view.send_modify(|view| match outcome {
            Ok(text) => {
                view.state = WorkflowState::Done;
                view.result = Some(text.clone());
            }
            Err(e) => {
                view.state = WorkflowState::Error;
                view.error = Some(e.to_string());
            }
        });
    }
}
