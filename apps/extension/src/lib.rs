//! Job application assistant: a side panel that keeps the applicant's
//! profile, autofills the focused form field of the visited page, and drafts
//! cover letters through a backend LLM service.
//!
//! Three agents talk only through messages:
//! - `panel` is the user-facing controller,
//! - `agents::Orchestrator` is the only caller of the backend,
//! - `agents::ContentAgent` reads and writes the page of its tab.

pub mod agents;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod messaging;
pub mod models;
pub mod panel;
pub mod store;

pub use config::Config;
pub use errors::WorkflowError;
pub use panel::{PanelController, PanelView, WorkflowState};
