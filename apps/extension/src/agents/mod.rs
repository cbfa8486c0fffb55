// The two agents answering on message hubs: one per page, one in the background.

pub mod content;
pub mod orchestrator;

pub use content::{ContentAgent, FieldWrite, MockPage, Page, PageError};
pub use orchestrator::{Orchestrator, SidePanel};
