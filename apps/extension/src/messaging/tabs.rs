//! Tab registry: open tabs, the active tab, and the content agent attached to each.
//!
//! Browser-internal pages never get a content agent, so messages to them
//! fail with `NoReceiver` the same way they would for an unscriptable page.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{AgentHandle, MessagingError, Request, Response};

/// URL prefixes where content scripts cannot run and the side panel cannot open.
const RESTRICTED_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "chrome-untrusted://",
    "edge://",
    "about:",
    "devtools://",
];

pub fn is_restricted_url(url: &str) -> bool {
    let url = url.trim_start();
    RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| {
            url.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

struct TabEntry {
    tab: Tab,
    content: Option<AgentHandle>,
}

#[derive(Default)]
struct Tabs {
    next_id: u32,
    entries: BTreeMap<TabId, TabEntry>,
    active: Option<TabId>,
}

#[derive(Clone, Default)]
pub struct TabRegistry {
    inner: Arc<RwLock<Tabs>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a tab and makes it active. A content agent offered for a
    /// restricted URL is dropped.
    pub async fn open(&self, url: impl Into<String>, content: Option<AgentHandle>) -> Tab {
        let url = url.into();
        let content = if is_restricted_url(&url) {
            if content.is_some() {
                debug!(%url, "content agent not attached to restricted page");
            }
            None
        } else {
            content
        };

        let mut tabs = self.inner.write().await;
        tabs.next_id += 1;
        let tab = Tab {
            id: TabId(tabs.next_id),
            url,
        };
        tabs.entries.insert(
            tab.id,
            TabEntry {
                tab: tab.clone(),
                content,
            },
        );
        tabs.active = Some(tab.id);
        debug!(tab = %tab.id, url = %tab.url, "tab opened");
        tab
    }

    pub async fn activate(&self, id: TabId) -> bool {
        let mut tabs = self.inner.write().await;
        if tabs.entries.contains_key(&id) {
            tabs.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Closing the active tab leaves no tab active.
    pub async fn close(&self, id: TabId) -> bool {
        let mut tabs = self.inner.write().await;
        if tabs.active == Some(id) {
            tabs.active = None;
        }
        tabs.entries.remove(&id).is_some()
    }

    pub async fn active(&self) -> Option<Tab> {
        let tabs = self.inner.read().await;
        tabs.active
            .and_then(|id| tabs.entries.get(&id))
            .map(|entry| entry.tab.clone())
    }

    pub async fn get(&self, id: TabId) -> Option<Tab> {
        let tabs = self.inner.read().await;
        tabs.entries.get(&id).map(|entry| entry.tab.clone())
    }

    /// Sends a request to the content agent of one tab.
    pub async fn send(&self, id: TabId, request: Request) -> Result<Response, MessagingError> {
        let handle = {
            let tabs = self.inner.read().await;
            tabs.entries
                .get(&id)
                .and_then(|entry| entry.content.clone())
                .ok_or(MessagingError::NoReceiver { tab: id })?
        };
        handle.send(request).await
    }
}
