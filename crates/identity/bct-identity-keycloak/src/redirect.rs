//! Browser-level navigation to the identity provider.

use std::sync::Mutex;

use url::Url;

/// Sends the user agent to an external URL. Fire-and-forget.
pub trait Redirector: Send + Sync {
    fn redirect(&self, target: &Url);
}

/// Keeps every redirect instead of performing it. Used by headless shells
/// and tests.
#[derive(Debug, Default)]
pub struct RecordingRedirector {
    targets: Mutex<Vec<Url>>,
}

impl RecordingRedirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<Url> {
        self.targets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Url> {
        self.targets().pop()
    }
}

impl Redirector for RecordingRedirector {
    fn redirect(&self, target: &Url) {
        self.targets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(target.clone());
    }
}
