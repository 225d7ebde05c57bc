//! Page shell: owner of the document markup.
//!
//! Every writer (the editor surface, the chat panel) sends a
//! [`DocumentChange`] over the shell's channel; only [`PageShell::drain`]
//! mutates the document.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const INITIAL_CONTENT: &str = "<p>Hello! Start writing here…</p>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    /// Markup produced by a local edit in the editor surface
    Local(String),
    /// Whole-document replacement proposed by the assistant
    Assistant(String),
}

pub struct PageShell {
    document: String,
    tx: UnboundedSender<DocumentChange>,
    rx: UnboundedReceiver<DocumentChange>,
}

impl Default for PageShell {
    fn default() -> Self {
        Self::new(INITIAL_CONTENT)
    }
}

impl PageShell {
    pub fn new(initial: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            document: initial.to_string(),
            tx,
            rx,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// A sender for components that write to the document
    pub fn updates(&self) -> UnboundedSender<DocumentChange> {
        self.tx.clone()
    }

    /// Applies queued changes in order. Returns true when an assistant
    /// replacement arrived, meaning the editor surface must be resynced.
    pub fn drain(&mut self) -> bool {
        let mut external = false;
        while let Ok(change) = self.rx.try_recv() {
            match change {
                DocumentChange::Local(markup) => self.document = markup,
                DocumentChange::Assistant(markup) => {
                    tracing::info!(bytes = markup.len(), "applying assistant document edit");
                    self.document = markup;
                    external = true;
                }
            }
        }
        external
    }
}
