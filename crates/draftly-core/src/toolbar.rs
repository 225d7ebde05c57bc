//! Floating selection toolbar.
//!
//! Hidden until the editor has a non-empty selection, then offers the rewrite
//! actions in [`EditAction`]. A returned suggestion is held for review and
//! only written into the document on confirm.

use std::fmt::Display;

use crate::editor::{DocumentEditor, RichTextEngine};
use crate::prompts::EditAction;
use crate::request::{RequestSequence, RequestToken};
use crate::state::ChatMessage;

pub const FAILURE_MESSAGE: &str = "AI request failed. Check server logs or API key.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenPosition {
    pub top: u16,
    pub left: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    pub selected_text: String,
    pub position: ScreenPosition,
    pub suggestion: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarState {
    Hidden,
    Menu,
    Reviewing,
}

/// A rewrite request ready to be sent to the chat endpoint
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub token: RequestToken,
    pub action: EditAction,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug)]
pub struct FloatingToolbar {
    context: Option<SelectionContext>,
    requests: RequestSequence,
    /// Rows between the menu's top and the selection it points at
    lift: u16,
}

impl FloatingToolbar {
    pub fn new(lift: u16) -> Self {
        Self {
            context: None,
            requests: RequestSequence::default(),
            lift,
        }
    }

    pub fn state(&self) -> ToolbarState {
        match &self.context {
            None => ToolbarState::Hidden,
            Some(ctx) if ctx.suggestion.is_some() => ToolbarState::Reviewing,
            Some(_) => ToolbarState::Menu,
        }
    }

    pub fn context(&self) -> Option<&SelectionContext> {
        self.context.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.context.as_ref().is_some_and(|ctx| ctx.loading)
    }

    /// Re-evaluates the toolbar for a new selection. `bounds` is the top-left
    /// of the selection on screen.
    pub fn on_selection_change(&mut self, selected_text: &str, bounds: ScreenPosition) {
        if selected_text.trim().is_empty() {
            self.hide();
            return;
        }
        self.requests.invalidate();
        self.context = Some(SelectionContext {
            selected_text: selected_text.to_string(),
            position: ScreenPosition {
                top: bounds.top.saturating_sub(self.lift),
                left: bounds.left,
            },
            suggestion: None,
            loading: false,
        });
    }

    pub fn hide(&mut self) {
        self.requests.invalidate();
        self.context = None;
    }

    /// Starts `action` on the current selection. Only valid from the menu
    /// while no other request is loading.
    pub fn request(&mut self, action: EditAction) -> Option<PendingEdit> {
        if self.state() != ToolbarState::Menu || self.is_loading() {
            return None;
        }
        let ctx = self.context.as_mut()?;
        ctx.loading = true;
        let token = self.requests.issue();
        tracing::debug!(?action, ?token, "requesting AI edit");

        Some(PendingEdit {
            token,
            action,
            messages: action.conversation(&ctx.selected_text),
        })
    }

    /// Stores the outcome of a request as the suggestion under review.
    /// Failures are shown as a suggestion too. Returns false for stale tokens.
    pub fn complete<E: Display>(&mut self, token: RequestToken, result: Result<String, E>) -> bool {
        if !self.requests.settle(token) {
            return false;
        }
        let Some(ctx) = self.context.as_mut() else {
            return false;
        };
        ctx.loading = false;
        ctx.suggestion = Some(match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "AI edit request failed");
                FAILURE_MESSAGE.to_string()
            }
        });
        true
    }

    /// Writes the suggestion over the editor's current selection and hides.
    pub fn confirm<R: RichTextEngine>(&mut self, editor: &mut DocumentEditor<R>) -> bool {
        if self.state() != ToolbarState::Reviewing {
            return false;
        }
        let Some(suggestion) = self.context.take().and_then(|ctx| ctx.suggestion) else {
            return false;
        };
        editor.replace_selection(&suggestion);
        self.requests.invalidate();
        true
    }

    /// Drops the suggestion and goes back to the action menu.
    pub fn cancel(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.suggestion = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{is_balanced, MarkupEngine};
    use crate::shell::DocumentChange;
    use tokio::sync::mpsc;

    const AT: ScreenPosition = ScreenPosition { top: 10, left: 4 };

    #[test]
    fn test_select_then_deselect_leaves_no_state() {
        let mut toolbar = FloatingToolbar::new(3);
        assert_eq!(toolbar.state(), ToolbarState::Hidden);

        toolbar.on_selection_change("brave", AT);
        assert_eq!(toolbar.state(), ToolbarState::Menu);
        assert_eq!(toolbar.context().unwrap().position, ScreenPosition { top: 7, left: 4 });

        let pending = toolbar.request(EditAction::Improve).unwrap();
        assert!(toolbar.complete(pending.token, Ok::<_, String>("bold".to_string())));
        assert_eq!(toolbar.state(), ToolbarState::Reviewing);

        toolbar.on_selection_change("", AT);
        assert_eq!(toolbar.state(), ToolbarState::Hidden);
        assert!(toolbar.context().is_none());

        toolbar.on_selection_change("again", AT);
        let ctx = toolbar.context().unwrap();
        assert_eq!(ctx.suggestion, None);
        assert!(!ctx.loading);
    }

    #[test]
    fn test_whitespace_selection_hides() {
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("word", AT);
        toolbar.on_selection_change(" \n ", AT);
        assert_eq!(toolbar.state(), ToolbarState::Hidden);
    }

    #[test]
    fn test_anchor_saturates_at_top() {
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("x", ScreenPosition { top: 1, left: 0 });
        assert_eq!(toolbar.context().unwrap().position.top, 0);
    }

    #[test]
    fn test_request_builds_persona_conversation_once() {
        let mut toolbar = FloatingToolbar::new(3);
        assert!(toolbar.request(EditAction::Shorten).is_none());

        toolbar.on_selection_change("long text", AT);
        let pending = toolbar.request(EditAction::Shorten).unwrap();
        assert_eq!(pending.messages, EditAction::Shorten.conversation("long text"));
        assert!(toolbar.is_loading());
        assert!(toolbar.request(EditAction::Lengthen).is_none());
    }

    #[test]
    fn test_failure_becomes_visible_suggestion() {
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("text", AT);
        let pending = toolbar.request(EditAction::Table).unwrap();
        toolbar.complete(pending.token, Err::<String, _>("connection refused"));

        assert_eq!(toolbar.state(), ToolbarState::Reviewing);
        assert_eq!(toolbar.context().unwrap().suggestion.as_deref(), Some(FAILURE_MESSAGE));
        assert!(!toolbar.is_loading());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("first", AT);
        let pending = toolbar.request(EditAction::Improve).unwrap();

        toolbar.on_selection_change("second", AT);
        assert!(!toolbar.complete(pending.token, Ok::<_, String>("late".to_string())));
        assert_eq!(toolbar.state(), ToolbarState::Menu);
        assert_eq!(toolbar.context().unwrap().selected_text, "second");
    }

    #[test]
    fn test_cancel_returns_to_menu() {
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("text", AT);
        let pending = toolbar.request(EditAction::Improve).unwrap();
        toolbar.complete(pending.token, Ok::<_, String>("better".to_string()));

        toolbar.cancel();
        assert_eq!(toolbar.state(), ToolbarState::Menu);
        assert_eq!(toolbar.context().unwrap().selected_text, "text");
        assert!(toolbar.request(EditAction::Lengthen).is_some());
    }

    #[test]
    fn test_confirm_replaces_exactly_the_selection() {
        let original = "<h1>Title</h1><p>Hello brave world</p><p>Tail &amp; end</p>";
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut editor = DocumentEditor::new(MarkupEngine::new(original), tx);
        editor.select(12, 17);
        assert_eq!(editor.selected_text(), "brave");

        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change(&editor.selected_text(), AT);
        let pending = toolbar.request(EditAction::Improve).unwrap();
        toolbar.complete(pending.token, Ok::<_, String>("bold".to_string()));
        assert!(toolbar.confirm(&mut editor));

        assert_eq!(toolbar.state(), ToolbarState::Hidden);
        let expected = "<h1>Title</h1><p>Hello bold world</p><p>Tail &amp; end</p>";
        assert_eq!(editor.html(), expected);
        assert_eq!(rx.try_recv().unwrap(), DocumentChange::Local(expected.to_string()));
    }

    /// Runs one reviewed rewrite over `anchor..head` and confirms it.
    fn confirm_over(markup: &str, anchor: usize, head: usize, suggestion: &str) -> DocumentEditor {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut editor = DocumentEditor::new(MarkupEngine::new(markup), tx);
        editor.select(anchor, head);

        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change(&editor.selected_text(), AT);
        let pending = toolbar.request(EditAction::Improve).unwrap();
        toolbar.complete(pending.token, Ok::<_, String>(suggestion.to_string()));
        assert!(toolbar.confirm(&mut editor));
        editor
    }

    const MIXED: &str = "<p>Hello <strong>brave</strong> world</p><ul><li><p>item</p></li></ul>";

    #[test]
    fn test_confirm_across_mark_boundary_stays_balanced() {
        let editor = confirm_over(MIXED, 4, 8, "X");
        assert_eq!(
            editor.html(),
            "<p>HellX<strong>ave</strong> world</p><ul><li><p>item</p></li></ul>"
        );
        assert!(is_balanced(&editor.html()));
    }

    #[test]
    fn test_confirm_across_blocks_stays_balanced() {
        let editor = confirm_over(MIXED, 12, 20, "X");
        assert_eq!(
            editor.html(),
            "<p>Hello <strong>brave</strong> X</p><ul><li><p>em</p></li></ul>"
        );
        assert!(is_balanced(&editor.html()));

        let editor = confirm_over("<p>one</p><p>two</p>", 2, 5, "e, t");
        assert_eq!(editor.html(), "<p>one, t</p><p>wo</p>");
        assert!(is_balanced(&editor.html()));
    }

    #[test]
    fn test_confirm_outside_review_does_nothing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut editor = DocumentEditor::new(MarkupEngine::new("<p>abc</p>"), tx);
        let mut toolbar = FloatingToolbar::new(3);
        toolbar.on_selection_change("abc", AT);
        assert!(!toolbar.confirm(&mut editor));
        assert_eq!(editor.html(), "<p>abc</p>");
    }
}
