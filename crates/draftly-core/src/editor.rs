//! Document editor surface.
//!
//! [`DocumentEditor`] wraps a [`RichTextEngine`] and reports every local edit
//! upward as serialized markup over the page shell's update channel. Content
//! pushed in from outside only reaches the engine when it differs from what
//! the engine would serialize, so engine-originated updates never loop back.

use tokio::sync::mpsc::UnboundedSender;

use crate::markup::MarkupEngine;
use crate::shell::DocumentChange;

/// Cursor/selection over the visible text, in character indices.
/// `anchor` stays put while extending; `head` moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// The seam to a rich-text engine.
pub trait RichTextEngine {
    /// Current content as serialized markup
    fn html(&self) -> String;
    fn set_content(&mut self, markup: &str);
    /// Visible text; block ends and line breaks are `\n`
    fn text(&self) -> &str;
    fn selection(&self) -> Selection;
    fn select(&mut self, anchor: usize, head: usize);
    fn selected_text(&self) -> String;
    /// Replaces the selection (or inserts at the cursor) with plain text
    fn replace_selection(&mut self, text: &str);
    fn insert_text(&mut self, text: &str) {
        self.replace_selection(text);
    }
    fn split_block(&mut self);
    fn delete_backward(&mut self);
    fn toggle_heading(&mut self, level: u8);
    fn toggle_bold(&mut self);
    fn toggle_italic(&mut self);
    fn toggle_bullet_list(&mut self);
}

/// Line and column (in chars) of a visible-text index
pub fn line_col(text: &str, idx: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    for c in text.chars().take(idx) {
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Visible-text index for a line and column, clamped to the line's end
pub fn index_at(text: &str, line: usize, col: usize) -> usize {
    let mut idx = 0;
    for (i, l) in text.split('\n').enumerate() {
        let len = l.chars().count();
        if i == line {
            return idx + col.min(len);
        }
        idx += len + 1;
    }
    text.chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

pub struct DocumentEditor<E: RichTextEngine = MarkupEngine> {
    engine: E,
    updates: UnboundedSender<DocumentChange>,
}

impl<E: RichTextEngine> DocumentEditor<E> {
    pub fn new(engine: E, updates: UnboundedSender<DocumentChange>) -> Self {
        Self { engine, updates }
    }

    pub fn html(&self) -> String {
        self.engine.html()
    }

    pub fn text(&self) -> &str {
        self.engine.text()
    }

    pub fn selection(&self) -> Selection {
        self.engine.selection()
    }

    pub fn selected_text(&self) -> String {
        self.engine.selected_text()
    }

    /// Pushes external content into the engine. Returns false when the
    /// engine already holds exactly this markup.
    pub fn set_content(&mut self, markup: &str) -> bool {
        if self.engine.html() == markup {
            return false;
        }
        self.engine.set_content(markup);
        true
    }

    pub fn select(&mut self, anchor: usize, head: usize) {
        self.engine.select(anchor, head);
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        let sel = self.engine.selection();
        let text = self.engine.text();
        let (line, col) = line_col(text, sel.head);

        let head = match motion {
            Motion::Left if !extend && !sel.is_collapsed() => sel.start(),
            Motion::Right if !extend && !sel.is_collapsed() => sel.end(),
            Motion::Left => sel.head.saturating_sub(1),
            Motion::Right => sel.head + 1,
            Motion::Up if line == 0 => 0,
            Motion::Up => index_at(text, line - 1, col),
            Motion::Down => index_at(text, line + 1, col),
            Motion::LineStart => index_at(text, line, 0),
            Motion::LineEnd => index_at(text, line, usize::MAX),
        };
        let anchor = if extend { sel.anchor } else { head };
        self.engine.select(anchor, head);
    }

    pub fn insert_text(&mut self, text: &str) {
        self.edit(|engine| engine.insert_text(text));
    }

    /// Replaces the current selection, used when a suggestion is accepted
    pub fn replace_selection(&mut self, text: &str) {
        self.edit(|engine| engine.replace_selection(text));
    }

    pub fn split_block(&mut self) {
        self.edit(|engine| engine.split_block());
    }

    pub fn delete_backward(&mut self) {
        self.edit(|engine| engine.delete_backward());
    }

    pub fn toggle_heading(&mut self, level: u8) {
        self.edit(|engine| engine.toggle_heading(level));
    }

    pub fn toggle_bold(&mut self) {
        self.edit(|engine| engine.toggle_bold());
    }

    pub fn toggle_italic(&mut self) {
        self.edit(|engine| engine.toggle_italic());
    }

    pub fn toggle_bullet_list(&mut self) {
        self.edit(|engine| engine.toggle_bullet_list());
    }

    /// Runs a local edit and reports the new markup if it changed anything.
    fn edit(&mut self, f: impl FnOnce(&mut E)) {
        let before = self.engine.html();
        f(&mut self.engine);
        let after = self.engine.html();
        if after != before && self.updates.send(DocumentChange::Local(after)).is_err() {
            tracing::warn!("document update channel closed");
        }
    }
}
