//! A small rich-text engine over an HTML subset.
//!
//! The markup string is kept verbatim. A visible-text index maps every visible
//! character back to the byte span it occupies in the markup, which lets edits
//! splice the markup in place and leave everything around them untouched.
//! Closing `p`/`h1`-`h6`/`li` tags show up as a `\n` with a zero-width span
//! at the tag's start; `<br>` shows up as a `\n` spanning the tag.

use std::ops::Range;

use crate::editor::{RichTextEngine, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    range: Range<usize>,
    name: String,
    closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    name: String,
    open: Range<usize>,
    close: Range<usize>,
}

fn is_text_block(name: &str) -> bool {
    matches!(name, "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn ends_line(name: &str) -> bool {
    is_text_block(name) || name == "li"
}

/// Elements without a closing tag
fn is_void(name: &str) -> bool {
    matches!(name, "" | "br" | "hr" | "img")
}

/// Parses a `<...>` slice that starts at `offset` in the markup.
fn parse_tag(raw: &str, offset: usize) -> Tag {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let closing = inner.starts_with('/');
    let name = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    Tag {
        range: offset..offset + raw.len(),
        name,
        closing,
    }
}

fn scan_tags(markup: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut i = 0;
    while let Some(off) = markup[i..].find('<') {
        let start = i + off;
        let Some(len) = markup[start..].find('>') else {
            break;
        };
        let end = start + len + 1;
        tags.push(parse_tag(&markup[start..end], start));
        i = end;
    }
    tags
}

/// Tags a markup slice leaves unbalanced, as raw tag text: closers for
/// elements opened before the slice and openers for elements closed after it.
fn unbalanced_tags(segment: &str) -> (Vec<&str>, Vec<&str>) {
    let mut closers = Vec::new();
    let mut openers: Vec<Tag> = Vec::new();

    for tag in scan_tags(segment) {
        if is_void(&tag.name) {
            continue;
        }
        if !tag.closing {
            openers.push(tag);
        } else if openers.last().is_some_and(|open| open.name == tag.name) {
            openers.pop();
        } else {
            closers.push(&segment[tag.range]);
        }
    }

    let openers = openers.into_iter().map(|tag| &segment[tag.range]).collect();
    (closers, openers)
}

/// Decodes an entity at the start of `rest`, returning the char and its byte length.
fn decode_entity(rest: &str) -> Option<(char, usize)> {
    let (semi, _) = rest.char_indices().take(10).find(|(_, c)| *c == ';')?;
    let name = &rest[1..semi];
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" | "#39" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, semi + 1))
}

/// Escapes plain text for insertion into the markup. Newlines become `<br>`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Visible characters and their markup spans
fn build_index(markup: &str) -> (Vec<char>, Vec<Range<usize>>) {
    let mut chars = Vec::new();
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut last_block_end = false;
    let mut i = 0;

    while i < markup.len() {
        let rest = &markup[i..];

        if rest.starts_with('<') {
            if let Some(off) = rest.find('>') {
                let tag = parse_tag(&rest[..=off], i);
                if tag.name == "br" && !tag.closing {
                    chars.push('\n');
                    spans.push(tag.range.clone());
                    last_block_end = false;
                } else if ends_line(&tag.name) {
                    if tag.closing {
                        depth = depth.saturating_sub(1);
                        // `</li>` right after its paragraph adds no extra line
                        if is_text_block(&tag.name) || !last_block_end {
                            chars.push('\n');
                            spans.push(i..i);
                            last_block_end = true;
                        }
                    } else {
                        depth += 1;
                    }
                }
                i = tag.range.end;
                continue;
            }
        }

        if rest.starts_with('&') {
            if let Some((c, len)) = decode_entity(rest) {
                chars.push(c);
                spans.push(i..i + len);
                last_block_end = false;
                i += len;
                continue;
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        let len = c.len_utf8();
        // Whitespace between blocks is formatting, not content.
        if depth > 0 || !c.is_whitespace() {
            chars.push(c);
            spans.push(i..i + len);
            last_block_end = false;
        }
        i += len;
    }

    (chars, spans)
}

#[derive(Debug, Clone)]
pub struct MarkupEngine {
    markup: String,
    text: String,
    chars: Vec<char>,
    spans: Vec<Range<usize>>,
    selection: Selection,
}

impl Default for MarkupEngine {
    fn default() -> Self {
        Self::new("")
    }
}

impl MarkupEngine {
    pub fn new(markup: &str) -> Self {
        let mut engine = Self {
            markup: markup.to_string(),
            text: String::new(),
            chars: Vec::new(),
            spans: Vec::new(),
            selection: Selection::default(),
        };
        engine.reindex();
        engine
    }

    fn reindex(&mut self) {
        let (chars, spans) = build_index(&self.markup);
        self.text = chars.iter().collect();
        self.chars = chars;
        self.spans = spans;
        let max = self.max_cursor();
        self.selection = Selection {
            anchor: self.selection.anchor.min(max),
            head: self.selection.head.min(max),
        };
    }

    /// Furthest cursor position: before the trailing block end, so typing at
    /// the end of the document lands inside the last block.
    pub fn max_cursor(&self) -> usize {
        match self.spans.last() {
            Some(span) if span.is_empty() => self.spans.len() - 1,
            _ => self.spans.len(),
        }
    }

    fn markup_offset(&self, idx: usize) -> usize {
        self.spans
            .get(idx)
            .map(|s| s.start)
            .unwrap_or(self.markup.len())
    }

    /// Markup bytes covered by the current selection
    fn selection_range(&self) -> Range<usize> {
        let (start, end) = (self.selection.start(), self.selection.end());
        if start == end {
            let pos = self.markup_offset(start);
            return pos..pos;
        }
        self.spans[start].start..self.spans[end - 1].end
    }

    fn splice(&mut self, range: Range<usize>, replacement: &str) {
        self.markup.replace_range(range, replacement);
    }

    fn enclosing_block(&self, pos: usize) -> Option<Block> {
        let tags = scan_tags(&self.markup);
        let mut stack: Vec<&Tag> = Vec::new();

        for tag in tags.iter().take_while(|t| t.range.start < pos) {
            if !is_text_block(&tag.name) {
                continue;
            }
            if tag.closing {
                if stack.last().is_some_and(|open| open.name == tag.name) {
                    stack.pop();
                }
            } else {
                stack.push(tag);
            }
        }

        let open = stack.pop()?;
        let close = tags
            .iter()
            .find(|t| t.range.start >= open.range.end && t.closing && t.name == open.name)?;

        Some(Block {
            name: open.name.clone(),
            open: open.range.clone(),
            close: close.range.clone(),
        })
    }

    fn collapse_to(&mut self, idx: usize) {
        let idx = idx.min(self.max_cursor());
        self.selection = Selection {
            anchor: idx,
            head: idx,
        };
    }

    fn toggle_mark(&mut self, name: &str) {
        if self.selection.is_collapsed() || self.selected_text().contains('\n') {
            return;
        }
        let range = self.selection_range();
        let (closers, openers) = unbalanced_tags(&self.markup[range.clone()]);
        if !closers.is_empty() || !openers.is_empty() {
            return;
        }
        let open = format!("<{name}>");
        let close = format!("</{name}>");

        if self.markup[..range.start].ends_with(&open) && self.markup[range.end..].starts_with(&close) {
            self.splice(range.end..range.end + close.len(), "");
            self.splice(range.start - open.len()..range.start, "");
        } else {
            self.splice(range.end..range.end, &close);
            self.splice(range.start..range.start, &open);
        }
        self.reindex();
    }

    /// Merges the block ending at `newline_idx` into the block that follows it.
    /// Only a plain `</x><y>` boundary between two text blocks is merged.
    fn merge_at(&mut self, newline_idx: usize) -> bool {
        let Some(next) = self.spans.get(newline_idx + 1) else {
            return false;
        };
        let seg = self.spans[newline_idx].start..next.start;
        let tags = scan_tags(&self.markup[seg.clone()]);
        let [first, second] = tags.as_slice() else {
            return false;
        };
        let joined = first.range.start == 0
            && first.range.end == second.range.start
            && second.range.end == seg.len()
            && first.closing
            && !second.closing
            && is_text_block(&first.name)
            && is_text_block(&second.name);
        if !joined {
            return false;
        }

        let Some(next_block) = self.enclosing_block(seg.end) else {
            return false;
        };
        let keep = first.name.clone();
        self.splice(next_block.close.clone(), &format!("</{keep}>"));
        self.splice(seg, "");
        true
    }
}

impl RichTextEngine for MarkupEngine {
    fn html(&self) -> String {
        self.markup.clone()
    }

    fn set_content(&mut self, markup: &str) {
        self.markup = markup.to_string();
        self.reindex();
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn select(&mut self, anchor: usize, head: usize) {
        let max = self.max_cursor();
        self.selection = Selection {
            anchor: anchor.min(max),
            head: head.min(max),
        };
    }

    fn selected_text(&self) -> String {
        self.chars[self.selection.start()..self.selection.end()]
            .iter()
            .collect()
    }

    fn replace_selection(&mut self, text: &str) {
        if self.markup.trim().is_empty() {
            self.markup = "<p></p>".to_string();
            self.reindex();
        }
        let start = self.selection.start();
        let range = self.selection_range();

        // Tags cut by the selection survive the splice so the markup stays
        // balanced; the new text takes the formatting at the selection start.
        let mut replacement = escape_text(text);
        let (closers, openers) = unbalanced_tags(&self.markup[range.clone()]);
        replacement.extend(closers);
        replacement.extend(openers);
        self.splice(range, &replacement);
        let inserted = text.chars().filter(|c| *c != '\r').count();
        self.reindex();
        self.collapse_to(start + inserted);
    }

    fn split_block(&mut self) {
        if !self.selection.is_collapsed() {
            self.replace_selection("");
        }
        let cursor = self.selection.head;
        let pos = self.markup_offset(cursor);
        let Some(block) = self.enclosing_block(pos) else {
            return;
        };

        let next = if block.name.starts_with('h') { "p" } else { block.name.as_str() };
        let tail = self.markup[pos..block.close.start].to_string();
        let replacement = format!("</{}><{next}>{tail}</{next}>", block.name);
        self.splice(pos..block.close.end, &replacement);
        self.reindex();
        self.collapse_to(cursor + 1);
    }

    fn delete_backward(&mut self) {
        if !self.selection.is_collapsed() {
            self.replace_selection("");
            return;
        }
        let cursor = self.selection.head;
        if cursor == 0 {
            return;
        }
        let span = self.spans[cursor - 1].clone();
        if span.is_empty() {
            if !self.merge_at(cursor - 1) {
                return;
            }
        } else {
            self.splice(span, "");
        }
        self.reindex();
        self.collapse_to(cursor - 1);
    }

    fn toggle_heading(&mut self, level: u8) {
        if !(1..=6).contains(&level) {
            return;
        }
        let pos = self.markup_offset(self.selection.start());
        let Some(block) = self.enclosing_block(pos) else {
            return;
        };
        let heading = format!("h{level}");
        let name = if block.name == heading { "p" } else { heading.as_str() };
        let close = format!("</{name}>");
        let open = format!("<{name}>");
        self.splice(block.close, &close);
        self.splice(block.open, &open);
        self.reindex();
    }

    fn toggle_bold(&mut self) {
        self.toggle_mark("strong");
    }

    fn toggle_italic(&mut self) {
        self.toggle_mark("em");
    }

    fn toggle_bullet_list(&mut self) {
        const OPEN: &str = "<ul><li>";
        const CLOSE: &str = "</li></ul>";

        let pos = self.markup_offset(self.selection.start());
        let Some(block) = self.enclosing_block(pos) else {
            return;
        };
        if self.markup[..block.open.start].ends_with(OPEN) && self.markup[block.close.end..].starts_with(CLOSE) {
            self.splice(block.close.end..block.close.end + CLOSE.len(), "");
            self.splice(block.open.start - OPEN.len()..block.open.start, "");
        } else {
            self.splice(block.close.end..block.close.end, CLOSE);
            self.splice(block.open.start..block.open.start, OPEN);
        }
        self.reindex();
    }
}

/// True when every non-void tag is closed in order
#[cfg(test)]
pub(crate) fn is_balanced(markup: &str) -> bool {
    let mut stack = Vec::new();
    for tag in scan_tags(markup) {
        if is_void(&tag.name) {
            continue;
        }
        if !tag.closing {
            stack.push(tag.name);
        } else if stack.pop() != Some(tag.name) {
            return false;
        }
    }
    stack.is_empty()
}
