use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use draftly_core::chat::Outbound;
use draftly_core::editor::line_col;
use draftly_core::{
    ApiClient, ChatPanel, ChatResponse, DocumentEditor, EditAction, FloatingToolbar, MarkupEngine,
    PageShell, ProviderError, RequestToken, ScreenPosition,
};

/// Rows the toolbar popup sits above the selected line
const TOOLBAR_LIFT: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Chat,
}

type Task<T> = Option<(RequestToken, JoinHandle<Result<T, ProviderError>>)>;

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,

    // Document state; the shell owns the markup, the editor renders it
    pub shell: PageShell,
    pub editor: DocumentEditor,
    pub toolbar: FloatingToolbar,
    pub chat: ChatPanel,

    api: ApiClient,
    toolbar_task: Task<String>,
    chat_task: Task<ChatResponse>,

    // Layout, written back by the ui each frame
    pub editor_area: Rect,
    pub editor_scroll: u16,

    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub status: String,
}

impl App {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let api = ApiClient::new(server_url)?;
        let shell = PageShell::default();
        let editor = DocumentEditor::new(MarkupEngine::new(shell.document()), shell.updates());
        let chat = ChatPanel::new(shell.updates());

        Ok(Self {
            should_quit: false,
            focus: Focus::Editor,
            shell,
            editor,
            toolbar: FloatingToolbar::new(TOOLBAR_LIFT),
            chat,
            status: format!("Connected to {}", api.base_url()),
            api,
            toolbar_task: None,
            chat_task: None,
            editor_area: Rect::default(),
            editor_scroll: 0,
            animation_frame: 0,
        })
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Chat,
            Focus::Chat => Focus::Editor,
        };
    }

    /// Screen position of the selection start inside the document pane
    pub fn selection_bounds(&self) -> ScreenPosition {
        let (line, col) = line_col(self.editor.text(), self.editor.selection().start());
        let top = to_u16(line).saturating_sub(self.editor_scroll);
        ScreenPosition {
            top: self.editor_area.y.saturating_add(1).saturating_add(top),
            left: self.editor_area.x.saturating_add(1).saturating_add(to_u16(col)),
        }
    }

    /// Shows, moves or hides the toolbar after the editor selection changed.
    pub fn sync_toolbar(&mut self) {
        if self.editor.selection().is_collapsed() {
            self.toolbar.hide();
        } else {
            let bounds = self.selection_bounds();
            self.toolbar.on_selection_change(&self.editor.selected_text(), bounds);
        }
    }

    /// Applies queued document changes. An assistant replacement is pushed
    /// back into the editor.
    pub fn sync_document(&mut self) {
        if self.shell.drain() && self.editor.set_content(self.shell.document()) {
            self.toolbar.hide();
            self.status = "Document replaced by assistant".to_string();
        }
    }

    pub fn request_edit(&mut self, action: EditAction) {
        let Some(pending) = self.toolbar.request(action) else {
            return;
        };
        self.status = format!("{}...", pending.action.label());
        if let Some((_, stale)) = self.toolbar_task.take() {
            stale.abort();
        }

        let api = self.api.clone();
        let handle = tokio::spawn(async move {
            api.chat(pending.messages).await.map(|response| response.reply)
        });
        self.toolbar_task = Some((pending.token, handle));
    }

    pub fn submit_chat(&mut self) {
        let Some(pending) = self.chat.submit() else {
            return;
        };

        let api = self.api.clone();
        let handle = match pending.outbound {
            Outbound::Chat(messages) => tokio::spawn(async move { api.chat(messages).await }),
            Outbound::Agent(query) => tokio::spawn(async move {
                api.agent(&query)
                    .await
                    .map(|response| ChatResponse::reply(response.result))
            }),
        };
        self.chat_task = Some((pending.token, handle));
    }

    /// Collects finished background requests (called by Tick event)
    pub async fn poll_tasks(&mut self) {
        if self.toolbar_task.as_ref().is_some_and(|(_, h)| h.is_finished()) {
            if let Some((token, handle)) = self.toolbar_task.take() {
                let result = flatten(handle.await);
                self.toolbar.complete(token, result);
            }
        }

        if self.chat_task.as_ref().is_some_and(|(_, h)| h.is_finished()) {
            if let Some((token, handle)) = self.chat_task.take() {
                let result = flatten(handle.await);
                self.chat.complete(token, result);
            }
        }

        self.sync_document();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.toolbar.is_loading() || self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Keeps the cursor line inside the visible part of the document pane
    pub fn scroll_to_cursor(&mut self) {
        let visible = self.editor_area.height.saturating_sub(2).max(1);
        let (line, _) = line_col(self.editor.text(), self.editor.selection().head);
        let line = to_u16(line);

        if line < self.editor_scroll {
            self.editor_scroll = line;
        } else if line >= self.editor_scroll.saturating_add(visible) {
            self.editor_scroll = line.saturating_add(1).saturating_sub(visible);
        }
    }
}

/// Clamps a line or column to the terminal's coordinate range
fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn flatten<T>(
    joined: Result<Result<T, ProviderError>, tokio::task::JoinError>,
) -> anyhow::Result<T> {
    Ok(joined??)
}
