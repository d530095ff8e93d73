use crate::ui::NoticeLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum InputMode {
    Browse,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StatusMessage {
    pub(super) level: NoticeLevel,
    pub(super) text: String,
}

pub(super) struct ViewerState {
    /// First visible position, counted in lines of the current view (the
    /// grep subset when grep is on).
    pub(super) scroll_offset: usize,
    pub(super) follow: bool,
    pub(super) wrap: bool,
    pub(super) input_mode: InputMode,
    pub(super) query_input: String,
    pub(super) show_help: bool,
    /// Set by match navigation; the next frame scrolls the current match into view.
    pub(super) jump_to_current: bool,
    pub(super) status: Option<StatusMessage>,
    pub(super) spinner_tick: usize,
}

impl ViewerState {
    pub(super) fn new(initial_query: &str) -> Self {
        Self {
            scroll_offset: 0,
            follow: true,
            wrap: false,
            input_mode: InputMode::Browse,
            query_input: initial_query.to_owned(),
            show_help: false,
            jump_to_current: false,
            status: None,
            spinner_tick: 0,
        }
    }

    pub(super) fn set_status(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            level,
            text: text.into(),
        });
    }

    pub(super) fn scroll_up(&mut self, lines: usize) {
        self.follow = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub(super) fn scroll_down(&mut self, lines: usize, max_offset: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_offset);
    }

    pub(super) fn toggle_follow(&mut self, max_offset: usize) {
        self.follow = !self.follow;
        if self.follow {
            self.scroll_offset = max_offset;
        }
    }
}
