use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::LogSession;
use crate::ui::NoticeLevel;

use super::config::PAGE_SCROLL_LINES;
use super::state::{InputMode, ViewerState};
use super::TuiError;

pub(super) enum LoopControl {
    Continue,
    Quit,
}

pub(super) fn handle_key_event(
    key: &KeyEvent,
    session: &mut LogSession,
    state: &mut ViewerState,
    max_offset: usize,
) -> LoopControl {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return LoopControl::Quit,
            KeyCode::Char('l') => {
                session.clear();
                state.scroll_offset = 0;
                state.follow = true;
                state.set_status(NoticeLevel::Info, "log cleared");
                return LoopControl::Continue;
            }
            _ => {}
        }
    }

    if state.input_mode == InputMode::Query {
        handle_query_key(key, session, state);
        return LoopControl::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return LoopControl::Quit,
        KeyCode::Char('/') => {
            state.input_mode = InputMode::Query;
            state.query_input = session.search().pending_query().to_owned();
            state.show_help = false;
        }
        KeyCode::Char('n') => {
            session.next();
            state.jump_to_current = true;
        }
        KeyCode::Char('N') => {
            session.prev();
            state.jump_to_current = true;
        }
        KeyCode::Char('c') => {
            let case_sensitive = !session.search().case_sensitive();
            session.set_case_sensitive(case_sensitive);
            state.set_status(
                NoticeLevel::Info,
                if case_sensitive {
                    "search is case-sensitive"
                } else {
                    "search ignores case"
                },
            );
        }
        KeyCode::Char('g') => {
            let grep_mode = !session.search().grep_mode();
            session.set_grep_mode(grep_mode);
            state.jump_to_current = session.search().current_match().is_some();
            state.set_status(
                NoticeLevel::Info,
                if grep_mode {
                    "showing matching lines only"
                } else {
                    "showing all lines"
                },
            );
        }
        KeyCode::Char('f') => state.toggle_follow(max_offset),
        KeyCode::Char('w') => state.wrap = !state.wrap,
        KeyCode::Char('s') => match export_snapshot(session, SystemTime::now()) {
            Ok((path, lines)) => state.set_status(
                NoticeLevel::Success,
                format!("exported {lines} lines to {}", path.display()),
            ),
            Err(err) => state.set_status(NoticeLevel::Error, format!("export failed: {err}")),
        },
        KeyCode::Char('r') => match session.restart() {
            Ok(()) => {
                state.follow = true;
                state.set_status(NoticeLevel::Info, "restarting");
            }
            Err(err) => state.set_status(NoticeLevel::Error, format!("restart failed: {err}")),
        },
        KeyCode::Char('x') => {
            if session.is_running() {
                session.stop();
                state.set_status(NoticeLevel::Warning, "stop requested");
            }
        }
        KeyCode::Char('h') => state.show_help = !state.show_help,
        KeyCode::Up => state.scroll_up(1),
        KeyCode::Down => state.scroll_down(1, max_offset),
        KeyCode::PageUp => state.scroll_up(PAGE_SCROLL_LINES),
        KeyCode::PageDown => state.scroll_down(PAGE_SCROLL_LINES, max_offset),
        KeyCode::Home => {
            state.follow = false;
            state.scroll_offset = 0;
        }
        KeyCode::End => {
            state.follow = true;
            state.scroll_offset = max_offset;
        }
        KeyCode::Esc => state.show_help = false,
        _ => {}
    }

    LoopControl::Continue
}

fn handle_query_key(key: &KeyEvent, session: &mut LogSession, state: &mut ViewerState) {
    match key.code {
        KeyCode::Esc => state.input_mode = InputMode::Browse,
        KeyCode::Enter => {
            session.search_next_or_refresh();
            state.jump_to_current = true;
        }
        KeyCode::Backspace => {
            state.query_input.pop();
            session.set_query(&state.query_input, Instant::now());
        }
        KeyCode::Char(c) => {
            state.query_input.push(c);
            session.set_query(&state.query_input, Instant::now());
        }
        _ => {}
    }
}

pub(super) fn export_file_name(now: SystemTime) -> PathBuf {
    let seconds = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("pidview-{seconds}.txt"))
}

fn export_snapshot(session: &LogSession, now: SystemTime) -> Result<(PathBuf, usize), TuiError> {
    let path = export_file_name(now);
    let lines = session.export(&path)?;
    Ok((path, lines))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::ansi::AnsiDecoder;
    use crate::capture::{CaptureOptions, ProcessCapture};
    use crate::noise::NoiseFilter;
    use crate::search::SearchEngine;

    fn session_with(lines: &[&str]) -> LogSession {
        let mut session = LogSession::new(
            ProcessCapture::new(AnsiDecoder::default(), CaptureOptions::default()),
            NoiseFilter::default(),
            SearchEngine::default(),
        );
        let decoder = AnsiDecoder::default();
        for line in lines {
            session.ingest_line(decoder.decode_line(line));
        }
        session
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(session: &mut LogSession, state: &mut ViewerState, text: &str) {
        for c in text.chars() {
            handle_key_event(&press(KeyCode::Char(c)), session, state, 0);
        }
    }

    #[test]
    fn slash_then_typing_edits_the_query_and_enter_selects_a_match() {
        let mut session = session_with(&["alpha", "beta", "alphabet"]);
        let mut state = ViewerState::new("");

        handle_key_event(&press(KeyCode::Char('/')), &mut session, &mut state, 0);
        assert_eq!(state.input_mode, InputMode::Query);
        type_text(&mut session, &mut state, "alpha");
        assert_eq!(session.search().pending_query(), "alpha");
        assert!(session.search().matches().is_empty());

        handle_key_event(&press(KeyCode::Enter), &mut session, &mut state, 0);
        assert_eq!(session.search().counter(), (1, 2));
        assert!(state.jump_to_current);

        handle_key_event(&press(KeyCode::Esc), &mut session, &mut state, 0);
        assert_eq!(state.input_mode, InputMode::Browse);
    }

    #[test]
    fn letters_typed_in_query_mode_are_not_commands() {
        let mut session = session_with(&["quit"]);
        let mut state = ViewerState::new("");
        handle_key_event(&press(KeyCode::Char('/')), &mut session, &mut state, 0);
        let control = handle_key_event(&press(KeyCode::Char('q')), &mut session, &mut state, 0);
        assert!(matches!(control, LoopControl::Continue));
        assert_eq!(state.query_input, "q");
    }

    #[test]
    fn navigation_keys_cycle_matches() {
        let mut session = session_with(&["x", "x", "x"]);
        let mut state = ViewerState::new("");
        session.set_query("x", Instant::now());
        session.commit_query();

        handle_key_event(&press(KeyCode::Char('n')), &mut session, &mut state, 0);
        handle_key_event(&press(KeyCode::Char('n')), &mut session, &mut state, 0);
        assert_eq!(session.search().counter(), (2, 3));
        handle_key_event(&press(KeyCode::Char('N')), &mut session, &mut state, 0);
        assert_eq!(session.search().counter(), (1, 3));
    }

    #[test]
    fn toggles_flip_case_grep_follow_and_wrap() {
        let mut session = session_with(&["Error", "error"]);
        let mut state = ViewerState::new("");
        session.set_query("error", Instant::now());
        session.commit_query();
        assert_eq!(session.search().matches().len(), 2);

        handle_key_event(&press(KeyCode::Char('c')), &mut session, &mut state, 0);
        assert!(session.search().case_sensitive());
        assert_eq!(session.search().matches().len(), 1);

        handle_key_event(&press(KeyCode::Char('g')), &mut session, &mut state, 0);
        assert!(session.search().grep_mode());

        handle_key_event(&press(KeyCode::Char('f')), &mut session, &mut state, 4);
        assert!(!state.follow);
        handle_key_event(&press(KeyCode::Char('f')), &mut session, &mut state, 4);
        assert!(state.follow);
        assert_eq!(state.scroll_offset, 4);

        handle_key_event(&press(KeyCode::Char('w')), &mut session, &mut state, 0);
        assert!(state.wrap);
    }

    #[test]
    fn ctrl_l_clears_the_store() {
        let mut session = session_with(&["one", "two"]);
        let mut state = ViewerState::new("");
        state.scroll_offset = 1;
        handle_key_event(
            &KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
            &mut session,
            &mut state,
            1,
        );
        assert!(session.store().is_empty());
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut session = session_with(&[]);
        let mut state = ViewerState::new("");
        assert!(matches!(
            handle_key_event(&press(KeyCode::Char('q')), &mut session, &mut state, 0),
            LoopControl::Quit
        ));
        state.input_mode = InputMode::Query;
        assert!(matches!(
            handle_key_event(
                &KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &mut session,
                &mut state,
                0
            ),
            LoopControl::Quit
        ));
    }

    #[test]
    fn scrolling_up_leaves_follow_mode() {
        let mut session = session_with(&[]);
        let mut state = ViewerState::new("");
        state.scroll_offset = 20;
        handle_key_event(&press(KeyCode::PageUp), &mut session, &mut state, 20);
        assert!(!state.follow);
        assert_eq!(state.scroll_offset, 10);
        handle_key_event(&press(KeyCode::End), &mut session, &mut state, 20);
        assert!(state.follow);
        assert_eq!(state.scroll_offset, 20);
    }

    #[test]
    fn export_name_uses_unix_seconds() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            export_file_name(now),
            PathBuf::from("pidview-1700000000.txt")
        );
    }
}
