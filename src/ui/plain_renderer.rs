use std::io::{IsTerminal, Write};

use anstream::{AutoStream, ColorChoice};
use anstyle::Style;

use crate::search::SearchMatch;
use crate::store::DecodedLine;
use crate::ui::log_line::{anstyle_for, split_runs, Highlight};
use crate::ui::renderer::{Renderer, UiResult};
use crate::ui::theme::{resolve_color_enabled, OutputMode, Theme};
use crate::ui::widgets::{MessageBlock, SessionSummary};

pub struct PlainRenderer<W: Write> {
    writer: W,
    color_enabled: bool,
    theme: Theme,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(writer: W, color_enabled: bool) -> Self {
        Self {
            writer,
            color_enabled,
            theme: Theme::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn flush(&mut self) -> UiResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn style_text(&self, style: Style, text: &str) -> String {
        if !self.color_enabled || text.is_empty() {
            return text.to_owned();
        }
        format!("{}{}{}", style.render(), text, style.render_reset())
    }

    fn write_block(&mut self, label: &str, style: Style, block: &MessageBlock) -> UiResult<()> {
        let marker = self.style_text(style, label);
        writeln!(self.writer, "{marker} {}", block.title)?;
        writeln!(self.writer, "  {}", block.body)?;
        if let Some(hint) = &block.hint {
            let hint_label = self.style_text(self.theme.muted, "hint");
            writeln!(self.writer, "  {hint_label}: {hint}")?;
        }
        Ok(())
    }
}

fn color_choice(mode: OutputMode) -> ColorChoice {
    match mode {
        OutputMode::Auto => ColorChoice::Auto,
        OutputMode::Always => ColorChoice::AlwaysAnsi,
        OutputMode::Never => ColorChoice::Never,
    }
}

impl PlainRenderer<AutoStream<std::io::Stdout>> {
    pub fn stdout(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stdout(), color_choice(mode));
        let color_enabled = resolve_color_enabled(mode, std::io::stdout().is_terminal());
        Self::new(stream, color_enabled)
    }
}

impl PlainRenderer<AutoStream<std::io::Stderr>> {
    pub fn stderr(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stderr(), color_choice(mode));
        let color_enabled = resolve_color_enabled(mode, std::io::stderr().is_terminal());
        Self::new(stream, color_enabled)
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn section(&mut self, title: &str) -> UiResult<()> {
        let rendered = self.style_text(self.theme.accent, title);
        let underline = self.style_text(self.theme.muted, &"─".repeat(title.chars().count()));
        writeln!(self.writer, "{rendered}")?;
        writeln!(self.writer, "{underline}")?;
        Ok(())
    }

    fn error_block(&mut self, block: &MessageBlock) -> UiResult<()> {
        self.write_block("[error]", self.theme.error, block)
    }

    fn warning_block(&mut self, block: &MessageBlock) -> UiResult<()> {
        self.write_block("[warning]", self.theme.warning, block)
    }

    fn log_line(&mut self, line: &DecodedLine, matches: &[SearchMatch]) -> UiResult<()> {
        if !self.color_enabled {
            writeln!(self.writer, "{}", line.plain_text)?;
            return Ok(());
        }
        let mut rendered = String::with_capacity(line.plain_text.len() + 16);
        for run in split_runs(&line.segments, matches, None) {
            let style = match run.highlight {
                Highlight::None => anstyle_for(&run.style),
                Highlight::Match | Highlight::Current => self.theme.highlight,
            };
            rendered.push_str(&self.style_text(style, run.text));
        }
        writeln!(self.writer, "{rendered}")?;
        Ok(())
    }

    fn session_summary(&mut self, summary: &SessionSummary) -> UiResult<()> {
        let status_style = if summary.abnormal {
            self.theme.error
        } else {
            self.theme.success
        };
        let status = self.style_text(status_style, &summary.diagnostic);
        let counts = self.style_text(
            self.theme.muted,
            &format!(
                "lines:{}  shown:{}  noise:{}",
                summary.lines, summary.shown, summary.dropped_noise
            ),
        );
        writeln!(self.writer, "{status}  {counts}")?;
        Ok(())
    }
}
