//! SGR decoding: one raw line of child output in, styled segments out.
//!
//! Every line starts from the palette's base style. Nothing carries over
//! between calls, so a color left open at the end of a line never bleeds
//! into the next one.

use ratatui::style::Color;
use serde::Serialize;

const ESC: char = '\u{1b}';
const BEL: char = '\u{07}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Codes 30-37 map to entries 0-7, codes 90-97 to entries 8-15.
    pub foreground: [Color; 16],
    /// Codes 40-47.
    pub background: [Color; 8],
    /// Codes 100-107.
    pub bright_background: [Color; 8],
    pub default_foreground: Color,
    pub default_background: Option<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: [
                Color::Rgb(0x6b, 0x6f, 0x75),
                Color::Rgb(0xff, 0x55, 0x55),
                Color::Rgb(0x50, 0xfa, 0x7b),
                Color::Rgb(0xf1, 0xfa, 0x8c),
                Color::Rgb(0x62, 0x72, 0xa4),
                Color::Rgb(0xff, 0x79, 0xc6),
                Color::Rgb(0x8b, 0xe9, 0xfd),
                Color::Rgb(0xe6, 0xe6, 0xe6),
                Color::Rgb(0x5a, 0x5f, 0x66),
                Color::Rgb(0xff, 0x6e, 0x6e),
                Color::Rgb(0x69, 0xff, 0x94),
                Color::Rgb(0xff, 0xff, 0xa5),
                Color::Rgb(0xca, 0xa9, 0xff),
                Color::Rgb(0xff, 0x92, 0xdf),
                Color::Rgb(0xa4, 0xff, 0xff),
                Color::Rgb(0xff, 0xff, 0xff),
            ],
            background: [
                Color::Rgb(0x21, 0x22, 0x2c),
                Color::Rgb(0x8b, 0x1e, 0x1e),
                Color::Rgb(0x1e, 0x6b, 0x34),
                Color::Rgb(0x7a, 0x6f, 0x1b),
                Color::Rgb(0x2d, 0x3a, 0x6b),
                Color::Rgb(0x7a, 0x2d, 0x5e),
                Color::Rgb(0x1f, 0x6a, 0x78),
                Color::Rgb(0x9a, 0x9a, 0x9a),
            ],
            bright_background: [
                Color::Rgb(0x5a, 0x5f, 0x66),
                Color::Rgb(0xff, 0x6e, 0x6e),
                Color::Rgb(0x69, 0xff, 0x94),
                Color::Rgb(0xff, 0xff, 0xa5),
                Color::Rgb(0xca, 0xa9, 0xff),
                Color::Rgb(0xff, 0x92, 0xdf),
                Color::Rgb(0xa4, 0xff, 0xff),
                Color::Rgb(0xff, 0xff, 0xff),
            ],
            default_foreground: Color::Reset,
            default_background: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    pub foreground: Color,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
}

impl TextStyle {
    pub fn base(palette: &Palette) -> Self {
        Self {
            foreground: palette.default_foreground,
            background: palette.default_background,
            bold: false,
            italic: false,
        }
    }

    /// Applies one SGR parameter list (the text between `ESC [` and `m`).
    pub fn apply_sgr(self, params: &str, palette: &Palette) -> Self {
        let base = Self::base(palette);
        let mut style = self;
        let codes = if params.is_empty() {
            vec![Some(0u16)]
        } else {
            params
                .split(';')
                .map(|part| {
                    if part.is_empty() {
                        Some(0)
                    } else {
                        part.parse::<u16>().ok()
                    }
                })
                .collect::<Vec<Option<u16>>>()
        };
        let mut codes = codes.into_iter();
        while let Some(code) = codes.next() {
            let Some(code) = code else {
                continue;
            };
            match code {
                0 => style = base,
                1 => style.bold = true,
                3 => style.italic = true,
                22 => style.bold = false,
                23 => style.italic = false,
                30..=37 => style.foreground = palette.foreground[usize::from(code - 30)],
                38 => {
                    if let Some(color) = extended_color(&mut codes) {
                        style.foreground = color;
                    }
                }
                39 => style.foreground = base.foreground,
                40..=47 => style.background = Some(palette.background[usize::from(code - 40)]),
                48 => {
                    if let Some(color) = extended_color(&mut codes) {
                        style.background = Some(color);
                    }
                }
                49 => style.background = base.background,
                90..=97 => style.foreground = palette.foreground[usize::from(code - 90) + 8],
                100..=107 => {
                    style.background = Some(palette.bright_background[usize::from(code - 100)])
                }
                _ => {}
            }
        }
        style
    }
}

// `38;5;n` and `38;2;r;g;b` (and the 48 forms) are consumed whole so their
// sub-parameters are never read as standalone codes.
fn extended_color<I>(codes: &mut I) -> Option<Color>
where
    I: Iterator<Item = Option<u16>>,
{
    match codes.next().flatten()? {
        5 => {
            let index = codes.next().flatten()?;
            u8::try_from(index).ok().map(Color::Indexed)
        }
        2 => {
            let r = codes.next().flatten()?;
            let g = codes.next().flatten()?;
            let b = codes.next().flatten()?;
            Some(Color::Rgb(
                u8::try_from(r).ok()?,
                u8::try_from(g).ok()?,
                u8::try_from(b).ok()?,
            ))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSegment {
    pub text: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub segments: Vec<StyledSegment>,
    pub plain_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnsiDecoder {
    palette: Palette,
}

impl AnsiDecoder {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn decode_line(&self, raw: &str) -> StyledLine {
        let base = TextStyle::base(&self.palette);
        let mut builder = LineBuilder::new(base);
        let mut style = base;
        let mut chars = raw.chars();
        while let Some(ch) = chars.next() {
            if ch != ESC {
                if is_visible(ch) {
                    builder.push(ch, style);
                }
                continue;
            }
            match chars.next() {
                Some('[') => {
                    let mut params = String::new();
                    let mut final_byte = None;
                    for next in chars.by_ref() {
                        if ('@'..='~').contains(&next) {
                            final_byte = Some(next);
                            break;
                        }
                        params.push(next);
                    }
                    // Non-SGR CSI (cursor moves, erase) and unterminated
                    // sequences leave no trace.
                    if final_byte == Some('m') {
                        style = style.apply_sgr(&params, &self.palette);
                    }
                }
                Some(']') => skip_osc(&mut chars),
                Some(next) if is_intermediate(next) => skip_escape_tail(&mut chars),
                _ => {}
            }
        }
        builder.finish()
    }
}

fn skip_osc(chars: &mut std::str::Chars<'_>) {
    while let Some(ch) = chars.next() {
        if ch == BEL {
            return;
        }
        if ch == ESC {
            // String terminator is `ESC \`; anything else after ESC also ends it.
            chars.next();
            return;
        }
    }
}

// `ESC ( B`, `ESC ) 0`, `ESC # 8`: intermediates run until one final byte.
fn skip_escape_tail(chars: &mut std::str::Chars<'_>) {
    for ch in chars.by_ref() {
        if !is_intermediate(ch) {
            return;
        }
    }
}

fn is_intermediate(ch: char) -> bool {
    (' '..='/').contains(&ch)
}

fn is_visible(ch: char) -> bool {
    !matches!(
        ch,
        '\r' | '\n'
            | '\u{0000}'..='\u{0008}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000E}'..='\u{001A}'
            | '\u{001C}'..='\u{001F}'
            | '\u{007F}'
    )
}

struct LineBuilder {
    base: TextStyle,
    segments: Vec<StyledSegment>,
    plain_text: String,
    run: String,
    run_style: TextStyle,
}

impl LineBuilder {
    fn new(base: TextStyle) -> Self {
        Self {
            base,
            segments: Vec::new(),
            plain_text: String::new(),
            run: String::new(),
            run_style: base,
        }
    }

    fn push(&mut self, ch: char, style: TextStyle) {
        if style != self.run_style {
            self.close_run();
            self.run_style = style;
        }
        self.run.push(ch);
        self.plain_text.push(ch);
    }

    fn close_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        self.segments.push(StyledSegment {
            text: std::mem::take(&mut self.run),
            style: self.run_style,
        });
    }

    fn finish(mut self) -> StyledLine {
        self.close_run();
        if self.segments.is_empty() {
            self.segments.push(StyledSegment {
                text: String::new(),
                style: self.base,
            });
        }
        StyledLine {
            segments: self.segments,
            plain_text: self.plain_text,
        }
    }
}

#[cfg(test)]
#[path = "tests/ansi_tests.rs"]
mod tests;
