//! Splitting a decoded line into runs that carry both the original segment
//! style and search highlighting, shared by the viewer and plain output.

use anstyle::{Ansi256Color, AnsiColor, RgbColor};
use ratatui::style::Color;

use crate::ansi::{StyledSegment, TextStyle};
use crate::search::SearchMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Match,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun<'a> {
    pub text: &'a str,
    pub style: TextStyle,
    pub highlight: Highlight,
}

/// `matches` must belong to this line and be sorted, as `SearchEngine`
/// produces them.
pub fn split_runs<'a>(
    segments: &'a [StyledSegment],
    matches: &[SearchMatch],
    current: Option<SearchMatch>,
) -> Vec<LineRun<'a>> {
    let mut runs = Vec::with_capacity(segments.len() + matches.len() * 2);
    let mut line_offset = 0usize;
    let mut next_match = 0usize;
    for segment in segments {
        let seg_start = line_offset;
        let seg_end = seg_start + segment.text.len();
        line_offset = seg_end;
        if matches.is_empty() || segment.text.is_empty() {
            runs.push(LineRun {
                text: &segment.text,
                style: segment.style,
                highlight: Highlight::None,
            });
            continue;
        }

        let mut pos = seg_start;
        while pos < seg_end {
            while next_match < matches.len() && matches[next_match].end() <= pos {
                next_match += 1;
            }
            let (end, highlight) = match matches.get(next_match) {
                Some(found) if found.start <= pos => {
                    let highlight = if current == Some(*found) {
                        Highlight::Current
                    } else {
                        Highlight::Match
                    };
                    (found.end().min(seg_end), highlight)
                }
                Some(found) => (found.start.min(seg_end), Highlight::None),
                None => (seg_end, Highlight::None),
            };
            let Some(text) = segment.text.get(pos - seg_start..end - seg_start) else {
                runs.push(LineRun {
                    text: segment.text.get(pos - seg_start..).unwrap_or_default(),
                    style: segment.style,
                    highlight: Highlight::None,
                });
                break;
            };
            runs.push(LineRun {
                text,
                style: segment.style,
                highlight,
            });
            pos = end;
        }
    }
    runs
}

pub fn anstyle_color(color: Color) -> Option<anstyle::Color> {
    let ansi = |color: AnsiColor| Some(anstyle::Color::Ansi(color));
    match color {
        Color::Reset => None,
        Color::Black => ansi(AnsiColor::Black),
        Color::Red => ansi(AnsiColor::Red),
        Color::Green => ansi(AnsiColor::Green),
        Color::Yellow => ansi(AnsiColor::Yellow),
        Color::Blue => ansi(AnsiColor::Blue),
        Color::Magenta => ansi(AnsiColor::Magenta),
        Color::Cyan => ansi(AnsiColor::Cyan),
        Color::Gray => ansi(AnsiColor::White),
        Color::DarkGray => ansi(AnsiColor::BrightBlack),
        Color::LightRed => ansi(AnsiColor::BrightRed),
        Color::LightGreen => ansi(AnsiColor::BrightGreen),
        Color::LightYellow => ansi(AnsiColor::BrightYellow),
        Color::LightBlue => ansi(AnsiColor::BrightBlue),
        Color::LightMagenta => ansi(AnsiColor::BrightMagenta),
        Color::LightCyan => ansi(AnsiColor::BrightCyan),
        Color::White => ansi(AnsiColor::BrightWhite),
        Color::Rgb(r, g, b) => Some(anstyle::Color::Rgb(RgbColor(r, g, b))),
        Color::Indexed(index) => Some(anstyle::Color::Ansi256(Ansi256Color(index))),
    }
}

pub fn anstyle_for(style: &TextStyle) -> anstyle::Style {
    let mut rendered = anstyle::Style::new()
        .fg_color(anstyle_color(style.foreground))
        .bg_color(style.background.and_then(anstyle_color));
    if style.bold {
        rendered = rendered.bold();
    }
    if style.italic {
        rendered = rendered.italic();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::AnsiDecoder;

    fn hit(start: usize, len: usize) -> SearchMatch {
        SearchMatch {
            line: 0,
            start,
            len,
        }
    }

    fn describe(runs: &[LineRun<'_>]) -> Vec<(String, Highlight)> {
        runs.iter()
            .map(|run| (run.text.to_owned(), run.highlight))
            .collect()
    }

    #[test]
    fn line_without_matches_keeps_its_segments() {
        let line = AnsiDecoder::default().decode_line("\u{1b}[31mred\u{1b}[0m plain");
        let runs = split_runs(&line.segments, &[], None);
        assert_eq!(
            describe(&runs),
            vec![
                ("red".to_owned(), Highlight::None),
                (" plain".to_owned(), Highlight::None)
            ]
        );
    }

    #[test]
    fn match_spanning_a_segment_boundary_is_split_per_style() {
        let line = AnsiDecoder::default().decode_line("\u{1b}[31mred\u{1b}[0m plain");
        let runs = split_runs(&line.segments, &[hit(1, 4)], None);
        assert_eq!(
            describe(&runs),
            vec![
                ("r".to_owned(), Highlight::None),
                ("ed".to_owned(), Highlight::Match),
                (" p".to_owned(), Highlight::Match),
                ("lain".to_owned(), Highlight::None),
            ]
        );
        assert_eq!(runs[1].style, line.segments[0].style);
        assert_eq!(runs[2].style, line.segments[1].style);
    }

    #[test]
    fn current_match_is_distinguished() {
        let line = AnsiDecoder::default().decode_line("ab ab");
        let runs = split_runs(&line.segments, &[hit(0, 2), hit(3, 2)], Some(hit(3, 2)));
        assert_eq!(
            describe(&runs),
            vec![
                ("ab".to_owned(), Highlight::Match),
                (" ".to_owned(), Highlight::None),
                ("ab".to_owned(), Highlight::Current),
            ]
        );
    }

    #[test]
    fn terminal_colors_map_to_anstyle() {
        assert_eq!(anstyle_color(Color::Reset), None);
        assert_eq!(
            anstyle_color(Color::LightRed),
            Some(anstyle::Color::Ansi(AnsiColor::BrightRed))
        );
        assert_eq!(
            anstyle_color(Color::Rgb(1, 2, 3)),
            Some(anstyle::Color::Rgb(RgbColor(1, 2, 3)))
        );
    }
}
