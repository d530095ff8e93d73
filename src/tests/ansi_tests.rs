use super::*;

fn decode(raw: &str) -> StyledLine {
    AnsiDecoder::default().decode_line(raw)
}

fn base() -> TextStyle {
    TextStyle::base(&Palette::default())
}

#[test]
fn plain_text_yields_one_default_segment() {
    for raw in ["hello world", "I/ActivityManager( 123): Start proc", "tab\tseparated"] {
        let line = decode(raw);
        assert_eq!(line.segments.len(), 1, "input: {raw:?}");
        assert_eq!(line.segments[0].text, raw);
        assert_eq!(line.segments[0].style, base());
        assert_eq!(line.plain_text, raw);
    }
}

#[test]
fn color_then_reset_splits_into_two_segments() {
    let line = decode("\u{1b}[31mred\u{1b}[0m plain");
    assert_eq!(line.segments.len(), 2);
    assert_eq!(line.segments[0].text, "red");
    assert_eq!(
        line.segments[0].style.foreground,
        Palette::default().foreground[1]
    );
    assert_eq!(line.segments[1].text, " plain");
    assert_eq!(line.segments[1].style, base());
    assert_eq!(line.plain_text, "red plain");
}

#[test]
fn multiple_codes_apply_in_order() {
    let palette = Palette::default();
    let line = decode("\u{1b}[1;34;43mtag\u{1b}[0;3mnote");
    let tag = &line.segments[0];
    assert_eq!(tag.text, "tag");
    assert!(tag.style.bold);
    assert!(!tag.style.italic);
    assert_eq!(tag.style.foreground, palette.foreground[4]);
    assert_eq!(tag.style.background, Some(palette.background[3]));

    let note = &line.segments[1];
    assert_eq!(note.text, "note");
    assert!(!note.style.bold);
    assert!(note.style.italic);
    assert_eq!(note.style.foreground, palette.default_foreground);
    assert_eq!(note.style.background, None);
}

#[test]
fn bright_foreground_codes_use_upper_half_of_table() {
    let palette = Palette::default();
    let line = decode("\u{1b}[90mdim\u{1b}[97mwhite");
    assert_eq!(line.segments[0].style.foreground, palette.foreground[8]);
    assert_eq!(line.segments[1].style.foreground, palette.foreground[15]);
}

#[test]
fn same_code_always_yields_same_color() {
    let first = decode("\u{1b}[32ma");
    let second = decode("x \u{1b}[32mb");
    assert_eq!(
        first.segments[0].style.foreground,
        second.segments[1].style.foreground
    );
}

#[test]
fn unknown_codes_are_ignored() {
    let line = decode("\u{1b}[5;31;999mblink");
    assert_eq!(line.segments.len(), 1);
    assert_eq!(
        line.segments[0].style.foreground,
        Palette::default().foreground[1]
    );
}

#[test]
fn extended_color_parameters_are_not_misread_as_codes() {
    let line = decode("\u{1b}[38;2;31;1;3mrgb");
    let style = line.segments[0].style;
    assert_eq!(style.foreground, Color::Rgb(31, 1, 3));
    assert!(!style.bold);
    assert!(!style.italic);

    let indexed = decode("\u{1b}[48;5;196mbg");
    assert_eq!(indexed.segments[0].style.background, Some(Color::Indexed(196)));
}

#[test]
fn empty_parameter_list_resets() {
    let line = decode("\u{1b}[1mbold\u{1b}[mplain");
    assert!(line.segments[0].style.bold);
    assert_eq!(line.segments[1].style, base());
}

#[test]
fn incomplete_escape_at_end_of_line_is_dropped() {
    let line = decode("visible\u{1b}[38;5");
    assert_eq!(line.plain_text, "visible");
    assert_eq!(line.segments.len(), 1);

    let dangling = decode("tail\u{1b}");
    assert_eq!(dangling.plain_text, "tail");
}

#[test]
fn non_sgr_sequences_and_control_bytes_are_stripped() {
    let line = decode("\u{1b}[2K\u{1b}[1Ahello \u{1b}]0;title\u{7}\u{1b}[31mred\u{1b}[0m\r");
    assert_eq!(line.plain_text, "hello red");
    let rendered = line
        .segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<String>();
    assert_eq!(rendered, "hello red");
}

#[test]
fn style_does_not_leak_across_lines() {
    let decoder = AnsiDecoder::default();
    let first = decoder.decode_line("\u{1b}[31mstill red at eol");
    assert_ne!(first.segments[0].style, base());
    let second = decoder.decode_line("next line");
    assert_eq!(second.segments[0].style, base());
}

#[test]
fn adjacent_runs_with_equal_style_are_merged() {
    let line = decode("a\u{1b}[0mb\u{1b}[22mc");
    assert_eq!(line.segments.len(), 1);
    assert_eq!(line.segments[0].text, "abc");
}

#[test]
fn empty_line_yields_single_empty_segment() {
    let line = decode("");
    assert_eq!(line.segments.len(), 1);
    assert_eq!(line.segments[0].text, "");
    assert_eq!(line.plain_text, "");
}

#[test]
fn custom_palette_is_honored() {
    let mut palette = Palette::default();
    palette.foreground[1] = Color::Red;
    palette.default_foreground = Color::Gray;
    let decoder = AnsiDecoder::new(palette);
    let line = decoder.decode_line("\u{1b}[31merr\u{1b}[39m ok");
    assert_eq!(line.segments[0].style.foreground, Color::Red);
    assert_eq!(line.segments[1].style.foreground, Color::Gray);
}

#[test]
fn charset_and_line_attribute_escapes_leave_no_text() {
    for raw in [
        "\u{1b}(B\u{1b}[mhello",
        "\u{1b})0hello",
        "\u{1b}#8hello",
        "\u{1b}7hello\u{1b}8",
    ] {
        let line = decode(raw);
        assert_eq!(line.plain_text, "hello", "input: {raw:?}");
        assert_eq!(line.segments.len(), 1, "input: {raw:?}");
    }
}
