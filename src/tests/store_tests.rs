use super::*;
use crate::ansi::AnsiDecoder;
use std::thread;

fn styled(text: &str) -> StyledLine {
    AnsiDecoder::default().decode_line(text)
}

#[test]
fn append_assigns_monotonic_sequence_numbers() {
    let store = LogStore::new();
    for text in ["A", "B", "C"] {
        store.append(styled(text));
    }
    let lines = store.lines();
    assert_eq!(lines.len(), 3);
    for (expected_seq, (line, text)) in lines.iter().zip(["A", "B", "C"]).enumerate() {
        assert_eq!(line.sequence, expected_seq);
        assert_eq!(line.plain_text, text);
    }
}

#[test]
fn plain_text_snapshot_joins_lines_and_maps_offsets() {
    let store = LogStore::new();
    store.append(styled("\u{1b}[31mred\u{1b}[0m"));
    store.append(styled(""));
    store.append(styled("tail"));

    let plain = store.snapshot_plain_text();
    assert_eq!(plain.as_str(), "red\n\ntail");
    assert_eq!(plain.line_count(), 3);
    assert_eq!(plain.line(0), Some("red"));
    assert_eq!(plain.line(1), Some(""));
    assert_eq!(plain.line(2), Some("tail"));
    assert_eq!(plain.line(3), None);
    assert_eq!(plain.locate(0), Some((0, 0)));
    assert_eq!(plain.locate(2), Some((0, 2)));
    assert_eq!(plain.locate(4), Some((1, 0)));
    assert_eq!(plain.locate(6), Some((2, 1)));
}

#[test]
fn held_snapshot_is_stable_while_store_keeps_growing() {
    let store = LogStore::new();
    store.append(styled("one"));
    let snapshot = store.snapshot_plain_text();
    store.append(styled("two"));

    assert_eq!(snapshot.as_str(), "one");
    assert_eq!(snapshot.line_count(), 1);
    assert_eq!(store.snapshot_plain_text().as_str(), "one\ntwo");
}

#[test]
fn clear_discards_lines_and_restarts_numbering() {
    let store = LogStore::new();
    store.append(styled("old"));
    let before = store.snapshot_plain_text().generation();
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.snapshot_plain_text().as_str(), "");
    assert_ne!(store.snapshot_plain_text().generation(), before);

    let line = store.append(styled("new"));
    assert_eq!(line.sequence, 0);
    assert_eq!(store.line(0).expect("line 0").plain_text, "new");
}

#[test]
fn subscribers_are_notified_of_appends_and_clears() {
    let store = LogStore::new();
    let events = store.subscribe();
    store.append(styled("a"));
    store.append(styled("b"));
    store.clear();

    let received = events.try_iter().collect::<Vec<StoreEvent>>();
    assert_eq!(
        received,
        vec![
            StoreEvent::Appended(0),
            StoreEvent::Appended(1),
            StoreEvent::Cleared
        ]
    );
}

#[test]
fn dropped_subscribers_are_pruned() {
    let store = LogStore::new();
    drop(store.subscribe());
    store.append(styled("a"));
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_readers_see_consistent_prefixes() {
    let store = LogStore::new();
    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for idx in 0..500usize {
                store.append(styled(&format!("line-{idx}")));
            }
        })
    };

    for _ in 0..50 {
        let plain = store.snapshot_plain_text();
        for idx in 0..plain.line_count() {
            assert_eq!(plain.line(idx), Some(format!("line-{idx}").as_str()));
        }
    }
    writer.join().expect("writer thread");
    assert_eq!(store.len(), 500);
}
