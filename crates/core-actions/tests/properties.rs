mod common;
use common::*;

use core_actions::dispatch;
use proptest::prelude::*;

fn line() -> impl Strategy<Value = String> {
    "[abx ]{0,6}"
}

fn buffer() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line(), 1..12)
}

/// Edits that replace, remove or append after the last line.
fn last_line_edit() -> impl Strategy<Value = Vec<&'static str>> {
    prop_oneof![
        Just(vec!["$d"]),
        Just(vec!["$a", "tail", "."]),
        Just(vec!["$c", "tail", "."]),
        Just(vec!["$s/$/!/"]),
        Just(vec!["$m0"]),
        Just(vec!["$-1,$j"]),
        Just(vec!["1t$"]),
    ]
}

fn blob(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

/// Commands that may fail (bad addresses, no match) but never corrupt state.
fn command() -> impl Strategy<Value = String> {
    prop_oneof![
        (1usize..14, 0usize..4).prop_map(|(a, n)| format!("{a},{}d", a + n)),
        (1usize..14).prop_map(|a| format!("{a}ka")),
        (1usize..14).prop_map(|a| format!("{a}kb")),
        (1usize..14, 0usize..14).prop_map(|(a, d)| format!("{a}m{d}")),
        (1usize..14, 0usize..14).prop_map(|(a, d)| format!("{a}t{d}")),
        (1usize..14).prop_map(|a| format!("{a},{}j", a + 1)),
        Just(",s/a/b/g".to_string()),
        Just(",s/x/\\n/".to_string()),
        Just("g/b/d".to_string()),
        Just("v/a/s/$/!/".to_string()),
        Just("g/x/.t0".to_string()),
        Just("u".to_string()),
        Just("'a,'bp".to_string()),
    ]
}

proptest! {
    #[test]
    fn window_invariants_survive_any_script(
        lines in buffer(),
        script in prop::collection::vec(command(), 1..16),
    ) {
        let mut e = engine_with(&blob(&lines));
        for cmd in &script {
            let _ = dispatch(&mut e, cmd);
            let w = e.window();
            prop_assert!(w.dot() <= w.dol());
            prop_assert_eq!(w.dol(), w.map().len());
            prop_assert!(w.labels().iter().all(|(_, l)| l >= 1 && l <= w.dol()));
            prop_assert!(e.pool_balanced(), "pool unbalanced after {}", cmd);
        }
    }

    #[test]
    fn undo_twice_is_identity(
        lines in buffer(),
        script in prop::collection::vec(command(), 1..8),
    ) {
        let mut e = engine_with(&blob(&lines));
        for cmd in &script {
            if cmd != "u" {
                let _ = dispatch(&mut e, cmd);
            }
        }
        let before = e.display_lines();
        let dot = e.window().dot();
        if dispatch(&mut e, "u").is_ok() {
            dispatch(&mut e, "u").unwrap();
            prop_assert_eq!(e.display_lines(), before);
            prop_assert_eq!(e.window().dot(), dot);
            prop_assert!(e.pool_balanced());
        }
    }

    #[test]
    fn global_and_inverse_partition_lines(lines in buffer()) {
        let text = blob(&lines);
        let mut g = engine_with(&text);
        let mut v = engine_with(&text);
        let _ = dispatch(&mut g, "g/a/s/^/+/");
        let _ = dispatch(&mut v, "v/a/s/^/+/");
        let gl = g.display_lines();
        let vl = v.display_lines();
        prop_assert_eq!(gl.len(), lines.len());
        prop_assert_eq!(vl.len(), lines.len());
        for i in 0..lines.len() {
            let in_g = gl[i].starts_with('+');
            let in_v = vl[i].starts_with('+');
            prop_assert!(in_g != in_v, "line {} marked by both or neither", i + 1);
            prop_assert_eq!(in_g, lines[i].contains('a'));
        }
    }

    #[test]
    fn extract_returns_inserted_bytes(
        before in buffer(),
        inserted in buffer(),
        at in 0usize..12,
    ) {
        let mut e = engine_with(&blob(&before));
        let at = at.min(e.window().dol());
        let bytes = blob(&inserted);
        let n = e.insert_bulk(at, bytes.as_bytes()).unwrap();
        prop_assert_eq!(n, inserted.len());
        let out = e.extract_range(at + 1, at + n).unwrap();
        prop_assert_eq!(out, bytes.into_bytes());
    }

    #[test]
    fn unterminated_last_line_is_tracked_through_edits(
        head in buffer(),
        last in "[abx]{1,6}",
        edit in last_line_edit(),
    ) {
        let text = format!("{}{last}", blob(&head));
        let mut e = engine_with(&text);
        prop_assert_eq!(e.extract_range(1, e.window().dol()).unwrap(), text.as_bytes());

        for cmd in &edit {
            dispatch(&mut e, cmd).unwrap();
        }
        let edited = e.extract_range(1, e.window().dol()).unwrap();
        prop_assert_eq!(edited.last(), Some(&b'\n'), "after {:?}", edit);

        dispatch(&mut e, "u").unwrap();
        prop_assert_eq!(e.extract_range(1, e.window().dol()).unwrap(), text.as_bytes());
        prop_assert!(e.pool_balanced());
    }
}
