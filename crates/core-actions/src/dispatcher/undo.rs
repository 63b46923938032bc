//! `u`: swap the window with the session's undo record.
//!
//! The record holds the whole line map plus dot, labels and flags, so a
//! second `u` redoes what the first one undid.

use super::DispatchResult;
use super::command_parser::CommandParser;
use core_model::EditorEngine;
use core_state::EditResult;

pub(crate) fn handle_undo(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    CommandParser::no_tail('u', tail)?;
    let before = engine.window().dol();
    engine.undo()?;
    let after = engine.window().dol();
    tracing::trace!(target: "actions.dispatch", op = "undo", before, after, dot = engine.window().dot(), "undo");
    Ok(DispatchResult {
        shape_changed: true,
        ..DispatchResult::clean()
    })
}

#[cfg(test)]
mod tests {
    use crate::dispatch;
    use core_model::EditorEngine;
    use core_state::{EditError, StateError};
    use pretty_assertions::assert_eq;

    #[test]
    fn nothing_to_undo_on_fresh_session() {
        let mut e = EditorEngine::default();
        assert_eq!(
            dispatch(&mut e, "u"),
            Err(EditError::State(StateError::NothingToUndo))
        );
    }

    #[test]
    fn undo_restores_dot_and_labels() {
        let mut e = EditorEngine::default();
        e.insert_bulk(0, b"a\nb\nc\n").unwrap();
        dispatch(&mut e, "2kx").unwrap();
        dispatch(&mut e, "2").unwrap();
        dispatch(&mut e, "2d").unwrap();
        assert_eq!(e.window().labels().get('x'), None);
        dispatch(&mut e, "u").unwrap();
        assert_eq!(e.display_lines(), vec!["a", "b", "c"]);
        assert_eq!(e.window().dot(), 2);
        assert_eq!(e.window().labels().get('x'), Some(2));
        assert!(e.pool_balanced());
    }

    #[test]
    fn undo_rejects_trailing_text() {
        let mut e = EditorEngine::default();
        e.insert_bulk(0, b"a\n").unwrap();
        dispatch(&mut e, "d").unwrap();
        assert!(dispatch(&mut e, "ux").is_err());
        assert_eq!(e.window().dol(), 0);
    }
}
