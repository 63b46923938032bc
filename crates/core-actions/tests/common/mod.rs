#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::{DispatchResult, dispatch};
use core_model::EditorEngine;
use core_state::EditError;

/// Engine whose first session holds `text` (split on newlines), dot on the
/// last line, nothing changed and nothing to undo.
pub fn engine_with(text: &str) -> EditorEngine {
    let mut engine = EditorEngine::default();
    if !text.is_empty() {
        engine
            .insert_bulk(0, text.as_bytes())
            .expect("fixture text fits the default limits");
    }
    engine
}

/// Run every line of `script`, panicking with the failing command.
pub fn run<S: AsRef<str>>(engine: &mut EditorEngine, script: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    for line in script {
        let line = line.as_ref();
        let res = dispatch(engine, line).unwrap_or_else(|e| panic!("{line:?} failed: {e}"));
        out.extend(res.output);
    }
    out
}

pub fn try_run(engine: &mut EditorEngine, line: &str) -> Result<DispatchResult, EditError> {
    dispatch(engine, line)
}

/// Check the structural invariants every command must preserve.
pub fn assert_consistent(engine: &EditorEngine) {
    let w = engine.window();
    assert!(w.dot() <= w.dol(), "dot {} beyond dol {}", w.dot(), w.dol());
    assert_eq!(w.dol(), w.map().len());
    for (name, line) in w.labels().iter() {
        assert!(
            (1..=w.dol()).contains(&line),
            "label {name} names line {line} outside 1..={}",
            w.dol()
        );
    }
    assert!(engine.windows_consistent(), "window invariants broken");
    assert!(engine.pool_balanced(), "pool reference counts out of balance");
}

/// Route test logging to the test harness's captured output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
