//! Property tests for the pure invariants of the conversion domain.

use std::path::{Path, PathBuf};
use std::time::Duration;

use convert_core::{BatchState, ConversionKind, ConversionTask, TaskState};
use proptest::prelude::*;

fn any_task_state() -> impl Strategy<Value = TaskState> {
    prop_oneof![
        Just(TaskState::Pending),
        Just(TaskState::Running),
        Just(TaskState::Complete),
        Just(TaskState::Cancelled),
        Just(TaskState::Failed),
    ]
}

proptest! {
    /// Property: kind parsing is total and never panics
    #[test]
    fn kind_parsing_is_total(label in ".*") {
        let _ = ConversionKind::from_label(&label);
    }

    /// Property: labels without separators are never a known kind
    #[test]
    fn bare_word_labels_map_to_unknown(label in "[a-z]{1,16}") {
        prop_assert_eq!(ConversionKind::from_label(&label), ConversionKind::Unknown);
    }

    /// Property: a task state is never both terminal and active
    #[test]
    fn terminal_and_active_are_disjoint(state in any_task_state()) {
        prop_assert!(!(state.is_terminal() && state.is_active()));
    }

    /// Property: task state survives a display/parse round trip
    #[test]
    fn task_state_display_parse_round_trip(state in any_task_state()) {
        let parsed: TaskState = state.to_string().parse().unwrap();
        prop_assert_eq!(parsed, state);
    }

    /// Property: output lands under the root as converted_<file name>
    #[test]
    fn output_path_is_converted_name_under_root(name in "[A-Za-z0-9][A-Za-z0-9._-]{0,24}") {
        let task = ConversionTask::new(
            PathBuf::from("/sources").join(&name),
            Path::new("/downloads"),
            ConversionKind::Unknown,
            1,
            Duration::from_millis(1),
        );
        let expected = PathBuf::from("/downloads").join(format!("converted_{name}"));
        prop_assert_eq!(task.output(), expected.as_path());
    }
}

#[test]
fn batch_terminal_states_are_final() {
    for state in [
        BatchState::Complete,
        BatchState::PartiallyFailed,
        BatchState::Cancelled,
    ] {
        assert!(state.is_terminal());
    }
    assert!(!BatchState::Pending.is_terminal());
    assert!(!BatchState::Running.is_terminal());
}
