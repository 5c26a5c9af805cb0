//! Property tests for the line commands.

use core_actions::CommentMarkers;
use core_actions::engine::{move_lines_down, move_lines_up, selected_lines, toggle_line_comment};
use core_state::{EditorState, Selection};
use core_text::Buffer;
use proptest::prelude::*;

fn lines_strategy(charset: &'static str) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(charset, 2..7)
}

fn state(text: &str, anchor: usize, caret: usize) -> EditorState {
    let mut st = EditorState::new(Buffer::from_str("prop", text));
    st.set_selection(anchor, caret, false);
    st
}

proptest! {
    // Comment then uncomment restores the text and the selection exactly.
    #[test]
    fn toggle_line_comment_twice_is_identity(
        lines in lines_strategy("[a-z \t]{0,6}"),
        a in 0usize..64,
        c in 0usize..64,
    ) {
        let text = lines.join("\n");
        let len = text.chars().count();
        let (a, c) = (a.min(len), c.min(len));
        prop_assume!(a != c);
        let mut st = state(&text, a, c);
        let range = selected_lines(&st).unwrap();
        prop_assume!(range.first < range.last);

        let markers = CommentMarkers::default();
        prop_assert!(toggle_line_comment(&mut st, &markers).unwrap());
        prop_assert_ne!(st.buffer().text(), text.clone());
        prop_assert!(toggle_line_comment(&mut st, &markers).unwrap());
        prop_assert_eq!(st.buffer().text(), text);
        prop_assert_eq!(st.selection(), Selection::new(a, c));
    }

    // Moving a block up and back down restores the buffer when the block
    // touches neither the first nor the last line.
    #[test]
    fn move_up_then_down_restores_text(
        lines in lines_strategy("[a-z]{0,5}"),
        trailing_newline in any::<bool>(),
        a in 0usize..48,
        c in 0usize..48,
    ) {
        let mut text = lines.join("\n");
        if trailing_newline {
            text.push('\n');
        }
        let len = text.chars().count();
        let (a, c) = (a.min(len), c.min(len));
        let mut st = state(&text, a, c);
        let range = selected_lines(&st).unwrap();
        prop_assume!(range.first > 0 && range.last + 1 < st.buffer().line_count());

        prop_assert!(move_lines_up(&mut st).unwrap());
        prop_assert!(move_lines_down(&mut st).unwrap());
        prop_assert_eq!(st.buffer().text(), text);
    }

    // One command, one undo step, whatever the selection.
    #[test]
    fn move_lines_is_one_undo_step(
        lines in lines_strategy("[a-z]{1,4}"),
        a in 0usize..32,
        c in 0usize..32,
    ) {
        let text = lines.join("\n");
        let len = text.chars().count();
        let (a, c) = (a.min(len), c.min(len));
        let mut st = state(&text, a, c);
        let before = st.selection();
        move_lines_down(&mut st).unwrap();
        if st.buffer().text() != text {
            prop_assert_eq!(st.undo_stack().undo_depth(), 1);
            prop_assert!(st.undo().unwrap());
            prop_assert_eq!(st.buffer().text(), text);
            prop_assert_eq!(st.selection(), before);
        }
    }
}
