// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Line Cursor: the single piece of mutable state threaded through
//! every other component. A deque of line fragments (each retaining its
//! original newline terminator) supporting peek/pop/push-back.

use crate::patterns;
use std::collections::VecDeque;

/// Splits `text` into line fragments, each retaining its trailing `\n`
/// (the final fragment has none if the text doesn't end in a newline).
pub fn split_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, b) in text.as_bytes().iter().enumerate() {
        if *b == b'\n' {
            out.push(text[start..=i].to_string());
            start = i + 1;
        }
    }
    if start < text.len() {
        out.push(text[start..].to_string());
    }
    out
}

/// Strips the line terminator from a line fragment, for pattern matching.
pub fn strip_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// A line consisting only of whitespace (terminator already excluded).
pub fn is_blank(line: &str) -> bool {
    patterns::EMPTY_LINE.is_match(strip_eol(line))
}

/// An ordered sequence of source lines supporting peek, pop and
/// push-back at the front. Owned exclusively by whichever stack frame
/// currently holds it; recursive calls pass the same cursor down.
pub struct LineCursor {
    lines: VecDeque<String>,
}

impl LineCursor {
    pub fn new<I: IntoIterator<Item = String>>(lines: I) -> Self {
        LineCursor {
            lines: lines.into_iter().collect(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(split_lines(text))
    }

    /// Non-consuming lookahead. Out-of-range returns the empty-string
    /// sentinel.
    pub fn peek(&self, k: usize) -> &str {
        self.lines.get(k).map(String::as_str).unwrap_or("")
    }

    /// Pops and returns the head line, if any.
    pub fn pop(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    /// Pushes a line back onto the front of the cursor.
    pub fn unshift(&mut self, line: String) {
        self.lines.push_front(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Pops lines while the head is whitespace-only.
    pub fn skip_blank(&mut self) {
        while self.lines.front().map(|l| is_blank(l)).unwrap_or(false) {
            self.lines.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn split_keeps_terminators() {
        let lines = split_lines("a\nb\nc");
        assert_eq!(lines, vec!["a\n", "b\n", "c"]);
    }

    #[test]
    fn split_handles_trailing_newline() {
        let lines = split_lines("a\nb\n");
        assert_eq!(lines, vec!["a\n", "b\n"]);
    }

    #[test]
    fn peek_out_of_range_is_empty_sentinel() {
        let c = LineCursor::from_text("only\n");
        assert_eq!(c.peek(5), "");
    }

    #[test]
    fn unshift_then_pop_roundtrips() {
        let mut c = LineCursor::from_text("b\n");
        c.unshift("a\n".to_string());
        assert_eq!(c.pop().unwrap(), "a\n");
        assert_eq!(c.pop().unwrap(), "b\n");
        assert!(c.is_empty());
    }

    #[test]
    fn skip_blank_is_idempotent() {
        let mut c = LineCursor::from_text("\n  \n\ntext\n");
        c.skip_blank();
        let after_first = c.len();
        c.skip_blank();
        assert_eq!(after_first, c.len());
        assert_eq!(c.peek(0), "text\n");
    }

    proptest! {
        // Invariant 5: skip_blank is idempotent over arbitrary mixes of
        // blank and non-blank lines, not just the hand-picked case above.
        #[test]
        fn skip_blank_is_idempotent_over_arbitrary_lines(
            lines in prop::collection::vec(
                prop_oneof![
                    Just(String::new()),
                    Just("   \n".to_string()),
                    Just("\t\n".to_string()),
                    "[a-z]{1,8}\n",
                ],
                0..16,
            )
        ) {
            let mut once = LineCursor::new(lines.clone());
            once.skip_blank();
            let len_once = once.len();
            let head_once = once.peek(0).to_string();

            let mut twice = LineCursor::new(lines);
            twice.skip_blank();
            twice.skip_blank();

            prop_assert_eq!(len_once, twice.len());
            prop_assert_eq!(head_once, twice.peek(0).to_string());
        }
    }
}
