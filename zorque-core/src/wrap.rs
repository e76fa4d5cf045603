//! Word wrapping for the fixed-width terminal.
//!
//! Explicit newlines split the text into paragraphs. Within a paragraph,
//! words are packed greedily while the line stays strictly narrower than
//! `max_width` cells, which leaves the terminal's last column free so it
//! never auto-wraps. A word wider than the whole line is not split; it gets
//! a line of its own and overflows. When such a word opens a paragraph the
//! empty line in front of it is flushed first, leaving a blank line.

use crate::display::{DisplayError, DisplaySink};
use unicode_width::UnicodeWidthStr;

/// Wrap `text` into lines for a terminal `max_width` cells wide.
pub fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for_each_line(text, max_width, |line| {
        lines.push(line);
        Ok::<_, std::convert::Infallible>(())
    })
    .unwrap_or_else(|never| match never {});
    lines
}

/// Wrap `text` to the sink's width and write it line by line.
///
/// Returns the number of lines written.
pub fn write_wrapped<S: DisplaySink + ?Sized>(
    sink: &mut S,
    text: &str,
    max_width: usize,
) -> Result<usize, DisplayError> {
    let mut written = 0;
    for_each_line(text, max_width, |line| -> Result<(), DisplayError> {
        sink.write_line(&line)?;
        written += 1;
        Ok(())
    })?;
    Ok(written)
}

/// Core packing loop; hands each finished line to `emit` as soon as it is
/// complete.
fn for_each_line<E>(
    text: &str,
    max_width: usize,
    mut emit: impl FnMut(String) -> Result<(), E>,
) -> Result<(), E> {
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut col = 0;
        let mut has_word = false;

        for word in paragraph.split_whitespace() {
            let width = word.width();
            if !has_word && width < max_width {
                line.push_str(word);
                col = width;
            } else if has_word && col + 1 + width < max_width {
                line.push(' ');
                line.push_str(word);
                col += 1 + width;
            } else {
                emit(std::mem::take(&mut line))?;
                line.push_str(word);
                col = width;
            }
            has_word = true;
        }

        // Blank paragraphs keep their vertical space; whitespace-only ones
        // produce nothing.
        if has_word || paragraph.is_empty() {
            emit(line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::CharGrid;

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap("Go north", 40), ["Go north"]);
    }

    #[test]
    fn test_greedy_packing() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 16);
        assert_eq!(lines, ["the quick brown", "fox jumps over", "the lazy dog"]);
        assert!(lines.iter().all(|l| l.width() < 16));
    }

    #[test]
    fn test_line_must_stay_below_width() {
        // "abc def" is 7 cells; with width 7 it must break.
        assert_eq!(wrap("abc def", 7), ["abc", "def"]);
        assert_eq!(wrap("abc def", 8), ["abc def"]);
    }

    #[test]
    fn test_paragraphs_and_blank_lines() {
        let lines = wrap("You are outside.\n\nItems: none\n1. Door", 40);
        assert_eq!(lines, ["You are outside.", "", "Items: none", "1. Door"]);
    }

    #[test]
    fn test_leading_newlines_become_blank_lines() {
        assert_eq!(wrap("\n\nPLAYER: 3", 40), ["", "", "PLAYER: 3"]);
    }

    #[test]
    fn test_trailing_newline_adds_blank_line() {
        assert_eq!(wrap("end\n", 40), ["end", ""]);
    }

    #[test]
    fn test_whitespace_only_paragraph_is_dropped() {
        assert_eq!(wrap("a\n   \nb", 40), ["a", "b"]);
    }

    #[test]
    fn test_collapses_internal_whitespace() {
        assert_eq!(wrap("  a   b\tc  ", 40), ["a b c"]);
    }

    #[test]
    fn test_overlong_word_stands_alone() {
        let lines = wrap("go supercalifragilistic now", 10);
        assert_eq!(lines, ["go", "supercalifragilistic", "now"]);
    }

    #[test]
    fn test_overlong_first_word_flushes_empty_line() {
        assert_eq!(wrap("abcdefghijkl x", 5), ["", "abcdefghijkl", "x"]);
        assert_eq!(wrap("ok\nabcdefghijkl", 5), ["ok", "", "abcdefghijkl"]);
    }

    #[test]
    fn test_write_wrapped_reports_sink_errors() {
        struct BrokenSink;

        impl DisplaySink for BrokenSink {
            fn write_line(&mut self, _line: &str) -> Result<(), DisplayError> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into())
            }

            fn clear(&mut self) -> Result<(), DisplayError> {
                Ok(())
            }

            fn refresh(&mut self) -> Result<(), DisplayError> {
                Ok(())
            }

            fn columns(&self) -> usize {
                10
            }
        }

        let err = write_wrapped(&mut BrokenSink, "a door", 10).unwrap_err();
        assert!(matches!(err, DisplayError::Io(_)));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(wrap("", 10), [""]);
    }

    #[test]
    fn test_write_wrapped_streams_to_sink() {
        let mut grid = CharGrid::new(12, 4);
        let written = write_wrapped(&mut grid, "a door creaks open", 12).unwrap();

        assert_eq!(written, 2);
        let rows: Vec<_> = grid.lines().collect();
        assert_eq!(rows, ["a door", "creaks open", "", ""]);
    }
}
