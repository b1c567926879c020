//! Word wrapping for transcript rendering.
//!
//! The transcript is wrapped before it reaches ratatui so the renderer knows
//! the exact row count it needs for scrolling.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap `text` to rows of at most `width` columns.
///
/// Explicit newlines always start a new row. Words longer than a row are
/// broken at character boundaries. Trailing spaces at a wrap point are dropped.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for raw_line in text.split('\n') {
        let raw_line = raw_line.trim_end_matches('\r');
        let mut row = String::new();
        let mut row_width = 0usize;

        for word in raw_line.split_inclusive(' ') {
            let bare = word.trim_end_matches(' ');
            let bare_width = bare.width();

            if row_width > 0 && row_width + bare_width > width {
                rows.push(row.trim_end().to_string());
                row.clear();
                row_width = 0;
            }

            if bare_width > width {
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if row_width + ch_width > width {
                        if ch == ' ' {
                            continue;
                        }
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                    row.push(ch);
                    row_width += ch_width;
                }
                continue;
            }

            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if ch == ' ' && row_width + ch_width > width {
                    break;
                }
                row.push(ch);
                row_width += ch_width;
            }
        }

        rows.push(row.trim_end().to_string());
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_rows() {
        assert_eq!(wrap_text("one\n\ntwo", 20), vec!["one", "", "two"]);
        assert_eq!(wrap_text("", 20), vec![""]);
    }

    #[test]
    fn breaks_words_longer_than_a_row() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("hi abcdefgh", 4), vec!["hi", "abcd", "efgh"]);
    }

    #[test]
    fn counts_wide_characters_by_display_width() {
        let rows = wrap_text("привет мир", 6);
        assert_eq!(rows, vec!["привет", "мир"]);
        let rows = wrap_text("日本語テキスト", 6);
        assert!(rows.iter().all(|row| row.width() <= 6));
        assert_eq!(rows.concat(), "日本語テキスト");
    }

    #[test]
    fn no_row_exceeds_width() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit sed do";
        for width in 1..20 {
            for row in wrap_text(text, width) {
                assert!(row.width() <= width, "{row:?} wider than {width}");
            }
        }
    }
}
