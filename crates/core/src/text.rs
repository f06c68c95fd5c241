//! Text Paging Utilities
//!
//! Splits long reports into transport-sized pages. Pages break at line
//! boundaries whenever possible and keep their line terminators, so joining
//! the pages with no separator gives back the original text.

use crate::error::{CoreError, CoreResult};

/// Largest message the chat transport accepts, in bytes.
pub const MAX_PAGE_BYTES: usize = 4096;

/// Check a configured page size against the transport's limit.
pub fn check_page_limit(max_len: usize) -> CoreResult<()> {
    if (1..=MAX_PAGE_BYTES).contains(&max_len) {
        Ok(())
    } else {
        Err(CoreError::PageLimit {
            got: max_len,
            max: MAX_PAGE_BYTES,
        })
    }
}

/// Split `text` into pages of at most `max_len` bytes.
///
/// A page ends at the last line boundary that still fits. A single line
/// longer than `max_len` is hard-cut on a UTF-8 character boundary.
/// Text that already fits (including the empty string) is returned as a
/// single page.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut pages = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.len() + line.len() <= max_len {
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            pages.push(std::mem::take(&mut current));
        }

        if line.len() <= max_len {
            current.push_str(line);
            continue;
        }

        let mut rest = line;
        while rest.len() > max_len {
            let cut = floor_char_boundary(rest, max_len);
            pages.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        current.push_str(rest);
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

/// Smart truncation that adds an ellipsis indicator.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let cut = floor_char_boundary(text, max_len - 3);
    format!("{}...", &text[..cut])
}

/// Largest index `<= index` that lies on a char boundary, never zero for a
/// non-empty string so that hard cuts always make progress.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    if i == 0 {
        // max_len smaller than the first char: take the whole char
        s.char_indices().nth(1).map(|(j, _)| j).unwrap_or(s.len())
    } else {
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pages(text: &str, max_len: usize) -> Vec<String> {
        let pages = split_message(text, max_len);
        assert_eq!(pages.concat(), text, "pages must reassemble the input");
        for page in &pages {
            assert!(page.len() <= max_len, "page of {} > {}", page.len(), max_len);
        }
        pages
    }

    #[test]
    fn test_check_page_limit() {
        assert!(check_page_limit(1).is_ok());
        assert!(check_page_limit(MAX_PAGE_BYTES).is_ok());
        assert_eq!(
            check_page_limit(0),
            Err(CoreError::PageLimit { got: 0, max: MAX_PAGE_BYTES })
        );
        assert!(check_page_limit(MAX_PAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_split_message_short() {
        assert_eq!(split_message("Hello world", 100), vec!["Hello world"]);
    }

    #[test]
    fn test_split_message_empty() {
        assert_eq!(split_message("", 100), vec![""]);
    }

    #[test]
    fn test_split_message_multiline() {
        let pages = assert_pages("Line 1\nLine 2\nLine 3\nLine 4", 15);
        assert_eq!(pages, vec!["Line 1\nLine 2\n", "Line 3\nLine 4"]);
    }

    #[test]
    fn test_split_message_long_single_line() {
        let text = "a".repeat(250);
        let pages = assert_pages(&text, 100);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 100);
        assert_eq!(pages[1].len(), 100);
        assert_eq!(pages[2].len(), 50);
    }

    #[test]
    fn test_split_message_exact_boundary() {
        assert_eq!(split_message("12345\n12345", 11), vec!["12345\n12345"]);
    }

    #[test]
    fn test_split_points_fall_on_line_boundaries() {
        let mut text = String::new();
        for i in 0..200 {
            text.push_str(&format!("process-{:03} 12.5 MB\n", i));
        }
        let pages = assert_pages(&text, 120);
        assert!(pages.len() > 1);
        for page in &pages[..pages.len() - 1] {
            assert!(page.ends_with('\n'));
        }
    }

    #[test]
    fn test_overlong_line_between_short_lines() {
        let text = format!("head\n{}\ntail\n", "x".repeat(25));
        let pages = assert_pages(&text, 10);
        assert_eq!(pages[0], "head\n");
        assert_eq!(pages.last().map(String::as_str), Some("tail\n"));
    }

    #[test]
    fn test_split_message_multibyte_hard_cut() {
        let text = "ж".repeat(30);
        let pages = assert_pages(&text, 7);
        for page in &pages {
            assert!(page.chars().all(|c| c == 'ж'));
        }
    }

    #[test]
    fn test_split_message_telegram_limit() {
        let text = "a".repeat(10000);
        let pages = assert_pages(&text, 4000);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].len(), 2000);
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_long() {
        let text = "a".repeat(200);
        let truncated = truncate(&text, 30);
        assert_eq!(truncated.len(), 30);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_very_small_limit() {
        assert_eq!(truncate("hello world", 3), "...");
    }
}
