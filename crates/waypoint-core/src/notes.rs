//! Validation and normalisation of free-form markdown notes.
//!
//! The stores persist notes verbatim; the [`Planner`](crate::Planner) runs
//! every incoming notes string through [`prepare`] first.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PlannerError, Result};

/// Longest accepted notes text, in characters.
pub const MAX_NOTES_CHARS: usize = 100_000;

const FENCE: &str = "```";

const UNSAFE_TAGS: [&str; 8] = [
    "script", "iframe", "object", "embed", "form", "input", "button", "style",
];

/// One regex per tag matching an opening tag, its content and the closing
/// tag. The regex crate has no backreferences, so pairs are matched per tag.
static PAIRED_TAGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    UNSAFE_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("paired tag pattern is valid")
        })
        .collect()
});

static STRAY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)</?(?:{})\b[^>]*>", UNSAFE_TAGS.join("|")))
        .expect("stray tag pattern is valid")
});

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){3,}").expect("blank run pattern is valid"));

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#{1,6})[ \t]*([^#\s].*)$").expect("heading pattern is valid")
});

/// A list marker already followed by whitespace; extra spaces collapse.
static BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)([-*+])[ \t]+(\S.*)$").expect("bullet pattern is valid")
});

/// `-` or `+` glued to a word. `*` is left alone since `*word*` is emphasis,
/// and digits are left alone so `-5` stays a number.
static TIGHT_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)([-+])(\p{L}.*)$").expect("tight bullet pattern is valid")
});

/// Checks size and code-block balance.
///
/// Fails on more than [`MAX_NOTES_CHARS`] characters, an odd number of
/// ```` ``` ```` fence lines, or an odd number of inline backticks outside
/// fenced blocks.
pub fn validate(text: &str) -> Result<()> {
    let length = text.chars().count();
    if length > MAX_NOTES_CHARS {
        return Err(PlannerError::invalid_input("notes").with_reason(format!(
            "Notes are {length} characters long, the limit is {MAX_NOTES_CHARS}"
        )));
    }

    let mut fences = 0usize;
    let mut inline_ticks = 0usize;
    for line in text.lines() {
        if is_fence(line) {
            fences += 1;
        } else if fences % 2 == 0 {
            inline_ticks += line.matches('`').count();
        }
    }

    if fences % 2 != 0 {
        return Err(PlannerError::invalid_input("notes").with_reason("Unclosed code fence"));
    }
    if inline_ticks % 2 != 0 {
        return Err(
            PlannerError::invalid_input("notes").with_reason("Unbalanced inline code backticks")
        );
    }
    Ok(())
}

/// Strips unsafe HTML, normalises line endings and collapses long blank runs.
pub fn sanitize(text: &str) -> String {
    let mut cleaned = text.replace("\r\n", "\n").replace('\r', "\n");

    for pattern in PAIRED_TAGS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned = STRAY_TAG.replace_all(&cleaned, "").into_owned();

    BLANK_RUN.replace_all(&cleaned, "\n\n").into_owned()
}

/// Normalises heading and bullet spacing outside fenced blocks and ends
/// non-empty text with a newline.
pub fn format(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut formatted = String::with_capacity(text.len() + 1);
    let mut in_fence = false;
    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            formatted.push_str(line);
        } else if in_fence {
            formatted.push_str(line);
        } else if let Some(caps) = HEADING.captures(line) {
            formatted.push_str(&format!("{} {}", &caps[1], &caps[2]));
        } else if let Some(caps) = BULLET
            .captures(line)
            .or_else(|| TIGHT_BULLET.captures(line))
        {
            formatted.push_str(&format!("{}{} {}", &caps[1], &caps[2], &caps[3]));
        } else {
            formatted.push_str(line);
        }
        formatted.push('\n');
    }
    formatted
}

/// Runs [`validate`], [`sanitize`] and [`format`] in sequence.
pub fn prepare(text: &str) -> Result<String> {
    validate(text)?;
    Ok(format(&sanitize(text)))
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_length_limit() {
        assert!(validate(&"a".repeat(MAX_NOTES_CHARS)).is_ok());

        let err = validate(&"a".repeat(MAX_NOTES_CHARS + 1)).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput { ref field, .. } if field == "notes"));
    }

    #[test]
    fn test_validate_code_blocks() {
        assert!(validate("```rust\nlet a = `x`;\n```\nuse `b`").is_ok());
        assert!(validate("```\nunclosed").is_err());
        assert!(validate("one ` tick").is_err());
        // Backticks inside a fence are not counted.
        assert!(validate("```\n`\n```").is_ok());
    }

    #[test]
    fn test_sanitize_strips_unsafe_tags() {
        let input = "Hi<script>alert(1)</script> there<IFRAME src=x></iframe>\n<input type=\"text\"/>ok</form>";
        assert_eq!(sanitize(input), "Hi there\nok");
    }

    #[test]
    fn test_sanitize_keeps_harmless_markup() {
        assert_eq!(sanitize("<b>bold</b> <em>x</em>"), "<b>bold</b> <em>x</em>");
    }

    #[test]
    fn test_sanitize_line_endings_and_blank_runs() {
        assert_eq!(sanitize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(sanitize("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(sanitize("a\n \n\t\n\nb"), "a\n\nb");
        assert_eq!(sanitize("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_format_headings_and_bullets() {
        assert_eq!(format("#Title\n##   Sub"), "# Title\n## Sub\n");
        assert_eq!(format("-item\n  *   nested\n+x"), "- item\n  * nested\n+ x\n");
        assert_eq!(format("**bold** and ---"), "**bold** and ---\n");
        assert_eq!(format("---"), "---\n");
    }

    #[test]
    fn test_format_leaves_emphasis_and_numbers_alone() {
        let input = "*important* read this\n-5 degrees outside\n**bold** lead";
        assert_eq!(format(input), format!("{input}\n"));
        assert_eq!(format("*   spaced\n-   also"), "* spaced\n- also\n");
    }

    #[test]
    fn test_format_leaves_fenced_code_alone() {
        let input = "```\n#include <x>\n-flag\n```";
        assert_eq!(format(input), "```\n#include <x>\n-flag\n```\n");
    }

    #[test]
    fn test_format_empty_and_trailing_newline() {
        assert_eq!(format(""), "");
        assert_eq!(format("done\n"), "done\n");
    }

    #[test]
    fn test_prepare_pipeline() {
        let prepared = prepare("#Risks\r\n-one<script>x</script>\r\n\r\n\r\n\r\n-two").unwrap();
        assert_eq!(prepared, "# Risks\n- one\n\n- two\n");

        assert!(prepare("```").is_err());
    }
}
