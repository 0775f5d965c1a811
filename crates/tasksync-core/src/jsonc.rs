//! Banner-comment stripping and write-path self validation for `.jsonc`
//! task documents.
//!
//! Comments only ever appear as a banner ahead of the JSON value, but the
//! stripper is string-aware anyway: text such as `"// not a comment"` inside a
//! string literal passes through untouched.

use serde::de::DeserializeOwned;
use std::fmt;

// ---------------------------------------------------------------------------
// Strip
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StripState {
    Normal,
    InString,
    Escape,
    LineComment,
    BlockComment,
}

/// Remove `//` and `/* */` comments that appear outside string literals.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = StripState::Normal;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            StripState::Normal => match c {
                '"' => {
                    out.push(c);
                    StripState::InString
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    StripState::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    StripState::BlockComment
                }
                _ => {
                    out.push(c);
                    StripState::Normal
                }
            },
            StripState::InString => {
                out.push(c);
                match c {
                    '\\' => StripState::Escape,
                    '"' => StripState::Normal,
                    _ => StripState::InString,
                }
            }
            StripState::Escape => {
                out.push(c);
                StripState::InString
            }
            StripState::LineComment => {
                if c == '\n' {
                    out.push(c);
                    StripState::Normal
                } else {
                    StripState::LineComment
                }
            }
            StripState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    StripState::Normal
                } else {
                    StripState::BlockComment
                }
            }
        };
    }
    out
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

const CONTEXT_RADIUS: usize = 40;

const LIKELY_CAUSES: &[&str] = &[
    "a string value contains characters that were not escaped",
    "the JSON serializer produced malformed output",
    "the output was truncated before the document ended",
];

/// Self-validation failure: the serialized document could not be read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: String,
    pub message: String,
    /// Byte offset of the failure in the stripped buffer.
    pub offset: usize,
    pub context: String,
    pub hints: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "generated task document failed self-validation ({}): {}",
            self.kind, self.message
        )?;
        writeln!(f, "  at byte {}: {}", self.offset, self.context)?;
        write!(f, "  likely causes:")?;
        for hint in &self.hints {
            write!(f, "\n    - {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    fn new(kind: &str, message: impl Into<String>, buf: &str, offset: usize) -> Self {
        let offset = offset.min(buf.len());
        Self {
            kind: kind.to_string(),
            message: message.into(),
            offset,
            context: context_window(buf, offset, CONTEXT_RADIUS),
            hints: LIKELY_CAUSES.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// Up to `radius` bytes either side of `offset`, widened to char boundaries
/// and with control characters escaped so the snippet prints on one line.
pub fn context_window(buf: &str, offset: usize, radius: usize) -> String {
    let offset = offset.min(buf.len());
    let mut start = offset.saturating_sub(radius);
    while !buf.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = offset.saturating_add(radius).min(buf.len());
    while !buf.is_char_boundary(end) {
        end += 1;
    }
    buf[start..end].escape_debug().to_string()
}

/// Byte offset of a 1-based line/column position as reported by serde_json.
fn byte_offset(buf: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = buf
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    line_start
        .saturating_add(column.saturating_sub(1))
        .min(buf.len())
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Strip comments and parse. Any failure becomes a [`ValidationError`].
pub fn parse_checked<T: DeserializeOwned>(text: &str) -> Result<T, ValidationError> {
    let stripped = strip_comments(text);
    serde_json::from_str(&stripped).map_err(|e| {
        let kind = match e.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "unexpected end of input",
        };
        let offset = byte_offset(&stripped, e.line(), e.column());
        ValidationError::new(kind, e.to_string(), &stripped, offset)
    })
}

/// Re-read `text` and require the result to equal `expected`.
pub fn validate_round_trip<T>(text: &str, expected: &T) -> Result<(), ValidationError>
where
    T: DeserializeOwned + PartialEq,
{
    let parsed: T = parse_checked(text)?;
    if &parsed != expected {
        let stripped = strip_comments(text);
        return Err(ValidationError::new(
            "round-trip mismatch",
            "document parsed back to a different value",
            &stripped,
            0,
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
