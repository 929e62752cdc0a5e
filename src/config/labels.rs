//! Cloud label parsing
//!
//! Labels arrive as a single comma-separated string of `key=value` records,
//! e.g. `Owner=John Doe,Team="a=b"`. A quoted field may contain `=`; commas
//! are never allowed inside a value because records are split on them first.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors produced while parsing a label string
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelError {
    #[error("Malformed label record '{record}': {reason}")]
    Malformed { record: String, reason: String },
}

impl LabelError {
    fn malformed(record: &str, reason: impl Into<String>) -> Self {
        LabelError::Malformed {
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SBIO: Pure parsing functions (no I/O)
// ============================================================================

/// Parse a label string into a map.
///
/// Empty records (including an empty input) are skipped. Every other record
/// must split into exactly two fields on unquoted `=`. Leading whitespace of
/// each field is ignored. When a key repeats, the last value wins.
pub fn parse_cloud_labels(input: &str) -> Result<BTreeMap<String, String>, LabelError> {
    let mut labels = BTreeMap::new();

    for record in input.split(',') {
        if record.is_empty() {
            continue;
        }

        let fields = split_record(record)?;
        if fields.len() != 2 {
            return Err(LabelError::malformed(
                record,
                format!("expected key=value, found {} field(s)", fields.len()),
            ));
        }

        let mut fields = fields.into_iter();
        if let (Some(key), Some(value)) = (fields.next(), fields.next()) {
            labels.insert(key, value);
        }
    }

    Ok(labels)
}

/// Split one record on unquoted `=` separators.
fn split_record(record: &str) -> Result<Vec<String>, LabelError> {
    let mut fields = Vec::new();
    let mut chars = record.chars().peekable();

    loop {
        // Leading whitespace is not part of a field
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    // A doubled quote is an escaped literal quote
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }

            if !closed {
                return Err(LabelError::malformed(record, "unterminated quoted field"));
            }

            match chars.next() {
                None => {
                    fields.push(field);
                    return Ok(fields);
                }
                Some('=') => fields.push(field),
                Some(c) => {
                    return Err(LabelError::malformed(
                        record,
                        format!("unexpected '{}' after quoted field", c),
                    ))
                }
            }
        } else {
            let mut ended = true;
            for c in chars.by_ref() {
                match c {
                    '=' => {
                        ended = false;
                        break;
                    }
                    '"' => {
                        return Err(LabelError::malformed(
                            record,
                            "bare quote in unquoted field",
                        ))
                    }
                    _ => field.push(c),
                }
            }

            fields.push(field);
            if ended {
                return Ok(fields);
            }
        }
    }
}
