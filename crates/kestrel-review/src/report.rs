//! XML review report serialization.
//!
//! The report format is deliberately small: a `<reviews>` root, one
//! `<file>` per reviewed file in input order, each holding the findings
//! that file accumulated across roles. The writer and reader here are the
//! only code that knows the shape, so a hand-rolled cursor parser is
//! enough; there is no general-purpose XML handling.

use kestrel_core::{FileReview, KestrelError, ReviewFinding};

/// Serialize file reviews into the XML report format.
///
/// File order follows the input slice; finding order within a file is
/// preserved.
///
/// # Errors
///
/// Returns [`KestrelError::Serialization`] when any text contains a
/// control character that XML 1.0 cannot represent.
///
/// # Examples
///
/// ```
/// use kestrel_core::{FileReview, ReviewFinding};
/// use kestrel_review::report::to_xml;
///
/// let reviews = vec![FileReview {
///     filename: "src/lib.rs".into(),
///     reviews: vec![ReviewFinding {
///         kind: "style".into(),
///         suggestion: "rename x".into(),
///     }],
/// }];
/// let xml = to_xml(&reviews).unwrap();
/// assert!(xml.contains("<filename>src/lib.rs</filename>"));
/// ```
pub fn to_xml(files: &[FileReview]) -> Result<String, KestrelError> {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<reviews>\n");
    for file in files {
        out.push_str("  <file>\n");
        out.push_str("    <filename>");
        out.push_str(&escape_xml(&file.filename)?);
        out.push_str("</filename>\n");
        out.push_str("    <reviews>\n");
        for finding in &file.reviews {
            out.push_str("      <review>\n");
            out.push_str("        <type>");
            out.push_str(&escape_xml(&finding.kind)?);
            out.push_str("</type>\n");
            out.push_str("        <suggestion>");
            out.push_str(&escape_xml(&finding.suggestion)?);
            out.push_str("</suggestion>\n");
            out.push_str("      </review>\n");
        }
        out.push_str("    </reviews>\n");
        out.push_str("  </file>\n");
    }
    out.push_str("</reviews>\n");
    Ok(out)
}

/// Parse an XML review report back into file reviews.
///
/// Accepts exactly the shape [`to_xml`] produces, with whitespace between
/// elements ignored.
///
/// # Errors
///
/// Returns [`KestrelError::Parse`] when a required element is missing or
/// malformed.
pub fn from_xml(input: &str) -> Result<Vec<FileReview>, KestrelError> {
    let body = take_block(input, "reviews")?
        .ok_or_else(|| KestrelError::Parse("missing <reviews> root element".into()))?;

    let mut files = Vec::new();
    let mut cursor = body;
    while let Some((file_body, rest)) = take_block_advance(cursor, "file")? {
        cursor = rest;

        let filename = take_block(file_body, "filename")?
            .ok_or_else(|| KestrelError::Parse("file element missing <filename>".into()))?;
        let reviews_body = take_block(file_body, "reviews")?.unwrap_or("");

        let mut reviews = Vec::new();
        let mut review_cursor = reviews_body;
        while let Some((review_body, rest)) = take_block_advance(review_cursor, "review")? {
            review_cursor = rest;
            let kind = take_block(review_body, "type")?
                .ok_or_else(|| KestrelError::Parse("review element missing <type>".into()))?;
            let suggestion = take_block(review_body, "suggestion")?
                .ok_or_else(|| KestrelError::Parse("review element missing <suggestion>".into()))?;
            reviews.push(ReviewFinding {
                kind: unescape_xml(kind),
                suggestion: unescape_xml(suggestion),
            });
        }

        files.push(FileReview {
            filename: unescape_xml(filename),
            reviews,
        });
    }

    Ok(files)
}

/// Escape text for XML element content.
///
/// C0 control characters other than tab, newline, and carriage return are
/// not representable in XML 1.0 and are rejected outright.
fn escape_xml(text: &str) -> Result<String, KestrelError> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 => {
                return Err(KestrelError::Serialization(format!(
                    "control character U+{:04X} cannot be represented in XML",
                    c as u32
                )));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn unescape_xml(text: &str) -> String {
    // &amp; last, so "&amp;lt;" decodes to "&lt;" and not "<".
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Find the first `<tag>...</tag>` block and return its inner text.
///
/// Matching is exact on the full tag token, so `<review>` never matches
/// inside `<reviews>`.
fn take_block<'a>(input: &'a str, tag: &str) -> Result<Option<&'a str>, KestrelError> {
    Ok(take_block_advance(input, tag)?.map(|(body, _)| body))
}

/// Like [`take_block`], also returning the text after the closing tag so
/// callers can iterate over repeated elements.
///
/// The close-tag scan is nesting-aware: `<reviews>` appears both at the
/// root and inside every `<file>`, so same-name opens between the open tag
/// and a candidate close tag must be balanced before the block ends.
fn take_block_advance<'a>(
    input: &'a str,
    tag: &str,
) -> Result<Option<(&'a str, &'a str)>, KestrelError> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let Some(start) = input.find(&open) else {
        return Ok(None);
    };
    let body_start = start + open.len();

    let mut depth = 1usize;
    let mut cursor = body_start;
    loop {
        let rest = &input[cursor..];
        let next_close = rest
            .find(&close)
            .ok_or_else(|| KestrelError::Parse(format!("unclosed <{tag}> element")))?;
        match rest.find(&open) {
            Some(next_open) if next_open < next_close => {
                depth += 1;
                cursor += next_open + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let body = &input[body_start..cursor + next_close];
                    let after = &input[cursor + next_close + close.len()..];
                    return Ok(Some((body.trim(), after)));
                }
                cursor += next_close + close.len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FileReview> {
        vec![
            FileReview {
                filename: "src/parser.rs".into(),
                reviews: vec![
                    ReviewFinding {
                        kind: "syntax".into(),
                        suggestion: "handle the empty-input case".into(),
                    },
                    ReviewFinding {
                        kind: "style".into(),
                        suggestion: "rename `tmp` to something meaningful".into(),
                    },
                ],
            },
            FileReview {
                filename: "src/lib.rs".into(),
                reviews: vec![],
            },
        ]
    }

    #[test]
    fn writes_declaration_and_root() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<reviews>\n"));
        assert!(xml.ends_with("</reviews>\n"));
    }

    #[test]
    fn preserves_file_order() {
        let xml = to_xml(&sample()).unwrap();
        let first = xml.find("src/parser.rs").unwrap();
        let second = xml.find("src/lib.rs").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_input_yields_empty_root() {
        let xml = to_xml(&[]).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<reviews>\n</reviews>\n"
        );
        assert!(from_xml(&xml).unwrap().is_empty());
    }

    #[test]
    fn round_trips() {
        let original = sample();
        let xml = to_xml(&original).unwrap();
        let parsed = from_xml(&xml).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].filename, "src/parser.rs");
        assert_eq!(parsed[0].reviews.len(), 2);
        assert_eq!(parsed[0].reviews[1].suggestion, "rename `tmp` to something meaningful");
        assert_eq!(parsed[1].filename, "src/lib.rs");
        assert!(parsed[1].reviews.is_empty());
    }

    #[test]
    fn single_file_with_findings_round_trips() {
        // The nested per-file <reviews> must not terminate the root block.
        let files = vec![FileReview {
            filename: "src/one.rs".into(),
            reviews: vec![ReviewFinding {
                kind: "syntax".into(),
                suggestion: "check the index bound".into(),
            }],
        }];
        let xml = to_xml(&files).unwrap();
        let parsed = from_xml(&xml).unwrap();
        assert_eq!(parsed, files);
    }

    #[test]
    fn escapes_markup_in_suggestions() {
        let files = vec![FileReview {
            filename: "a & b.rs".into(),
            reviews: vec![ReviewFinding {
                kind: "syntax".into(),
                suggestion: "use `Vec<u8>` instead of \"raw\" bytes".into(),
            }],
        }];
        let xml = to_xml(&files).unwrap();
        assert!(xml.contains("a &amp; b.rs"));
        assert!(xml.contains("Vec&lt;u8&gt;"));
        assert!(xml.contains("&quot;raw&quot;"));

        let parsed = from_xml(&xml).unwrap();
        assert_eq!(parsed[0].filename, "a & b.rs");
        assert_eq!(parsed[0].reviews[0].suggestion, "use `Vec<u8>` instead of \"raw\" bytes");
    }

    #[test]
    fn control_characters_are_rejected() {
        let files = vec![FileReview {
            filename: "ok.rs".into(),
            reviews: vec![ReviewFinding {
                kind: "syntax".into(),
                suggestion: "bad \u{0001} byte".into(),
            }],
        }];
        let err = to_xml(&files).unwrap_err();
        assert!(matches!(err, KestrelError::Serialization(_)));
    }

    #[test]
    fn tab_and_newline_survive() {
        let files = vec![FileReview {
            filename: "ok.rs".into(),
            reviews: vec![ReviewFinding {
                kind: "style".into(),
                suggestion: "line one\nline two".into(),
            }],
        }];
        let xml = to_xml(&files).unwrap();
        let parsed = from_xml(&xml).unwrap();
        assert_eq!(parsed[0].reviews[0].suggestion, "line one\nline two");
    }

    #[test]
    fn review_tag_does_not_match_reviews() {
        let xml = to_xml(&sample()).unwrap();
        let parsed = from_xml(&xml).unwrap();
        // Two findings in the first file, not one mangled block.
        assert_eq!(parsed[0].reviews.len(), 2);
    }

    #[test]
    fn missing_root_is_parse_error() {
        let err = from_xml("<file></file>").unwrap_err();
        assert!(matches!(err, KestrelError::Parse(_)));
    }

    #[test]
    fn unclosed_element_is_parse_error() {
        let err = from_xml("<reviews><file><filename>a.rs</file></reviews>").unwrap_err();
        assert!(matches!(err, KestrelError::Parse(_)));
    }
}
