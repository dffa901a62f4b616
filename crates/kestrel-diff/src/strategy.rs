use std::fmt::Write;

use kestrel_core::{KestrelError, PrFile};

use crate::mapper::{parse_hunk_header, HunkHeader};

/// One hunk of a stored patch: its parsed header and its body lines.
struct PatchHunk {
    header: HunkHeader,
    /// Newline-terminated `+`/`-`/` ` lines, kept verbatim.
    body: String,
}

fn parse_patch_hunks(patch: &str) -> Result<Vec<PatchHunk>, KestrelError> {
    let mut hunks: Vec<PatchHunk> = Vec::new();

    for line in patch.lines() {
        if line.starts_with("@@") {
            hunks.push(PatchHunk {
                header: parse_hunk_header(line)?,
                body: String::new(),
            });
        } else if let Some(hunk) = hunks.last_mut() {
            if line.starts_with('+')
                || line.starts_with('-')
                || line.starts_with(' ')
                || line.starts_with('\\')
            {
                hunk.body.push_str(line);
                hunk.body.push('\n');
            }
        }
    }

    Ok(hunks)
}

/// Render the stored patch verbatim under a `## {filename}` header.
///
/// Used when the original file contents are unavailable (new files, or
/// callers that only have the diff).
///
/// # Examples
///
/// ```
/// use kestrel_core::PrFile;
/// use kestrel_diff::strategy::raw_patch;
///
/// let file = PrFile {
///     filename: "src/new.rs".into(),
///     patch: "@@ -0,0 +1,1 @@\n+fn main() {}".into(),
///     old_contents: None,
///     new_contents: None,
/// };
/// let rendered = raw_patch(&file);
/// assert!(rendered.starts_with("## src/new.rs\n\n@@"));
/// ```
pub fn raw_patch(file: &PrFile) -> String {
    format!("## {}\n\n{}", file.filename, file.patch)
}

/// Choose and apply the patch-rendering strategy for one file.
///
/// Selection is a pure function of `old_contents`: absent means the raw
/// strategy, present means the context-expanded strategy with
/// `context_lines` unchanged lines interleaved around each hunk. Both
/// renderings start with a `## {filename}` header and keep the hunk-header
/// format the line mapper expects.
///
/// # Errors
///
/// Returns [`KestrelError::Parse`] if the stored patch has a malformed
/// hunk header.
///
/// # Examples
///
/// ```
/// use kestrel_core::PrFile;
/// use kestrel_diff::strategy::render_patch;
///
/// let file = PrFile {
///     filename: "a.rs".into(),
///     patch: "@@ -1,1 +1,1 @@\n-x\n+y".into(),
///     old_contents: None,
///     new_contents: None,
/// };
/// // No original contents: the raw strategy is used.
/// assert_eq!(render_patch(&file, 3).unwrap(), "## a.rs\n\n@@ -1,1 +1,1 @@\n-x\n+y");
/// ```
pub fn render_patch(file: &PrFile, context_lines: usize) -> Result<String, KestrelError> {
    if file.old_contents.is_none() {
        Ok(raw_patch(file))
    } else {
        expanded_patch(file, context_lines)
    }
}

/// Render the patch with surrounding unchanged lines interleaved.
///
/// Context comes from `new_contents` when present (new-file coordinates),
/// falling back to `old_contents` (old-file coordinates); the lines in the
/// expansion window are unchanged, so both sources carry the same text.
/// Windows are clamped to the file bounds and to the previous hunk's
/// expanded end, so no source line is emitted twice. Hunk headers are
/// recomputed to cover the widened ranges.
fn expanded_patch(file: &PrFile, context_lines: usize) -> Result<String, KestrelError> {
    let (source, use_new) = match (&file.new_contents, &file.old_contents) {
        (Some(contents), _) => (contents.as_str(), true),
        (None, Some(contents)) => (contents.as_str(), false),
        (None, None) => return Ok(raw_patch(file)),
    };
    let source_lines: Vec<&str> = source.lines().collect();
    let hunks = parse_patch_hunks(&file.patch)?;

    let mut out = format!("## {}\n\n", file.filename);
    let mut last_emitted: usize = 0;

    for (i, hunk) in hunks.iter().enumerate() {
        let h = hunk.header;
        let (start, len) = if use_new {
            (h.new_start as usize, h.new_lines as usize)
        } else {
            (h.old_start as usize, h.old_lines as usize)
        };
        let start = start.max(1);
        // A zero-length range names the line before the change and covers
        // no lines on this side, so its window wraps an empty span.
        let (first, end) = if len == 0 {
            (start + 1, start)
        } else {
            (start, start + len - 1)
        };

        let lead_start = first
            .saturating_sub(context_lines)
            .max(last_emitted + 1)
            .max(1);
        let lead = first.saturating_sub(lead_start);

        let mut trail_end = (end + context_lines).min(source_lines.len());
        if let Some(next) = hunks.get(i + 1) {
            let (next_start, next_len) = if use_new {
                (next.header.new_start as usize, next.header.new_lines as usize)
            } else {
                (next.header.old_start as usize, next.header.old_lines as usize)
            };
            let next_first = if next_len == 0 {
                next_start + 1
            } else {
                next_start
            };
            trail_end = trail_end.min(next_first.saturating_sub(1));
        }
        let trail = trail_end.saturating_sub(end);

        let (old_start, old_count) =
            widened_range(h.old_start as usize, h.old_lines as usize, lead, trail);
        let (new_start, new_count) =
            widened_range(h.new_start as usize, h.new_lines as usize, lead, trail);
        let _ = writeln!(out, "@@ -{old_start},{old_count} +{new_start},{new_count} @@");

        for idx in lead_start..first {
            if let Some(text) = source_lines.get(idx - 1) {
                let _ = writeln!(out, " {text}");
            }
        }
        out.push_str(&hunk.body);
        for idx in (end + 1)..=trail_end {
            if let Some(text) = source_lines.get(idx - 1) {
                let _ = writeln!(out, " {text}");
            }
        }

        last_emitted = trail_end.max(end);
    }

    Ok(out)
}

/// Widen a `start,count` hunk range by `lead` and `trail` context lines.
///
/// A zero-count range starts at the line before the change, so its first
/// covered line is `start + 1`; a widened range that stays empty keeps the
/// zero-count convention unchanged.
fn widened_range(start: usize, count: usize, lead: usize, trail: usize) -> (usize, usize) {
    let first = if count == 0 { start + 1 } else { start };
    let widened = count + lead + trail;
    if widened == 0 {
        (start.max(1), 0)
    } else {
        (first.saturating_sub(lead).max(1), widened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::assign_line_numbers;

    fn numbered_file(count: usize) -> String {
        (1..=count)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn file_with_contents(patch: &str, contents: &str) -> PrFile {
        PrFile {
            filename: "src/app.py".into(),
            patch: patch.into(),
            old_contents: Some(contents.into()),
            new_contents: Some(contents.into()),
        }
    }

    #[test]
    fn missing_old_contents_selects_raw() {
        let file = PrFile {
            filename: "fresh.py".into(),
            patch: "@@ -0,0 +1,2 @@\n+a\n+b".into(),
            old_contents: None,
            new_contents: Some("a\nb".into()),
        };
        let rendered = render_patch(&file, 3).unwrap();
        assert_eq!(rendered, "## fresh.py\n\n@@ -0,0 +1,2 @@\n+a\n+b");
    }

    #[test]
    fn present_old_contents_selects_expansion() {
        let contents = numbered_file(10);
        let file = file_with_contents("@@ -5,1 +5,1 @@\n-line5\n+LINE5", &contents);
        let rendered = render_patch(&file, 2).unwrap();
        // line3/line4 before and line6/line7 after come from the full contents,
        // not from the stored patch.
        assert!(rendered.contains(" line3\n line4\n-line5\n+LINE5\n line6\n line7\n"));
    }

    #[test]
    fn expanded_header_covers_widened_range() {
        let contents = numbered_file(10);
        let file = file_with_contents("@@ -4,2 +4,2 @@\n-line4\n+LINE4\n line5", &contents);
        let rendered = render_patch(&file, 2).unwrap();
        assert!(rendered.contains("@@ -2,6 +2,6 @@\n"));
    }

    #[test]
    fn expansion_clamped_at_file_start() {
        let contents = numbered_file(5);
        let file = file_with_contents("@@ -1,1 +1,1 @@\n-line1\n+LINE1", &contents);
        let rendered = render_patch(&file, 3).unwrap();
        assert!(rendered.contains("@@ -1,"));
        assert!(!rendered.contains("line0"));
    }

    #[test]
    fn expansion_clamped_at_file_end() {
        let contents = numbered_file(5);
        let file = file_with_contents("@@ -5,1 +5,1 @@\n-line5\n+LINE5", &contents);
        let rendered = render_patch(&file, 3).unwrap();
        assert!(rendered.contains(" line4\n-line5\n+LINE5\n"));
        assert!(!rendered.contains("line6"));
    }

    #[test]
    fn deletion_hunk_keeps_surrounding_context() {
        let contents = numbered_file(8);
        // `+4,0` names the line before the deletion; line4 itself is
        // unchanged and belongs to the leading context.
        let file = file_with_contents("@@ -5,2 +4,0 @@\n-old5\n-old6", &contents);
        let rendered = render_patch(&file, 2).unwrap();
        assert!(
            rendered.contains(" line3\n line4\n-old5\n-old6\n line5\n line6\n"),
            "context around the deletion is wrong:\n{rendered}"
        );
    }

    #[test]
    fn deletion_hunk_stays_mapper_compatible() {
        let contents = numbered_file(8);
        let file = file_with_contents("@@ -5,2 +4,0 @@\n-old5\n-old6", &contents);
        let rendered = render_patch(&file, 2).unwrap();
        assert!(rendered.contains("@@ -3,6 +3,4 @@\n"));
        let numbered = assign_line_numbers(&rendered).unwrap();
        assert!(numbered.contains("4: line4"));
        assert!(numbered.contains("5: line5"));
    }

    #[test]
    fn adjacent_hunks_do_not_duplicate_lines() {
        let contents = numbered_file(12);
        let patch = "@@ -3,1 +3,1 @@\n-line3\n+LINE3\n@@ -6,1 +6,1 @@\n-line6\n+LINE6";
        let file = file_with_contents(patch, &contents);
        let rendered = render_patch(&file, 4).unwrap();
        for i in 1..=12 {
            let needle = format!(" line{i}\n");
            assert!(
                rendered.matches(&needle).count() <= 1,
                "line{i} emitted more than once:\n{rendered}"
            );
        }
    }

    #[test]
    fn expanded_output_is_mapper_compatible() {
        let contents = numbered_file(10);
        let file = file_with_contents("@@ -5,1 +5,1 @@\n-line5\n+LINE5", &contents);
        let rendered = render_patch(&file, 2).unwrap();
        let numbered = assign_line_numbers(&rendered).unwrap();
        assert!(numbered.contains("3: line3"));
        assert!(numbered.contains("5: LINE5"));
        assert!(numbered.contains("7: line7"));
    }

    #[test]
    fn malformed_patch_header_is_fatal() {
        let contents = numbered_file(5);
        let file = file_with_contents("@@ -bad +worse @@\n+x", &contents);
        assert!(render_patch(&file, 2).is_err());
    }
}
