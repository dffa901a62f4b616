use kestrel_core::KestrelError;

/// Parsed ranges from a `@@ -a,b +c,d @@` hunk header.
///
/// # Examples
///
/// ```
/// use kestrel_diff::mapper::parse_hunk_header;
///
/// let header = parse_hunk_header("@@ -12,5 +14,6 @@ def func1():").unwrap();
/// assert_eq!(header.old_start, 12);
/// assert_eq!(header.new_start, 14);
/// assert_eq!(header.new_lines, 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    /// Starting line in the old version.
    pub old_start: u32,
    /// Number of lines in the old version.
    pub old_lines: u32,
    /// Starting line in the new version.
    pub new_start: u32,
    /// Number of lines in the new version.
    pub new_lines: u32,
}

/// Parse a unified-diff hunk header line.
///
/// Accepts the optional-count form (`@@ -a +c @@`, count defaults to 1) and
/// trailing section text after the closing `@@`.
///
/// # Errors
///
/// Returns [`KestrelError::Parse`] if the line is not a well-formed header.
pub fn parse_hunk_header(line: &str) -> Result<HunkHeader, KestrelError> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| KestrelError::Parse(format!("invalid hunk header: {line}")))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 {
        return Err(KestrelError::Parse(format!("invalid hunk header: {line}")));
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| KestrelError::Parse(format!("invalid old range in hunk: {line}")))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| KestrelError::Parse(format!("invalid new range in hunk: {line}")))?;

    let (old_start, old_lines) = parse_range(old, line)?;
    let (new_start, new_lines) = parse_range(new, line)?;

    Ok(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32), KestrelError> {
    if let Some((start, count)) = range.split_once(',') {
        let s = start
            .parse()
            .map_err(|_| KestrelError::Parse(format!("invalid range number in: {context}")))?;
        let c = count
            .parse()
            .map_err(|_| KestrelError::Parse(format!("invalid range count in: {context}")))?;
        Ok((s, c))
    } else {
        let s = range
            .parse()
            .map_err(|_| KestrelError::Parse(format!("invalid range number in: {context}")))?;
        Ok((s, 1))
    }
}

/// Prefix every added or context line of a unified diff with its new-file
/// line number.
///
/// Removed lines (starting with `-`) are dropped. Hunk headers are kept
/// verbatim and reset the running counter to the header's new-file start.
/// The single leading diff marker (`+` or space) is stripped before
/// numbering, so the numbered line shows the new file's content. Anything
/// before the first hunk header (a `## filename` preamble from the patch
/// strategies, or `---`/`+++` file headers) passes through unchanged.
///
/// # Errors
///
/// Returns [`KestrelError::Parse`] if a hunk header cannot be parsed; the
/// mapper never continues past a bad header with a stale counter.
///
/// # Examples
///
/// ```
/// use kestrel_diff::mapper::assign_line_numbers;
///
/// let diff = "@@ -1,3 +1,3 @@\n a\n-b\n+c\n d";
/// let numbered = assign_line_numbers(diff).unwrap();
/// assert_eq!(numbered, "@@ -1,3 +1,3 @@\n1: a\n2: c\n3: d");
/// ```
pub fn assign_line_numbers(diff: &str) -> Result<String, KestrelError> {
    let mut numbered: Vec<String> = Vec::new();
    let mut counter: u32 = 0;
    let mut in_hunk = false;

    for line in diff.lines() {
        if line.starts_with("@@") {
            let header = parse_hunk_header(line)?;
            counter = header.new_start;
            in_hunk = true;
            numbered.push(line.to_string());
        } else if !in_hunk {
            numbered.push(line.to_string());
        } else if line.starts_with('-') {
            // Removed line, not present in the new file.
        } else {
            let content = line
                .strip_prefix('+')
                .or_else(|| line.strip_prefix(' '))
                .unwrap_or(line);
            numbered.push(format!("{counter}: {content}"));
            counter += 1;
        }
    }

    Ok(numbered.join("\n"))
}
