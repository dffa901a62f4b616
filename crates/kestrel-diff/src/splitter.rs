use kestrel_core::PrFile;

/// Split a whole `git diff` output into per-file [`PrFile`] entries.
///
/// Each entry's `patch` keeps only the hunk headers and hunk lines, matching
/// the per-file patch shape the GitHub API produces. Binary files are
/// skipped. File and index header lines (`diff --git`, `index`, `---`,
/// `+++`, mode changes) are consumed, not carried into the patch. The
/// splitter is lenient: malformed hunk headers are kept as-is and surface
/// later in the line mapper.
///
/// # Examples
///
/// ```
/// use kestrel_diff::splitter::split_unified_diff;
///
/// let diff = "\
/// diff --git a/src/lib.rs b/src/lib.rs
/// --- a/src/lib.rs
/// +++ b/src/lib.rs
/// @@ -1,1 +1,1 @@
/// -old
/// +new
/// ";
/// let files = split_unified_diff(diff);
/// assert_eq!(files.len(), 1);
/// assert_eq!(files[0].filename, "src/lib.rs");
/// assert!(files[0].patch.starts_with("@@ -1,1 +1,1 @@"));
/// ```
pub fn split_unified_diff(input: &str) -> Vec<PrFile> {
    let mut files: Vec<PrFile> = Vec::new();
    let mut current: Option<PrFile> = None;
    let mut is_binary = false;
    let mut is_deleted = false;

    let mut flush = |current: &mut Option<PrFile>, files: &mut Vec<PrFile>, binary: bool| {
        if let Some(file) = current.take() {
            if !binary && !file.patch.is_empty() {
                files.push(file);
            }
        }
    };

    for line in input.lines() {
        if line.starts_with("diff --git ") {
            flush(&mut current, &mut files, is_binary);
            is_binary = false;
            is_deleted = false;
            current = Some(empty_file());
            continue;
        }

        // Standard patches may lack the "diff --git" command line.
        if line.starts_with("--- ") && current.is_none() {
            current = Some(empty_file());
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            is_binary = true;
            continue;
        }

        if line.starts_with("deleted file mode") {
            is_deleted = true;
            continue;
        }

        if line.starts_with("new file mode")
            || line.starts_with("rename from ")
            || line.starts_with("rename to ")
            || line.starts_with("index ")
            || line.starts_with("similarity index")
        {
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if file.filename.is_empty() || is_deleted {
                file.filename = parse_path(path);
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            if path != "/dev/null" {
                file.filename = parse_path(path);
            }
            continue;
        }

        if line.starts_with("@@")
            || line.starts_with('+')
            || line.starts_with('-')
            || line.starts_with(' ')
            || line.starts_with('\\')
        {
            if !file.patch.is_empty() {
                file.patch.push('\n');
            }
            file.patch.push_str(line);
        }
    }

    flush(&mut current, &mut files, is_binary);
    files
}

fn empty_file() -> PrFile {
    PrFile {
        filename: String::new(),
        patch: String::new(),
        old_contents: None,
        new_contents: None,
    }
}

fn parse_path(raw: &str) -> String {
    let normalized = raw.trim_matches('"');
    normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized)
        .to_string()
}
