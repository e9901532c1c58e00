use std::{collections::BTreeSet, path::Path};

use miette::{Context, IntoDiagnostic};
use regex::Regex;

use crate::{result::Result, types::Extension};

/// Characters that are not allowed in a file name on at least one platform
const FORBIDDEN_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replace every forbidden character by `_` and trim the surrounding whitespace
pub fn sanitize_filename(name: &str) -> String {
    name.replace(FORBIDDEN_CHARS, "_").trim().to_owned()
}

/// Find a file name in `out_dir` that no file uses yet.
///
/// Format for 1st file: `<base>.<ext>`.
/// Format for the next ones: `<base>_<n>.<ext>`, with the smallest `n >= 1`
/// not already present in the directory.
///
/// Nothing is created: calling this twice without writing the file gives
/// the same name twice.
pub fn unique_filename(out_dir: &Path, base: &str, extension: Extension) -> Result<String> {
    let first = format!("{base}.{extension}");
    if !out_dir.join(&first).exists() {
        return Ok(first);
    }

    let pattern = Regex::new(&format!(
        r"^{}_(\d+)\.{}$",
        regex::escape(base),
        regex::escape(extension.as_str())
    ))
    .into_diagnostic()?;

    let mut taken = BTreeSet::new();
    for entry in out_dir
        .read_dir()
        .into_diagnostic()
        .wrap_err("Could not read output directory")?
    {
        let entry = entry.into_diagnostic()?;
        let name = entry.file_name();
        let Some(cap) = name.to_str().and_then(|name| pattern.captures(name)) else {
            continue;
        };

        // Numbers too large for u64 can never collide with the first free one
        if let Ok(n) = cap[1].parse::<u64>() {
            taken.insert(n);
        }
    }

    let n = (1u64..)
        .find(|n| !taken.contains(n))
        .unwrap_or(u64::MAX);
    Ok(format!("{base}_{n}.{extension}"))
}
