//! Archive entry names derived from link URLs.

use std::collections::HashSet;

/// Entry name used when a link has no usable final path segment.
pub const DEFAULT_ENTRY_NAME: &str = "file.bin";

/// Extracts the last path segment from a URL (percent-decoding is not applied).
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
fn last_path_segment(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Makes a candidate safe as a flat archive entry name.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Trims leading/trailing spaces, dots, and underscores
/// - Limits length to 255 bytes
fn sanitize(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.' || c == '_');

    let mut take = trimmed.len().min(NAME_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

/// Entry name for `link`: sanitized final path segment, or `file.bin`.
pub fn entry_name_for(link: &str) -> String {
    match last_path_segment(link).map(|s| sanitize(&s)) {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_ENTRY_NAME.to_string(),
    }
}

/// Tracks names already written into one archive and hands out unique ones.
///
/// Collisions get an index before the extension: `a.pdf`, `a (1).pdf`, `a (2).pdf`.
#[derive(Debug, Default)]
pub struct EntryNames {
    used: HashSet<String>,
}

impl EntryNames {
    /// First free variant of `base`. Does not reserve it; call `reserve` once written.
    pub fn unique(&self, base: &str) -> String {
        if !self.used.contains(base) {
            return base.to_string();
        }
        let (stem, ext) = match base.rfind('.') {
            Some(dot) if dot > 0 => base.split_at(dot),
            _ => (base, ""),
        };
        (1..)
            .map(|n| format!("{stem} ({n}){ext}"))
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn reserve(&mut self, name: String) {
        self.used.insert(name);
    }
}
