//! Link validation: file-extension allow-list.

/// Returns the lowercased extension (with leading dot) of the last path segment of `link`.
///
/// Absolute URLs are parsed so query and fragment never leak into the extension;
/// anything else falls back to the raw string with `?`/`#` suffixes stripped.
///
/// - `extension_of("http://x/a/Report.PDF?dl=1")` → `Some(".pdf")`
/// - `extension_of("http://x/readme")` → `None`
pub fn extension_of(link: &str) -> Option<String> {
    let path = match url::Url::parse(link) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let dot = segment.rfind('.')?;
    let ext = &segment[dot..];
    if dot == 0 || ext.len() < 2 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Case-insensitive set of permitted extensions, kept in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions {
    exts: Vec<String>,
}

impl AllowedExtensions {
    /// Normalizes each entry to lowercase with a leading dot; drops blanks and duplicates.
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for e in exts {
            let e = e.as_ref().trim().trim_start_matches('.');
            if e.is_empty() {
                continue;
            }
            let norm = format!(".{}", e.to_ascii_lowercase());
            if !out.contains(&norm) {
                out.push(norm);
            }
        }
        Self { exts: out }
    }

    pub fn permits(&self, link: &str) -> bool {
        extension_of(link).is_some_and(|ext| self.exts.contains(&ext))
    }
}
