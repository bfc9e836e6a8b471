//! Query-name handling.
//!
//! Grants are keyed by dot-prefixed suffixes (`.example.com`) so that a
//! grant on a parent domain covers every name beneath it, and by the bare
//! name for exact matches.

/// Normalize a queried name: strip one trailing root dot and lowercase.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

/// Dot-prefixed suffixes of `name`, shortest first.
///
/// `a.b.example.com` yields `.com`, `.example.com`, `.b.example.com`,
/// `.a.b.example.com`. Empty labels produce nothing.
#[must_use]
pub fn suffixes(name: &str) -> Vec<String> {
    if name.is_empty() {
        return Vec::new();
    }

    let labels: Vec<&str> = name.split('.').collect();
    let mut out = Vec::with_capacity(labels.len());
    for start in (0..labels.len()).rev() {
        if labels[start].is_empty() {
            continue;
        }
        out.push(format!(".{}", labels[start..].join(".")));
    }
    out
}
