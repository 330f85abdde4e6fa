//! Redirect-safety resolver.
//!
//! Post-login destinations arrive from the browser (`?next=...`) and are
//! carried across the CAS round trip in the session. Before one is used as a
//! `Location`, it is reduced to a same-origin path here.

use url::Url;

/// Placeholder origin used to resolve candidates. Never leaves this module.
const RESOLUTION_ORIGIN: &str = "http://casbridge.invalid";

/// Reduces `candidate` to a path on this application.
///
/// Scheme and authority are stripped, so `https://evil.example/x` becomes
/// `/x`. Relative paths resolve against `fallback`. Leading slashes are
/// collapsed, so the result can never be read as a protocol-relative URL.
/// Empty candidates, and candidates that pointed at another host's root,
/// yield `fallback`.
///
/// The returned value always starts with exactly one `/`.
#[must_use]
pub fn sanitize_next_path(candidate: &str, fallback: &str) -> String {
    let fallback = normalize_path(fallback);
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return fallback;
    }

    let Ok(base) = Url::parse(RESOLUTION_ORIGIN).and_then(|origin| origin.join(&fallback)) else {
        return "/".to_string();
    };
    let Ok(resolved) = base.join(candidate) else {
        return fallback;
    };

    let foreign = resolved.host_str() != base.host_str() || resolved.cannot_be_a_base();
    let mut path = normalize_path(resolved.path());
    if foreign && path == "/" && resolved.query().is_none() {
        return fallback;
    }

    if let Some(query) = resolved.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    path
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches(['/', '\\']);
    format!("/{trimmed}")
}
