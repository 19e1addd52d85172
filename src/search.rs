use crate::error::ApiError;

/// sanitize
///
/// Trims the raw query, drops every character outside `[A-Za-z0-9 ]` and lowercases
/// the rest. The result never contains SQL `LIKE` wildcards.
pub fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase()
}

/// search_term
///
/// Resolves the `q` parameter into the term used by the substring predicate.
/// A missing query, or one that sanitizes down to nothing, is a 400.
pub fn search_term(q: Option<&str>) -> Result<String, ApiError> {
    let term = sanitize(q.unwrap_or_default());
    if term.trim().is_empty() {
        return Err(ApiError::Validation("Please enter a keyword".to_string()));
    }
    Ok(term)
}

/// Case-insensitive `ILIKE` pattern for a sanitized term.
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

/// In-process equivalent of `haystack ILIKE like_pattern(term)`.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}
