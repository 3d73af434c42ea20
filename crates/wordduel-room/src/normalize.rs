//! Canonicalization of guesses and secrets before comparison.

/// Reduces a guess or secret to its canonical comparable form:
/// lowercase, with everything but ASCII letters and digits stripped.
///
/// Secrets are stored verbatim and only normalized here, at comparison
/// time — the same function is applied to both sides of the equality
/// check, so `"Ban-Ana "` and `"banana"` compare equal. Idempotent.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
