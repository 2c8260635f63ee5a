//! Identifier cleaning for PMC cross-reference IDs.
//!
//! Sanitized IDs are the join key between the PubMed pass and the PMC
//! enrichment pass, so every pmcid goes through [`sanitize_pmcid`] before it
//! is stored, compared, or placed in a URL.

/// Strip the case-insensitive `PMC` prefix from an identifier.
///
/// The result never starts with the prefix in any casing, which makes the
/// operation idempotent. Non-prefixed input passes through unchanged apart
/// from whitespace trimming.
///
/// # Examples
///
/// ```
/// use eutils_proxy::ids::sanitize_pmcid;
///
/// assert_eq!(sanitize_pmcid("PMC7906746"), "7906746");
/// assert_eq!(sanitize_pmcid("pmc7906746"), "7906746");
/// assert_eq!(sanitize_pmcid("7906746"), "7906746");
/// ```
pub fn sanitize_pmcid(raw: &str) -> String {
    let mut id = raw.trim();
    while id.len() >= 3 && id[..3].eq_ignore_ascii_case("PMC") {
        id = &id[3..];
    }
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prefix() {
        assert_eq!(sanitize_pmcid("PMC9999"), "9999");
        assert_eq!(sanitize_pmcid("pmc9999"), "9999");
        assert_eq!(sanitize_pmcid("Pmc9999"), "9999");
    }

    #[test]
    fn test_passthrough_without_prefix() {
        assert_eq!(sanitize_pmcid("9999"), "9999");
        assert_eq!(sanitize_pmcid(""), "");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_pmcid("  PMC9999  "), "9999");
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_pmcid("PMC7906746");
        let twice = sanitize_pmcid(&once);
        assert_eq!(once, twice);
        assert!(!twice.to_ascii_lowercase().starts_with("pmc"));
    }

    #[test]
    fn test_never_leaves_prefix() {
        for input in ["PMCPMC123", "pmcPMC123", "PMCpmc123"] {
            let cleaned = sanitize_pmcid(input);
            assert!(!cleaned.to_ascii_lowercase().starts_with("pmc"), "{input} -> {cleaned}");
        }
    }
}
