//! Accept/reject decision for raw candidates.
//!
//! Pure function: the ledger and working-batch lookups happen in the loop
//! and arrive here as booleans. The five conditions are independent; their
//! order only fixes which rejection gets logged when several apply.

use crate::config::ExclusionSet;

use super::types::Candidate;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Title or URL is empty.
    EmptyField,
    /// URL does not start with an accepted scheme prefix.
    BadScheme,
    /// URL matched a configured exclusion substring.
    Excluded(String),
    /// URL is already in the keyword's ledger entry.
    AlreadySeen,
    /// URL already appeared in the current working batch.
    DuplicateInPage,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField => f.write_str("empty title or url"),
            Self::BadScheme => f.write_str("unsupported url scheme"),
            Self::Excluded(substring) => write!(f, "url matches exclusion '{substring}'"),
            Self::AlreadySeen => f.write_str("url already recorded for keyword"),
            Self::DuplicateInPage => f.write_str("duplicate url in working batch"),
        }
    }
}

/// Evaluate one candidate against the filter stages.
pub fn evaluate(
    candidate: &Candidate,
    exclusions: &ExclusionSet,
    already_seen: bool,
    in_working_batch: bool,
) -> Result<(), Rejection> {
    if candidate.title.trim().is_empty() || candidate.url.is_empty() {
        return Err(Rejection::EmptyField);
    }
    if !candidate.url.starts_with("http://") && !candidate.url.starts_with("https://") {
        return Err(Rejection::BadScheme);
    }
    if let Some(substring) = exclusions.matches(&candidate.url) {
        return Err(Rejection::Excluded(substring.to_string()));
    }
    if already_seen {
        return Err(Rejection::AlreadySeen);
    }
    if in_working_batch {
        return Err(Rejection::DuplicateInPage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exclusions(entries: &[&str]) -> ExclusionSet {
        ExclusionSet::from_substrings(entries.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn accepts_a_clean_candidate() {
        let candidate = Candidate::new("Rust safety", "https://example.com/post");
        assert_eq!(
            evaluate(&candidate, &ExclusionSet::default(), false, false),
            Ok(())
        );
    }

    #[test]
    fn rejects_empty_title_and_empty_url() {
        let no_title = Candidate::new("   ", "https://example.com");
        let no_url = Candidate::new("Title", "");
        let empty = ExclusionSet::default();
        assert_eq!(
            evaluate(&no_title, &empty, false, false),
            Err(Rejection::EmptyField)
        );
        assert_eq!(
            evaluate(&no_url, &empty, false, false),
            Err(Rejection::EmptyField)
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        let candidate = Candidate::new("FTP mirror", "ftp://mirror.example.com/file");
        assert_eq!(
            evaluate(&candidate, &ExclusionSet::default(), false, false),
            Err(Rejection::BadScheme)
        );
    }

    #[test]
    fn exclusion_match_is_case_insensitive() {
        let candidate = Candidate::new("Cached copy", "https://WebCache.example.com/x");
        let result = evaluate(&candidate, &exclusions(&["webcache"]), false, false);
        assert_eq!(result, Err(Rejection::Excluded("webcache".to_string())));
    }

    #[test]
    fn excluded_candidate_is_rejected_even_when_novel() {
        // exclusion fires before the seen check; novelty does not save it
        let candidate = Candidate::new("Novel but excluded", "https://spam.example.com/a");
        let result = evaluate(&candidate, &exclusions(&["spam.example.com"]), false, false);
        assert!(matches!(result, Err(Rejection::Excluded(_))));
    }

    #[test]
    fn seen_candidate_is_rejected_even_when_not_excluded() {
        let candidate = Candidate::new("Seen before", "https://example.com/old");
        assert_eq!(
            evaluate(&candidate, &ExclusionSet::default(), true, false),
            Err(Rejection::AlreadySeen)
        );
    }

    #[test]
    fn rejects_duplicates_within_the_working_batch() {
        let candidate = Candidate::new("Dup", "https://example.com/twice");
        assert_eq!(
            evaluate(&candidate, &ExclusionSet::default(), false, true),
            Err(Rejection::DuplicateInPage)
        );
    }
}
