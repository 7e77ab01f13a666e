// ABOUTME: Static prefix allow-list, the sole authorization gate on reads
// ABOUTME: Matching is segment-bounded so "blog-evil" never matches "blog"

/// Allow-listed leading path segments for public reads. Loaded once at
/// startup and immutable for the process lifetime.
pub struct PrefixAllowList {
    prefixes: Vec<String>,
}

impl PrefixAllowList {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// Parse a comma-separated prefix list, ignoring empty entries and
    /// surrounding whitespace.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| p.trim_matches('/').to_string())
                .collect(),
        )
    }

    /// True iff the key lives under one of the allow-listed prefixes.
    ///
    /// A prefix matches on whole path segments only: `blog/x.png` and a
    /// bare `blog` match prefix `blog`, `blog-evil/x.png` does not.
    /// Side-effect-free; must run before any storage access on the read
    /// path, which is otherwise unauthenticated.
    pub fn is_allowed(&self, key: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            key == prefix
                || key
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PrefixAllowList {
        PrefixAllowList::from_csv("products,blog,nature,avatars,blog-content")
    }

    #[test]
    fn test_allows_listed_prefixes() {
        let policy = policy();
        assert!(policy.is_allowed("products/p1.jpg"));
        assert!(policy.is_allowed("blog/2024/cover.png"));
        assert!(policy.is_allowed("blog-content/inline.gif"));
        assert!(policy.is_allowed("avatars/u1.webp"));
    }

    #[test]
    fn test_rejects_unlisted_prefixes() {
        let policy = policy();
        assert!(!policy.is_allowed("secrets/config.json"));
        assert!(!policy.is_allowed("etc/passwd"));
        assert!(!policy.is_allowed(""));
    }

    #[test]
    fn test_prefix_match_is_segment_bounded() {
        let policy = policy();
        // "blog-evil" shares a string prefix with "blog" but is a
        // different top-level segment
        assert!(!policy.is_allowed("blog-evil/x.png"));
        assert!(!policy.is_allowed("productsx/y.jpg"));
        // a bare prefix with no trailing segment still matches
        assert!(policy.is_allowed("blog"));
    }

    #[test]
    fn test_csv_parsing_ignores_noise() {
        let policy = PrefixAllowList::from_csv(" blog , ,avatars/,");
        assert!(policy.is_allowed("blog/a.png"));
        assert!(policy.is_allowed("avatars/b.png"));
        assert!(!policy.is_allowed("products/c.png"));
    }
}
