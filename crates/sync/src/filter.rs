//! Category selection.

use monsync_discovery::{parse_comma_list, CanonicalArtifact};

/// Category that selects every artifact.
pub const WILDCARD: &str = "*";

/// Keeps artifacts whose category tags intersect the configured set.
///
/// Matching ignores ASCII case. An empty set keeps nothing; `*` keeps everything.
///
/// ```
/// use monsync_sync::CategoryFilter;
///
/// let filter = CategoryFilter::parse("Websites, Databases");
/// assert!(filter.matches(["websites"]));
/// assert!(!filter.matches(["Infrastructure"]));
/// assert!(CategoryFilter::parse("*").matches(["anything"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    selected: Vec<String>,
    wildcard: bool,
}

impl CategoryFilter {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<String> = Vec::new();
        let mut wildcard = false;
        for category in categories {
            let category = category.as_ref().trim();
            if category == WILDCARD {
                wildcard = true;
            } else if !category.is_empty()
                && !selected.iter().any(|s| s.eq_ignore_ascii_case(category))
            {
                selected.push(category.to_string());
            }
        }
        Self { selected, wildcard }
    }

    /// Builds a filter from a comma-separated list.
    pub fn parse(list: &str) -> Self {
        Self::new(parse_comma_list(list))
    }

    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.selected.is_empty()
    }

    pub fn matches<I, S>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.wildcard {
            return true;
        }
        tags.into_iter().any(|tag| {
            self.selected
                .iter()
                .any(|s| s.eq_ignore_ascii_case(tag.as_ref().trim()))
        })
    }

    pub fn keeps(&self, artifact: &CanonicalArtifact) -> bool {
        self.matches(&artifact.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_keeps_nothing() {
        let filter = CategoryFilter::parse("");
        assert!(filter.is_empty());
        assert!(!filter.matches(["Websites"]));
    }

    #[test]
    fn untagged_artifact_only_passes_wildcard() {
        let none: [&str; 0] = [];
        assert!(!CategoryFilter::parse("Websites").matches(none));
        assert!(CategoryFilter::parse("Websites,*").matches(none));
    }

    #[test]
    fn duplicate_and_blank_entries_collapse() {
        let filter = CategoryFilter::new(["Websites", " websites ", ""]);
        assert!(!filter.is_empty());
        assert!(filter.matches(["WEBSITES"]));
    }
}
