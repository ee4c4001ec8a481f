//! Category counting and summary composition for a release-notes entry.
//!
//! Entries mark each item with a short heading (`<h3>Feature</h3>`,
//! `<h3>Changed</h3>`, `<h3>Fixed</h3>`). Counting `>feature<` and friends in
//! the lowercased body is a heuristic over the markup, not a parse of it;
//! anything unrecognised counts as zero.

/// Release-note categories, in the order they appear in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Feature,
    Changed,
    Fixed,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Feature, Category::Changed, Category::Fixed];

    /// Substring searched for in the lowercased body.
    pub fn marker(self) -> &'static str {
        match self {
            Category::Feature => ">feature<",
            Category::Changed => ">changed<",
            Category::Fixed => ">fixed<",
        }
    }

    /// Noun form for `count` items. Callers never pass 0.
    pub fn noun(self, count: usize) -> &'static str {
        match (self, count == 1) {
            (Category::Feature, true) => "feature",
            (Category::Feature, false) => "features",
            (Category::Changed, true) => "change",
            (Category::Changed, false) => "changes",
            (Category::Fixed, true) => "fix",
            (Category::Fixed, false) => "fixes",
        }
    }
}

/// Occurrence counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub features: usize,
    pub changes: usize,
    pub fixes: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Feature => self.features,
            Category::Changed => self.changes,
            Category::Fixed => self.fixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features == 0 && self.changes == 0 && self.fixes == 0
    }
}

pub fn classify(content: &str) -> CategoryCounts {
    let lower = content.to_lowercase();
    let count = |category: Category| lower.matches(category.marker()).count();

    CategoryCounts {
        features: count(Category::Feature),
        changes: count(Category::Changed),
        fixes: count(Category::Fixed),
    }
}

/// Builds the one-line summary, e.g. `"Cloud Run has 2 new features and 1 new fix"`.
///
/// Returns an empty string when every count is zero.
pub fn compose(subject: &str, counts: &CategoryCounts) -> String {
    let mut msg = String::new();

    for category in Category::ALL {
        let n = counts.get(category);
        if n == 0 {
            continue;
        }
        if msg.is_empty() {
            msg = format!("{} has {} new {}", subject, n, category.noun(n));
        } else {
            msg.push_str(&format!(" and {} new {}", n, category.noun(n)));
        }
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_two_features_one_fix() {
        let body = "<h3>Feature</h3><p>a</p><h3>Feature</h3><p>b</p><h3>Fixed</h3><p>c</p>";
        let counts = classify(body);
        assert_eq!(
            counts,
            CategoryCounts {
                features: 2,
                changes: 0,
                fixes: 1
            }
        );
        assert_eq!(
            compose("X", &counts),
            "X has 2 new features and 1 new fix"
        );
    }

    #[test]
    fn test_all_categories_in_fixed_order() {
        let body = "<b>FIXED</b><b>Changed</b><b>changed</b><b>Feature</b>";
        assert_eq!(
            compose("Cloud Run", &classify(body)),
            "Cloud Run has 1 new feature and 2 new changes and 1 new fix"
        );
    }

    #[test]
    fn test_first_present_category_starts_sentence() {
        let counts = CategoryCounts {
            features: 0,
            changes: 0,
            fixes: 3,
        };
        assert_eq!(compose("Cloud Run", &counts), "Cloud Run has 3 new fixes");

        let counts = CategoryCounts {
            features: 0,
            changes: 1,
            fixes: 1,
        };
        assert_eq!(
            compose("Cloud Run", &counts),
            "Cloud Run has 1 new change and 1 new fix"
        );
    }

    #[test]
    fn test_no_markers_composes_empty_message() {
        let counts = classify("<p>Documentation updates only.</p>");
        assert!(counts.is_empty());
        assert_eq!(compose("Cloud Run", &counts), "");
    }

    #[test]
    fn test_marker_needs_tag_boundaries() {
        // Prose mentioning a category is not a heading
        let counts = classify("<p>This feature was fixed and changed.</p>");
        assert!(counts.is_empty());
    }

    #[test]
    fn test_plural_boundary() {
        assert_eq!(Category::Feature.noun(1), "feature");
        assert_eq!(Category::Feature.noun(2), "features");
        assert_eq!(Category::Changed.noun(1), "change");
        assert_eq!(Category::Changed.noun(5), "changes");
        assert_eq!(Category::Fixed.noun(1), "fix");
        assert_eq!(Category::Fixed.noun(2), "fixes");
    }

    proptest! {
        #[test]
        fn classify_is_deterministic(body in ".{0,200}") {
            prop_assert_eq!(classify(&body), classify(&body));
        }

        #[test]
        fn classify_counts_repeated_markers(f in 0usize..6, c in 0usize..6, x in 0usize..6) {
            let body = format!(
                "{}{}{}",
                "<h3>Feature</h3>".repeat(f),
                "<h3>CHANGED</h3>".repeat(c),
                "<h3>fixed</h3>".repeat(x),
            );
            let counts = classify(&body);
            prop_assert_eq!(counts, CategoryCounts { features: f, changes: c, fixes: x });

            let msg = compose("S", &counts);
            prop_assert_eq!(msg.is_empty(), f + c + x == 0);
            prop_assert_eq!(msg.matches(" and ").count(), [f, c, x].iter().filter(|n| **n > 0).count().saturating_sub(1));
        }
    }
}
