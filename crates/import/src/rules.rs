use saldo_core::text::normalize;
use saldo_core::{CategoryRule, CategoryRuleset, FALLBACK_CATEGORY};

/// Keyword categorizer over a borrowed ruleset.
///
/// Matching is a substring test of each keyword against the normalized
/// description (lowercased, accents stripped). Rules are tried in ruleset
/// order and the first rule with any matching keyword wins; no rule means
/// [`FALLBACK_CATEGORY`].
pub struct CategoryMatcher<'a> {
    ruleset: &'a CategoryRuleset,
}

impl<'a> CategoryMatcher<'a> {
    pub fn new(ruleset: &'a CategoryRuleset) -> Self {
        Self { ruleset }
    }

    pub fn find_matching_rule(&self, description: &str) -> Option<&'a CategoryRule> {
        let text = normalize(description);
        self.ruleset
            .matchable()
            .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw.as_str())))
    }

    pub fn categorize(&self, description: &str) -> &'a str {
        self.find_matching_rule(description)
            .map_or(FALLBACK_CATEGORY, |rule| rule.name.as_str())
    }

    /// Category for each description, in order.
    pub fn categorize_all<'d, I>(&self, descriptions: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'d str>,
    {
        descriptions.into_iter().map(|d| self.categorize(d)).collect()
    }
}

pub fn categorize<'a>(description: &str, ruleset: &'a CategoryRuleset) -> &'a str {
    CategoryMatcher::new(ruleset).categorize(description)
}
