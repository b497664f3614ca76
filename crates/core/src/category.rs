use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::text::normalize;

/// Sentinel category assigned when no keyword matches. Always present,
/// never owns keywords.
pub const FALLBACK_CATEGORY: &str = "Outros";

pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Alimentação",
        &["ifood", "restaurante", "mercado", "supermercado", "lanche"],
    ),
    (
        "Transporte",
        &["uber", "99", "transporte", "gasolina", "combustivel", "onibus"],
    ),
    (
        "Moradia",
        &["aluguel", "condominio", "luz", "internet", "agua", "vivo"],
    ),
    (
        "Saúde",
        &["farmacia", "remedio", "medico", "plano de saude", "drog", "cityfarma"],
    ),
    (
        "Lazer",
        &["cinema", "show", "bar", "viagem", "lazer", "netflix", "spotify"],
    ),
    ("Educação", &["escola", "faculdade", "curso", "livros"]),
    (
        "Compras",
        &["lojas", "roupas", "compras", "amazon", "mercado livre"],
    ),
    (FALLBACK_CATEGORY, &[]),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesetError {
    #[error("Category name must not be empty")]
    EmptyName,
    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),
    #[error("Category not found: {0}")]
    UnknownCategory(String),
    #[error("Category 'Outros' is the fallback and cannot be changed")]
    FallbackProtected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    /// Normalized, deduplicated, in definition order.
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_CATEGORY
    }
}

/// Ordered category → keywords mapping. Matching walks the rules in this
/// order and the first hit wins, so the order is part of the contract and
/// is preserved through persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRuleset {
    rules: Vec<CategoryRule>,
}

impl Default for CategoryRuleset {
    fn default() -> Self {
        let rules = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, keywords)| CategoryRule {
                name: (*name).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        CategoryRuleset { rules }
    }
}

impl CategoryRuleset {
    /// Builds a ruleset from `(name, keywords)` pairs in order. Keywords are
    /// normalized and empties dropped. The fallback is appended when absent.
    pub fn from_rules<I, K>(rules: I) -> Result<Self, RulesetError>
    where
        I: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = String>,
    {
        let mut ruleset = CategoryRuleset { rules: Vec::new() };
        for (name, keywords) in rules {
            let name = validate_name(&name)?;
            if ruleset.contains(&name) {
                return Err(RulesetError::DuplicateCategory(name));
            }
            let keywords = normalize_keywords(keywords);
            if name == FALLBACK_CATEGORY && !keywords.is_empty() {
                return Err(RulesetError::FallbackProtected);
            }
            ruleset.rules.push(CategoryRule { name, keywords });
        }
        if !ruleset.contains(FALLBACK_CATEGORY) {
            ruleset.rules.push(CategoryRule {
                name: FALLBACK_CATEGORY.to_string(),
                keywords: Vec::new(),
            });
        }
        Ok(ruleset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    /// Rules that can actually match, i.e. everything but the fallback.
    pub fn matchable(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().filter(|r| !r.is_fallback())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Adds a category from a comma-separated keyword list. An existing
    /// category with the same name keeps its position and gets the new
    /// keywords.
    pub fn add_category(&mut self, name: &str, keywords_text: &str) -> Result<(), RulesetError> {
        let name = validate_name(name)?;
        if name == FALLBACK_CATEGORY {
            return Err(RulesetError::FallbackProtected);
        }
        let keywords = parse_keywords(keywords_text);
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => rule.keywords = keywords,
            None => self.rules.push(CategoryRule { name, keywords }),
        }
        Ok(())
    }

    pub fn set_keywords(&mut self, name: &str, keywords_text: &str) -> Result<(), RulesetError> {
        if name == FALLBACK_CATEGORY {
            return Err(RulesetError::FallbackProtected);
        }
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RulesetError::UnknownCategory(name.to_string()))?;
        rule.keywords = parse_keywords(keywords_text);
        Ok(())
    }

    pub fn remove_category(&mut self, name: &str) -> Result<CategoryRule, RulesetError> {
        if name == FALLBACK_CATEGORY {
            return Err(RulesetError::FallbackProtected);
        }
        let idx = self
            .rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| RulesetError::UnknownCategory(name.to_string()))?;
        Ok(self.rules.remove(idx))
    }
}

/// Splits a comma-separated keyword list as typed by the user.
pub fn parse_keywords(text: &str) -> Vec<String> {
    normalize_keywords(text.split(',').map(str::to_string))
}

fn normalize_keywords<K: IntoIterator<Item = String>>(keywords: K) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        // An empty keyword would be a substring of every description.
        let keyword = normalize(keyword.trim());
        if !keyword.is_empty() && !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

fn validate_name(name: &str) -> Result<String, RulesetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RulesetError::EmptyName);
    }
    Ok(name.to_string())
}

// ── Persistence format: a map of name → keyword list, in rule order ──────────

impl Serialize for CategoryRuleset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.name, &rule.keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryRuleset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesetVisitor;

        impl<'de> Visitor<'de> for RulesetVisitor {
            type Value = CategoryRuleset;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to keyword list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Vec<String>)> = Vec::new();
                while let Some((name, keywords)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((name, keywords));
                }
                CategoryRuleset::from_rules(entries).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_map(RulesetVisitor)
    }
}
