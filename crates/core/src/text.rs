use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// Lowercases `text` and strips nonspacing marks (general category Mn)
/// after canonical decomposition. Spacing and enclosing marks stay.
///
/// Applied to keywords when they are stored and to descriptions when they
/// are matched, so keyword matching is insensitive to case and accents.
pub fn normalize(text: impl AsRef<str>) -> String {
    text.as_ref()
        .to_lowercase()
        .nfd()
        .filter(|c| c.general_category() != GeneralCategory::NonspacingMark)
        .collect()
}
