//! AOI Label Composition

use crate::OFF_SCREEN;
use serde::{Deserialize, Serialize};

/// Annotation tokens that mean "not on any AOI"
pub const DEFAULT_OFF_SCREEN_TOKENS: &[&str] = &[
    "no", "none", "off", "off_screen", "offscreen", "away", "ambiguous", "?",
];

/// Composes a categorical AOI label from the "what" and "where" annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelComposer {
    /// Tokens mapped to the off-screen sentinel (compared after normalization)
    off_screen_tokens: Vec<String>,
}

impl LabelComposer {
    /// Create a composer with custom off-screen tokens
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            off_screen_tokens: tokens.into_iter().map(|t| normalize_label(t.as_ref())).collect(),
        }
    }

    /// Compose `{what}_{where}`, or the sentinel if either part is off-screen
    pub fn compose(&self, what: &str, location: &str) -> String {
        let what = normalize_label(what);
        let location = normalize_label(location);
        if self.is_off_screen(&what) || self.is_off_screen(&location) {
            return OFF_SCREEN.to_string();
        }
        format!("{}_{}", what, location)
    }

    fn is_off_screen(&self, token: &str) -> bool {
        self.off_screen_tokens.iter().any(|t| t == token)
    }
}

impl Default for LabelComposer {
    fn default() -> Self {
        Self::new(DEFAULT_OFF_SCREEN_TOKENS)
    }
}

/// Lowercase, trim, and join inner whitespace with underscores.
///
/// Composed labels always have this form, so configured label lists must too.
pub fn normalize_label(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}
