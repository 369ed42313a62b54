//! Text translation

use std::collections::HashMap;
use std::sync::RwLock;

/// Translates UI strings.
///
/// Arguments replace `{name}` markers in the translated text.
pub trait Translate: Send + Sync {
    /// Translates `key`, substituting `args`.
    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String;
}

/// Replaces `{name}` markers with their argument values.
pub fn substitute(text: &str, args: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

/// Identity translator: returns the key with markers substituted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translate for NoTranslation {
    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        substitute(key, args)
    }
}

/// Per-language translation tables.
///
/// Keys are matched case-insensitively. Runtime additions take precedence
/// over the built-in tables. Unknown keys fall back to the key itself.
///
/// # Example
///
/// ```
/// use hierarchy_lib::i18n::{Catalog, Translate};
///
/// let catalog = Catalog::new("de")
///     .with_table("de", [("Error {code} occurred!", "Fehler {code} aufgetreten!")]);
///
/// assert_eq!(
///     catalog.translate("error {code} occurred!", &[("code", "500")]),
///     "Fehler 500 aufgetreten!"
/// );
/// assert_eq!(catalog.translate("unknown", &[]), "unknown");
/// ```
#[derive(Debug, Default)]
pub struct Catalog {
    language: RwLock<String>,
    builtin: HashMap<String, HashMap<String, String>>,
    runtime: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl Catalog {
    /// Creates an empty catalog for a language.
    ///
    /// Language tags are cut to their two-letter prefix (`de-AT` → `de`).
    pub fn new(language: &str) -> Self {
        Self {
            language: RwLock::new(normalize_language(language)),
            ..Default::default()
        }
    }

    /// Adds a built-in table (builder pattern).
    pub fn with_table<K, V>(mut self, language: &str, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let table = self.builtin.entry(normalize_language(language)).or_default();
        for (k, v) in entries {
            table.insert(k.as_ref().to_lowercase(), v.into());
        }
        self
    }

    /// Adds or replaces a runtime translation.
    pub fn add_translation(&self, language: &str, key: &str, text: impl Into<String>) {
        if let Ok(mut runtime) = self.runtime.write() {
            runtime
                .entry(normalize_language(language))
                .or_default()
                .insert(key.to_lowercase(), text.into());
        }
    }

    /// Switches the active language.
    pub fn set_language(&self, language: &str) {
        if let Ok(mut current) = self.language.write() {
            *current = normalize_language(language);
        }
    }

    /// Returns the active language.
    pub fn language(&self) -> String {
        self.language
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let language = self.language();
        let key = key.to_lowercase();

        if let Some(text) = self
            .runtime
            .read()
            .ok()
            .and_then(|r| r.get(&language).and_then(|t| t.get(&key)).cloned())
        {
            return Some(text);
        }

        self.builtin
            .get(&language)
            .and_then(|t| t.get(&key))
            .cloned()
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        match self.lookup(key) {
            Some(text) => substitute(&text, args),
            None => substitute(key, args),
        }
    }
}

fn normalize_language(language: &str) -> String {
    let language = if language.is_empty() { "en" } else { language };
    language.chars().take(2).collect::<String>().to_lowercase()
}
