//! Translation lookup with locale fallback.
//!
//! Every language is described by a JSON table with a display `name` and a
//! nested `translations` object:
//!
//! ```json
//! {
//!   "name": "English",
//!   "translations": {
//!     "stats": { "critical": "Critical alerts" },
//!     "notifications": { "refreshed": "{0} alerts loaded" }
//!   }
//! }
//! ```
//!
//! Keys are dotted paths into `translations`. A key is resolved against the
//! requested language first, then against the default language, and finally the
//! raw key is returned. Resolution never fails.

use std::{collections::HashMap, fs, path::Path};

use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;

/// Built-in tables, keyed by language code.
const BUILTIN_TABLES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.json")),
    ("es", include_str!("../locales/es.json")),
    ("fr", include_str!("../locales/fr.json")),
];

/// A language's display name and nested translations.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationTable {
    pub name: String,
    #[serde(default)]
    pub translations: Value,
}

impl TranslationTable {
    /// Walks the dotted `key`, returning the leaf only if it is a string.
    fn lookup(&self, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(&self.translations, |node, segment| node.get(segment))
            .and_then(Value::as_str)
    }
}

/// Resolves dotted keys to localized text.
///
/// # Examples
///
/// ```
/// let translator = Translator::builtin("en");
/// assert_eq!(translator.resolve("stats.critical", "fr"), "Alertes critiques");
/// // Present only in English
/// assert_eq!(translator.resolve("stats.goodService", "fr"), "Lines in good service");
/// // Unknown everywhere
/// assert_eq!(translator.resolve("stats.typo", "fr"), "stats.typo");
/// ```
#[derive(Debug, Clone)]
pub struct Translator {
    /// Tables keyed by language code
    tables: HashMap<String, TranslationTable>,
    /// Language used when a key is missing from the requested one
    default_language: String,
}

impl Translator {
    /// Creates a translator over the built-in English, Spanish and French tables.
    ///
    /// A built-in table that fails to parse is skipped and logged.
    pub fn builtin(default_language: &str) -> Self {
        let mut tables = HashMap::new();
        for (code, raw) in BUILTIN_TABLES {
            match serde_json::from_str::<TranslationTable>(raw) {
                Ok(table) => {
                    tables.insert(code.to_string(), table);
                }
                Err(e) => error!("failed to parse built-in {} translations: {}", code, e),
            }
        }

        Self::new(tables, default_language)
    }

    pub fn new(tables: HashMap<String, TranslationTable>, default_language: &str) -> Self {
        if !tables.contains_key(default_language) {
            warn!(
                "default language {} has no translation table, keys will resolve to themselves",
                default_language
            );
        }

        Translator {
            tables,
            default_language: default_language.to_string(),
        }
    }

    /// Adds or replaces tables with every `<code>.json` file found in `dir`.
    ///
    /// Unreadable or malformed files are logged and ignored, the previous table
    /// for that language is kept.
    pub fn load_directory(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("failed to read locales directory {}: {}", dir.display(), e);
                return;
            }
        };

        for path in entries.flatten().map(|entry| entry.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let Ok(raw) = fs::read_to_string(&path) else {
                error!("failed to read translations {}", path.display());
                continue;
            };
            match serde_json::from_str::<TranslationTable>(&raw) {
                Ok(table) => {
                    info!("loaded {} translations from {}", code, path.display());
                    self.tables.insert(code.to_string(), table);
                }
                Err(e) => error!("malformed translations {}: {}", path.display(), e),
            }
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolves `key` for `language`.
    ///
    /// Falls back to the default language, then to the key itself.
    pub fn resolve(&self, key: &str, language: &str) -> String {
        if let Some(text) = self.tables.get(language).and_then(|t| t.lookup(key)) {
            return text.to_string();
        }

        if let Some(text) = self
            .tables
            .get(&self.default_language)
            .and_then(|t| t.lookup(key))
        {
            debug!("translation {} missing for {}, using default", key, language);
            return text.to_string();
        }

        debug!("translation {} missing in every language", key);
        key.to_string()
    }

    /// Resolves `key` and substitutes `{0}`, `{1}`... with `args`.
    ///
    /// Placeholders without a matching argument are left untouched.
    pub fn format(&self, key: &str, language: &str, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.resolve(key, language), |text, (index, arg)| {
                text.replace(&format!("{{{}}}", index), arg)
            })
    }

    /// Returns the display name of `code`, or the code itself if unknown.
    pub fn language_name(&self, code: &str) -> String {
        self.tables
            .get(code)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Lists `(code, name)` pairs of the available languages, sorted by code.
    pub fn languages(&self) -> Vec<(String, String)> {
        let mut languages: Vec<(String, String)> = self
            .tables
            .iter()
            .map(|(code, table)| (code.clone(), table.name.clone()))
            .collect();
        languages.sort();
        languages
    }
}
