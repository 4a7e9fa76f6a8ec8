//! Internationalization (i18n) module.
//!
//! Notice texts live in JSON catalogues embedded at compile time.
//! Keys are nested and addressed with dot notation, e.g. `"warn.issued"`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::warn;

/// Language used when a key is missing from the requested catalogue.
pub const FALLBACK_LANG: &str = "en";

/// LangCode -> catalogue
static TRANSLATIONS: Lazy<HashMap<&'static str, Value>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (lang, raw) in [("ru", include_str!("ru.json")), ("en", include_str!("en.json"))] {
        match serde_json::from_str(raw) {
            Ok(val) => {
                map.insert(lang, val);
            }
            Err(e) => warn!("Failed to parse {} catalogue: {}", lang, e),
        }
    }
    map
});

/// Get text for a key in a specific language.
///
/// Falls back to English, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    if let Some(text) = TRANSLATIONS.get(lang).and_then(|val| resolve_key(val, key)) {
        return text;
    }

    if lang != FALLBACK_LANG
        && let Some(text) = TRANSLATIONS.get(FALLBACK_LANG).and_then(|val| resolve_key(val, key))
    {
        return text;
    }

    key.to_string()
}

/// Whether a catalogue exists for `lang`.
pub fn is_supported(lang: &str) -> bool {
    TRANSLATIONS.contains_key(lang)
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogues_have_the_same_keys() {
        fn keys(prefix: &str, val: &Value, out: &mut Vec<String>) {
            if let Some(map) = val.as_object() {
                for (k, v) in map {
                    let path = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                    keys(&path, v, out);
                }
            } else {
                out.push(prefix.to_string());
            }
        }

        let mut ru = Vec::new();
        let mut en = Vec::new();
        keys("", &TRANSLATIONS["ru"], &mut ru);
        keys("", &TRANSLATIONS["en"], &mut en);
        ru.sort();
        en.sort();
        assert_eq!(ru, en);
    }

    #[test]
    fn test_lookup_and_fallbacks() {
        assert_eq!(get_text("ru", "spam.warning"), "⚠️ {name}, не спамь!");
        assert_eq!(get_text("de", "spam.warning"), get_text("en", "spam.warning"));
        assert_eq!(get_text("ru", "no.such.key"), "no.such.key");
        assert!(is_supported("ru"));
        assert!(!is_supported("de"));
    }
}
