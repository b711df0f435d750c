use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};

/// Language tag carried by a document; selects the analyzer chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Undefined,
    English,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
}

impl Language {
    /// Stemming algorithm for the language, if one applies.
    pub fn stemmer(&self) -> Option<Algorithm> {
        match self {
            Language::Undefined => None,
            Language::English => Some(Algorithm::English),
            Language::French => Some(Algorithm::French),
            Language::German => Some(Algorithm::German),
            Language::Spanish => Some(Algorithm::Spanish),
            Language::Italian => Some(Algorithm::Italian),
            Language::Portuguese => Some(Algorithm::Portuguese),
        }
    }

    /// Parses an ISO 639-1 code; unknown codes map to `Undefined`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Language::English,
            "fr" => Language::French,
            "de" => Language::German,
            "es" => Language::Spanish,
            "it" => Language::Italian,
            "pt" => Language::Portuguese,
            _ => Language::Undefined,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Undefined => "",
            Language::English => "en",
            Language::French => "fr",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for lang in [Language::English, Language::French, Language::German] {
            assert_eq!(Language::from_code(lang.code()), lang);
        }
        assert_eq!(Language::from_code("xx"), Language::Undefined);
        assert_eq!(Language::from_code(" EN "), Language::English);
    }

    #[test]
    fn test_undefined_has_no_stemmer() {
        assert!(Language::Undefined.stemmer().is_none());
        assert!(Language::English.stemmer().is_some());
    }
}
