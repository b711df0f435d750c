use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::language::Language;
use crate::analysis::token::Token;

const ENGLISH: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for",
    "from", "has", "he", "in", "is", "it", "its", "of", "on",
    "that", "the", "to", "was", "will", "with",
];

/// Drops tokens whose (already lowercased) text is a stop word.
pub struct StopWordFilter {
    words: HashSet<&'static str>,
}

impl StopWordFilter {
    /// Stop list of `lang`, if the crate ships one.
    pub fn for_language(lang: Language) -> Option<Self> {
        let list = match lang {
            Language::English => ENGLISH,
            _ => return None,
        };
        Some(StopWordFilter {
            words: list.iter().copied().collect(),
        })
    }

    pub fn is_stop_word(&self, text: &str) -> bool {
        self.words.contains(text)
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        tokens.retain(|token| !self.is_stop_word(&token.text));
        tokens
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}
