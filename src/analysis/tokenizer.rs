use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;
}

/// Unicode word tokenizer (UAX #29 word boundaries)
#[derive(Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        for (offset, word) in text.unicode_word_indices() {
            if word.len() > self.max_token_length {
                continue;
            }
            tokens.push(Token::new(word.to_string(), position, offset));
            position += 1;
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_point_into_source() {
        let text = "Hello,  wide world";
        let tokens = StandardTokenizer::default().tokenize(text);
        let words: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["Hello", "wide", "world"]);
        for token in &tokens {
            assert_eq!(&text[token.offset..token.offset + token.length], token.text);
        }
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_long_tokens_are_dropped() {
        let tokenizer = StandardTokenizer { max_token_length: 3 };
        let tokens = tokenizer.tokenize("abcd ab");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "ab");
    }

    #[test]
    fn test_punctuation_only_yields_nothing() {
        assert!(StandardTokenizer::default().tokenize(" ,;! ").is_empty());
    }
}
