use crate::models::Token;

use super::Tokenizer;

/// Word-based tokenizer that splits lines on whitespace and strips
/// surrounding punctuation from each field.
pub struct WordTokenizer {
    lowercase: bool,
    min_word_length: usize,
}

impl WordTokenizer {
    /// Create a tokenizer with custom settings. `min_word_length` has a
    /// floor of 1.
    pub fn new(lowercase: bool, min_word_length: usize) -> Self {
        Self {
            lowercase,
            min_word_length: min_word_length.max(1),
        }
    }

    fn clean(word: &str) -> &str {
        word.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new(true, 2)
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut tokens = Vec::new();
        // split('\n') keeps empty lines so line numbers stay accurate
        for (idx, line) in text.split('\n').enumerate() {
            let line_number = (idx + 1) as u32;
            for word in line.split_whitespace() {
                let cleaned = Self::clean(word);
                if cleaned.chars().count() < self.min_word_length {
                    continue;
                }
                let value = if self.lowercase {
                    cleaned.to_lowercase()
                } else {
                    cleaned.to_string()
                };
                tokens.push(Token::word(value, line_number));
            }
        }
        tokens
    }

    fn name(&self) -> &str {
        "word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = WordTokenizer::default();
        let tokens = tokenizer.tokenize("Hello World! This is a test.");
        let values = values(&tokens);
        assert!(values.contains(&"hello"));
        assert!(values.contains(&"world"));
        assert!(values.contains(&"test"));
        // single-character words fall below the default minimum length
        assert!(!values.contains(&"a"));
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let tokenizer = WordTokenizer::default();
        let tokens = tokenizer.tokenize("first line\nsecond line");
        assert!(tokens.iter().all(|t| t.line >= 1));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn test_empty_lines_counted_but_silent() {
        let tokenizer = WordTokenizer::default();
        let tokens = tokenizer.tokenize("alpha\n\n\nbeta");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 4);
    }

    #[test]
    fn test_line_numbers_non_decreasing() {
        let tokenizer = WordTokenizer::default();
        let tokens = tokenizer.tokenize("one two\nthree\nfour five six");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_punctuation_stripped() {
        let tokenizer = WordTokenizer::default();
        let tokens = tokenizer.tokenize("(hello), \"world\"! ---");
        assert_eq!(values(&tokens), vec!["hello", "world"]);
    }

    #[test]
    fn test_min_word_length() {
        let tokenizer = WordTokenizer::new(true, 4);
        let tokens = tokenizer.tokenize("ab abc abcd abcde");
        assert_eq!(values(&tokens), vec!["abcd", "abcde"]);
    }

    #[test]
    fn test_lowercase_disabled() {
        let tokenizer = WordTokenizer::new(false, 2);
        let tokens = tokenizer.tokenize("Hello World");
        assert_eq!(values(&tokens), vec!["Hello", "World"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let tokenizer = WordTokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("   \n\t  \n").is_empty());
    }
}
