use serde::{Deserialize, Serialize};

/// Token categories, each with a default relevance used for future ranking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Programming language keywords (public, class, if, while)
    Keyword,
    /// Identifiers: variable, class, and method names
    Identifier,
    /// String literals and quoted text content
    String,
    /// Numeric values and constants
    Number,
    /// Regular words from natural language text
    Word,
    /// Comments in code or documentation
    Comment,
    /// Punctuation and special characters
    Punctuation,
    /// Unknown or undefined token type
    Unknown,
}

impl TokenType {
    /// Default relevance score for this token type, in `[0.0, 1.0]`
    pub fn default_relevance(self) -> f32 {
        match self {
            TokenType::Keyword => 1.0,
            TokenType::Identifier => 0.9,
            TokenType::String => 0.8,
            TokenType::Number => 0.7,
            TokenType::Word => 0.6,
            TokenType::Comment => 0.4,
            TokenType::Punctuation => 0.2,
            TokenType::Unknown => 0.5,
        }
    }
}

/// A token produced by a tokenizer: verbatim matched text plus its position.
///
/// `line` is 1-based; `column` is 0 when the tokenizer does not track columns.
/// Relevance is carried through for future ranking and is not acted on by the
/// index itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub line: u32,
    pub column: u32,
    pub kind: TokenType,
    pub relevance: f32,
}

impl Token {
    /// Create a token of the given kind with its type's default relevance
    pub fn new(value: impl Into<String>, line: u32, kind: TokenType) -> Self {
        Self {
            value: value.into(),
            line,
            column: 0,
            kind,
            relevance: kind.default_relevance(),
        }
    }

    /// Create a plain word token
    pub fn word(value: impl Into<String>, line: u32) -> Self {
        Self::new(value, line, TokenType::Word)
    }

    /// Set the column position
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = column;
        self
    }

    /// Override the relevance score, clamped to `[0.0, 1.0]`
    pub fn with_relevance(mut self, relevance: f32) -> Self {
        self.relevance = relevance.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_relevances() {
        assert_eq!(TokenType::Keyword.default_relevance(), 1.0);
        assert_eq!(TokenType::Word.default_relevance(), 0.6);
        assert_eq!(TokenType::Punctuation.default_relevance(), 0.2);
        assert_eq!(TokenType::Unknown.default_relevance(), 0.5);
    }

    #[test]
    fn test_word_token() {
        let token = Token::word("hello", 3);
        assert_eq!(token.value, "hello");
        assert_eq!(token.line, 3);
        assert_eq!(token.column, 0);
        assert_eq!(token.kind, TokenType::Word);
        assert_eq!(token.relevance, 0.6);
    }

    #[test]
    fn test_relevance_clamped() {
        let token = Token::word("x", 1).with_relevance(3.5);
        assert_eq!(token.relevance, 1.0);
        let token = Token::word("x", 1).with_relevance(-0.5);
        assert_eq!(token.relevance, 0.0);
    }
}
