use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::diag::{Location, Span};

/// Classification assigned to a token by the tagging chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenTag {
    /// Deliminated region, or text no tagger recognized.
    #[default]
    Deliminator,
    /// Identifier-like text.
    Symbol,
    /// `true` / `false` (or the configured words).
    BooleanLiteral,
    /// Decimal, hex, or octal integer.
    IntegerLiteral,
    /// Decimal fraction, optionally scientific.
    FloatingLiteral,
    /// Quoted single character.
    CharacterLiteral,
    /// Quoted string.
    StringLiteral,
    /// Produced by macro expansion rather than read from the source.
    Synthetic,
}

impl TokenTag {
    /// `true` for the five literal tags.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenTag::BooleanLiteral
                | TokenTag::IntegerLiteral
                | TokenTag::FloatingLiteral
                | TokenTag::CharacterLiteral
                | TokenTag::StringLiteral
        )
    }

    /// Short lowercase name used in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenTag::Deliminator => "delim",
            TokenTag::Symbol => "symbol",
            TokenTag::BooleanLiteral => "bool",
            TokenTag::IntegerLiteral => "int",
            TokenTag::FloatingLiteral => "float",
            TokenTag::CharacterLiteral => "char",
            TokenTag::StringLiteral => "string",
            TokenTag::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical unit: its text, tag, and where it came from.
///
/// `line` starts at 1 and `column` at 0; `column` counts characters.
/// `offset` is the byte offset of the first character in the lexed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Source text of the token.
    pub value: String,
    /// Tag assigned by the tagging chain.
    pub tag: TokenTag,
    /// Line number (1-based).
    pub line: usize,
    /// Column (0-based, in characters).
    pub column: usize,
    /// Byte offset into the lexed text.
    pub offset: usize,
    /// Origin file identifier, shared by every token of one lex call.
    pub file: Arc<str>,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            value: String::new(),
            tag: TokenTag::Deliminator,
            line: 1,
            column: 0,
            offset: 0,
            file: Arc::from(""),
        }
    }
}

impl Token {
    /// Build a token at a known position.
    pub fn new(
        value: impl Into<String>,
        tag: TokenTag,
        line: usize,
        column: usize,
        offset: usize,
        file: Arc<str>,
    ) -> Self {
        Self {
            value: value.into(),
            tag,
            line,
            column,
            offset,
            file,
        }
    }

    /// A position-less token with the given value and tag, as used for macro
    /// bodies and in tests.
    pub fn bare(value: impl Into<String>, tag: TokenTag) -> Self {
        Self {
            value: value.into(),
            tag,
            ..Self::default()
        }
    }

    /// Copy of this token carrying `site`'s position and file, tagged
    /// [`TokenTag::Synthetic`]. Used when a macro body is expanded at a use.
    pub fn restamped_at(&self, site: &Token) -> Self {
        Self {
            value: self.value.clone(),
            tag: TokenTag::Synthetic,
            line: site.line,
            column: site.column,
            offset: site.offset,
            file: Arc::clone(&site.file),
        }
    }

    /// Byte span covered by the token text.
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.value.len())
    }

    /// File/line/column of the token.
    pub fn location(&self) -> Location {
        Location {
            file: self.file.to_string(),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
