//! Token tagging chain and literal value parsing.
//!
//! The lexer classifies every flushed run of text by asking an ordered
//! [`TaggingChain`]; the first tagger that recognizes the text decides its
//! [`TokenTag`], and unrecognized text becomes [`TokenTag::Deliminator`].
//! [`TaggingChain::latin`] builds the default chain: symbol, boolean,
//! character, string, integer, floating.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::token::TokenTag;
use crate::escape::{EscapeError, evaluate_escape_codes};

/// Failure to read the value of a literal token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// The text is not a literal of the requested kind.
    #[error("'{text}' is not a valid {kind} literal")]
    NotALiteral {
        /// Literal kind that was expected.
        kind: &'static str,
        /// Offending text.
        text: String,
    },
    /// The integer does not fit in an `i64`.
    #[error("integer literal '{0}' is out of range")]
    IntegerOverflow(String),
    /// Exponent used while scientific notation is disabled.
    #[error("scientific notation is not allowed in '{0}'")]
    ScientificNotAllowed(String),
    /// A bad escape sequence inside a character or string literal.
    #[error(transparent)]
    Escape(#[from] EscapeError),
}

/// Recognizes one kind of token text.
pub trait TokenTagger: Send + Sync {
    /// The tag for `text`, or `None` to let the next tagger decide.
    fn tag(&self, text: &str) -> Option<TokenTag>;
}

impl<F> TokenTagger for F
where
    F: Fn(&str) -> Option<TokenTag> + Send + Sync,
{
    fn tag(&self, text: &str) -> Option<TokenTag> {
        self(text)
    }
}

// ── Chain ───────────────────────────────────────────────────────────────

/// Ordered list of taggers; the first match wins.
#[derive(Clone)]
pub struct TaggingChain {
    taggers: Vec<Arc<dyn TokenTagger>>,
}

impl fmt::Debug for TaggingChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggingChain")
            .field("taggers", &self.taggers.len())
            .finish()
    }
}

impl Default for TaggingChain {
    fn default() -> Self {
        Self::latin()
    }
}

impl TaggingChain {
    /// A chain with no taggers: everything is a deliminator.
    pub fn new() -> Self {
        Self {
            taggers: Vec::new(),
        }
    }

    /// The default chain with default [`LatinOptions`].
    pub fn latin() -> Self {
        Self::latin_with(&LatinOptions::default())
    }

    /// The default chain: symbol, boolean, character, string, integer,
    /// floating.
    pub fn latin_with(options: &LatinOptions) -> Self {
        let mut chain = Self::new();
        chain
            .push(SymbolTagger::excluding([
                options.true_word.clone(),
                options.false_word.clone(),
            ]))
            .push(BooleanTagger::from_options(options))
            .push(CharacterTagger::from_options(options))
            .push(StringTagger::from_options(options))
            .push(IntegerTagger)
            .push(FloatingTagger::from_options(options));
        chain
    }

    /// Append a tagger at the end of the chain.
    pub fn push(&mut self, tagger: impl TokenTagger + 'static) -> &mut Self {
        self.taggers.push(Arc::new(tagger));
        self
    }

    /// Classify `text`; [`TokenTag::Deliminator`] when nothing matches.
    pub fn classify(&self, text: &str) -> TokenTag {
        self.taggers
            .iter()
            .find_map(|t| t.tag(text))
            .unwrap_or(TokenTag::Deliminator)
    }

    /// Number of taggers.
    pub fn len(&self) -> usize {
        self.taggers.len()
    }

    /// `true` when the chain has no taggers.
    pub fn is_empty(&self) -> bool {
        self.taggers.is_empty()
    }
}

/// Settings for the default literal conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatinOptions {
    /// Word for the true boolean.
    pub true_word: String,
    /// Word for the false boolean.
    pub false_word: String,
    /// Whether floats may use an `e` exponent.
    pub allow_scientific: bool,
    /// Whether character and string literals may contain escapes.
    pub allow_escapes: bool,
    /// Opening quote of character literals.
    pub char_open: String,
    /// Closing quote of character literals.
    pub char_close: String,
    /// Opening quote of string literals.
    pub string_open: String,
    /// Closing quote of string literals.
    pub string_close: String,
}

impl Default for LatinOptions {
    fn default() -> Self {
        Self {
            true_word: "true".into(),
            false_word: "false".into(),
            allow_scientific: true,
            allow_escapes: true,
            char_open: "'".into(),
            char_close: "'".into(),
            string_open: "\"".into(),
            string_close: "\"".into(),
        }
    }
}

// ── Symbols ─────────────────────────────────────────────────────────────

/// Identifiers: a letter or `_`, then letters, digits, or `_`.
#[derive(Debug, Clone, Default)]
pub struct SymbolTagger {
    excluded: Vec<String>,
}

impl SymbolTagger {
    /// A symbol tagger that leaves the given words to later taggers.
    pub fn excluding(words: impl IntoIterator<Item = String>) -> Self {
        Self {
            excluded: words.into_iter().collect(),
        }
    }

    /// Whether `text` has identifier shape.
    pub fn is_symbol(text: &str) -> bool {
        let mut chars = text.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    }
}

impl TokenTagger for SymbolTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        (Self::is_symbol(text) && !self.excluded.iter().any(|w| w == text))
            .then_some(TokenTag::Symbol)
    }
}

// ── Booleans ────────────────────────────────────────────────────────────

/// The two configured boolean words.
#[derive(Debug, Clone)]
pub struct BooleanTagger {
    true_word: String,
    false_word: String,
}

impl BooleanTagger {
    /// Boolean tagger with custom words.
    pub fn new(true_word: impl Into<String>, false_word: impl Into<String>) -> Self {
        Self {
            true_word: true_word.into(),
            false_word: false_word.into(),
        }
    }

    fn from_options(o: &LatinOptions) -> Self {
        Self::new(o.true_word.clone(), o.false_word.clone())
    }

    /// Value of a boolean literal.
    pub fn parse(&self, text: &str) -> Result<bool, LiteralError> {
        if text == self.true_word {
            Ok(true)
        } else if text == self.false_word {
            Ok(false)
        } else {
            Err(not_a("boolean", text))
        }
    }
}

impl TokenTagger for BooleanTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        self.parse(text).ok().map(|_| TokenTag::BooleanLiteral)
    }
}

// ── Quoted literals ─────────────────────────────────────────────────────

fn quoted_body<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if open.is_empty() || close.is_empty() || text.len() < open.len() + close.len() {
        return None;
    }
    text.strip_prefix(open)?.strip_suffix(close)
}

/// A single quoted character, optionally escaped (`'a'`, `'\n'`).
#[derive(Debug, Clone)]
pub struct CharacterTagger {
    open: String,
    close: String,
    allow_escapes: bool,
}

impl CharacterTagger {
    /// Character tagger with custom quotes.
    pub fn new(open: impl Into<String>, close: impl Into<String>, allow_escapes: bool) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            allow_escapes,
        }
    }

    fn from_options(o: &LatinOptions) -> Self {
        Self::new(o.char_open.clone(), o.char_close.clone(), o.allow_escapes)
    }

    /// Value of a character literal.
    pub fn parse(&self, text: &str) -> Result<char, LiteralError> {
        let body = quoted_body(text, &self.open, &self.close)
            .ok_or_else(|| not_a("character", text))?;
        let mut chars = body.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            (Some('\\'), Some(_)) if self.allow_escapes => {
                let decoded = evaluate_escape_codes(body)?;
                let mut decoded = decoded.chars();
                match (decoded.next(), decoded.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(not_a("character", text)),
                }
            }
            _ => Err(not_a("character", text)),
        }
    }
}

impl TokenTagger for CharacterTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        self.parse(text).ok().map(|_| TokenTag::CharacterLiteral)
    }
}

/// A quoted string (`"…"`).
#[derive(Debug, Clone)]
pub struct StringTagger {
    open: String,
    close: String,
    allow_escapes: bool,
}

impl StringTagger {
    /// String tagger with custom quotes.
    pub fn new(open: impl Into<String>, close: impl Into<String>, allow_escapes: bool) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            allow_escapes,
        }
    }

    fn from_options(o: &LatinOptions) -> Self {
        Self::new(o.string_open.clone(), o.string_close.clone(), o.allow_escapes)
    }

    /// Contents of a string literal, with escapes evaluated when enabled.
    pub fn parse(&self, text: &str) -> Result<String, LiteralError> {
        let body =
            quoted_body(text, &self.open, &self.close).ok_or_else(|| not_a("string", text))?;
        if self.allow_escapes {
            Ok(evaluate_escape_codes(body)?)
        } else {
            Ok(body.to_string())
        }
    }
}

impl TokenTagger for StringTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        quoted_body(text, &self.open, &self.close).map(|_| TokenTag::StringLiteral)
    }
}

// ── Numbers ─────────────────────────────────────────────────────────────

/// Integers: decimal, `0x` hex, leading-zero octal, or `h`-suffixed hex
/// (`1Fh`). An optional leading `-` is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerTagger;

impl IntegerTagger {
    /// Split into sign, digits, and radix; `None` when not integer-shaped.
    fn shape(text: &str) -> Option<(bool, &str, u32)> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let all = |s: &str, radix: u32| !s.is_empty() && s.chars().all(|c| c.is_digit(radix));

        if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            return all(hex, 16).then_some((negative, hex, 16));
        }
        if let Some(hex) = body.strip_suffix('h') {
            return (all(hex, 16) && hex.starts_with(|c: char| c.is_ascii_digit()))
                .then_some((negative, hex, 16));
        }
        if body.len() > 1 && body.starts_with('0') && all(body, 8) {
            return Some((negative, &body[1..], 8));
        }
        all(body, 10).then_some((negative, body, 10))
    }

    /// Value of an integer literal.
    pub fn parse(&self, text: &str) -> Result<i64, LiteralError> {
        let (negative, digits, radix) = Self::shape(text).ok_or_else(|| not_a("integer", text))?;
        let magnitude = i128::from_str_radix(digits, radix)
            .map_err(|_| LiteralError::IntegerOverflow(text.to_string()))?;
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).map_err(|_| LiteralError::IntegerOverflow(text.to_string()))
    }
}

impl TokenTagger for IntegerTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        Self::shape(text).map(|_| TokenTag::IntegerLiteral)
    }
}

/// Decimal fractions: optional `-`, digits with at most one `.`, and an
/// optional `e` exponent when scientific notation is allowed.
#[derive(Debug, Clone, Copy)]
pub struct FloatingTagger {
    allow_scientific: bool,
}

impl Default for FloatingTagger {
    fn default() -> Self {
        Self {
            allow_scientific: true,
        }
    }
}

impl FloatingTagger {
    /// Floating tagger; `allow_scientific` enables `e` exponents.
    pub fn new(allow_scientific: bool) -> Self {
        Self { allow_scientific }
    }

    fn from_options(o: &LatinOptions) -> Self {
        Self::new(o.allow_scientific)
    }

    fn is_mantissa(s: &str) -> bool {
        let s = s.strip_prefix('-').unwrap_or(s);
        let mut dots = 0;
        let mut digits = 0;
        for c in s.chars() {
            match c {
                '.' => dots += 1,
                c if c.is_ascii_digit() => digits += 1,
                _ => return false,
            }
        }
        dots <= 1 && digits > 0
    }

    fn is_exponent(s: &str) -> bool {
        let s = s
            .strip_prefix('-')
            .or_else(|| s.strip_prefix('+'))
            .unwrap_or(s);
        !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
    }

    /// Whether `text` is float-shaped, ignoring the scientific setting.
    /// Returns whether an exponent is present.
    fn shape(text: &str) -> Option<bool> {
        match text.split_once(['e', 'E']) {
            Some((mantissa, exp)) => {
                (Self::is_mantissa(mantissa) && Self::is_exponent(exp)).then_some(true)
            }
            None => Self::is_mantissa(text).then_some(false),
        }
    }

    /// Value of a floating literal.
    pub fn parse(&self, text: &str) -> Result<f64, LiteralError> {
        match Self::shape(text) {
            None => Err(not_a("floating", text)),
            Some(true) if !self.allow_scientific => {
                Err(LiteralError::ScientificNotAllowed(text.to_string()))
            }
            Some(_) => text.parse::<f64>().map_err(|_| not_a("floating", text)),
        }
    }
}

impl TokenTagger for FloatingTagger {
    fn tag(&self, text: &str) -> Option<TokenTag> {
        match Self::shape(text) {
            Some(scientific) if !scientific || self.allow_scientific => {
                Some(TokenTag::FloatingLiteral)
            }
            _ => None,
        }
    }
}

fn not_a(kind: &'static str, text: &str) -> LiteralError {
    LiteralError::NotALiteral {
        kind,
        text: text.to_string(),
    }
}
