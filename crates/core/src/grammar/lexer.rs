//! Deliminator-driven tokenizer.
//!
//! A [`Lexer`] holds a table of [`Deliminator`] rules keyed by start
//! pattern. Scanning tries the longest start patterns first, so `==` wins
//! over `=` wherever both could match. Text between matched regions is
//! flushed as a single token and tagged by the lexer's [`TaggingChain`];
//! matched regions become [`TokenTag::Deliminator`] tokens unless the rule is
//! filtered, in which case they only advance the position.
//!
//! Every emitted token goes through a [`TokenHook`]. The default,
//! [`ExpandMacros`], substitutes lexical macros; a custom hook can intercept
//! directives or drop tokens.

use std::cmp;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::diag::{Discard, DiagnosticSink};
use super::macros::MacroTable;
use super::tagger::TaggingChain;
use super::token::{Token, TokenTag};
use crate::error::ConfigError;

/// Callback end detector: receives the remaining text starting at the match
/// and returns the number of bytes the region consumes.
pub type EndCallback = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// How a matched region finds its end.
#[derive(Clone, Default)]
pub enum EndDetector {
    /// The region is just the start pattern.
    #[default]
    None,
    /// Scan forward for a literal end pattern (included in the region).
    Pattern(String),
    /// Ask a callback for the region length.
    Callback(EndCallback),
}

impl fmt::Debug for EndDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndDetector::None => f.write_str("None"),
            EndDetector::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            EndDetector::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Whether a rule's regions are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimFlags {
    /// Emit the region as a token.
    #[default]
    Default,
    /// Consume the region silently; it still advances line and column.
    Filtered,
}

/// One deliminator rule.
#[derive(Debug, Clone)]
pub struct Deliminator {
    start: String,
    end: EndDetector,
    escape: Option<char>,
    flags: DelimFlags,
}

impl Deliminator {
    fn new(start: &str, end: EndDetector) -> Self {
        Self {
            start: start.to_string(),
            end,
            escape: None,
            flags: DelimFlags::Default,
        }
    }

    /// The start pattern.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// The end detector.
    pub fn end(&self) -> &EndDetector {
        &self.end
    }

    /// Current flags.
    pub fn flags(&self) -> DelimFlags {
        self.flags
    }

    /// `true` when regions are consumed without emitting a token.
    pub fn is_filtered(&self) -> bool {
        self.flags == DelimFlags::Filtered
    }

    /// Replace the flags.
    pub fn set_flags(&mut self, flags: DelimFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Shorthand for `set_flags(DelimFlags::Filtered)`.
    pub fn filtered(&mut self) -> &mut Self {
        self.set_flags(DelimFlags::Filtered)
    }

    /// Character that, inside a pattern-terminated region, makes the scan
    /// skip the character after it.
    pub fn escaped_by(&mut self, escape: char) -> &mut Self {
        self.escape = Some(escape);
        self
    }

    /// The escape character, if any.
    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    /// Byte length of the region starting at the beginning of `rest`, which
    /// is known to start with this rule's start pattern.
    fn region_len(&self, rest: &str) -> usize {
        let min = self.start.len();
        match &self.end {
            EndDetector::None => min,
            EndDetector::Pattern(end) => {
                let mut chars = rest[min..].char_indices();
                while let Some((i, c)) = chars.next() {
                    let at = min + i;
                    if self.escape == Some(c) {
                        chars.next();
                    } else if rest[at..].starts_with(end.as_str()) {
                        return at + end.len();
                    }
                }
                // Unterminated: consume to end of input.
                rest.len()
            }
            EndDetector::Callback(f) => {
                let mut n = f(rest).clamp(min, rest.len());
                while !rest.is_char_boundary(n) {
                    n += 1;
                }
                n
            }
        }
    }
}

// ── Positions ───────────────────────────────────────────────────────────

/// Text to lex plus where it starts in its file.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    /// Text to scan.
    pub text: &'a str,
    /// Origin file identifier stamped on every token.
    pub file: Arc<str>,
    /// Line of the first character (1-based).
    pub line: usize,
    /// Column of the first character (0-based, in characters).
    pub column: usize,
    /// Byte offset of the first character within the file.
    pub offset: usize,
}

impl<'a> Source<'a> {
    /// `text` starting at line 1, column 0, offset 0.
    pub fn new(text: &'a str, file: impl Into<Arc<str>>) -> Self {
        Self {
            text,
            file: file.into(),
            line: 1,
            column: 0,
            offset: 0,
        }
    }

    /// Same text, positioned at `line`/`column`/`offset` of its file.
    pub fn starting_at(mut self, line: usize, column: usize, offset: usize) -> Self {
        self.line = line;
        self.column = column;
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    line: usize,
    column: usize,
}

impl Cursor {
    fn step(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            self.step(c);
        }
    }
}

// ── Emission hook ───────────────────────────────────────────────────────

/// What a [`TokenHook`] can see besides the token.
pub struct HookContext<'a> {
    /// The lexer's lexical macro table.
    pub macros: &'a MacroTable<Vec<Token>>,
    /// Where hook-detected problems go.
    pub sink: &'a mut dyn DiagnosticSink,
}

/// Receives every token the lexer emits and decides what lands in the output.
pub trait TokenHook {
    /// Handle `token`, pushing zero or more tokens onto `out`.
    fn on_token(&mut self, token: Token, out: &mut Vec<Token>, cx: &mut HookContext<'_>);
}

impl<F> TokenHook for F
where
    F: FnMut(Token, &mut Vec<Token>, &mut HookContext<'_>),
{
    fn on_token(&mut self, token: Token, out: &mut Vec<Token>, cx: &mut HookContext<'_>) {
        self(token, out, cx);
    }
}

/// Default hook: replace a token naming a lexical macro with the macro body,
/// restamped at the use site. Bodies are not re-scanned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandMacros;

impl TokenHook for ExpandMacros {
    fn on_token(&mut self, token: Token, out: &mut Vec<Token>, cx: &mut HookContext<'_>) {
        match cx.macros.get(&token.value) {
            Some(body) => out.extend(body.iter().map(|t| t.restamped_at(&token))),
            None => out.push(token),
        }
    }
}

/// Hook that appends every token unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl TokenHook for PassThrough {
    fn on_token(&mut self, token: Token, out: &mut Vec<Token>, _cx: &mut HookContext<'_>) {
        out.push(token);
    }
}

// ── Lexer ───────────────────────────────────────────────────────────────

/// Configurable tokenizer.
///
/// Configuration is read-only during [`Lexer::lex`], so one lexer can be
/// reused for any number of inputs.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    /// Start-pattern byte length → start pattern → rule.
    buckets: BTreeMap<usize, HashMap<String, Deliminator>>,
    max_start_len: usize,
    tagger: TaggingChain,
    macros: MacroTable<Vec<Token>>,
}

impl Lexer {
    /// Lexer with no rules and the default tagging chain.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Rules ───────────────────────────────────────────────────────────

    /// Rule whose region is exactly `start`.
    pub fn deliminate(&mut self, start: &str) -> Result<&mut Deliminator, ConfigError> {
        self.insert(Deliminator::new(start, EndDetector::None))
    }

    /// Rule whose region runs from `start` through the next `end`. An empty
    /// `end` behaves like [`Lexer::deliminate`].
    pub fn deliminate_until(&mut self, start: &str, end: &str) -> Result<&mut Deliminator, ConfigError> {
        let detector = if end.is_empty() {
            EndDetector::None
        } else {
            EndDetector::Pattern(end.to_string())
        };
        self.insert(Deliminator::new(start, detector))
    }

    /// Rule whose region length is computed by `end`.
    pub fn deliminate_with<F>(&mut self, start: &str, end: F) -> Result<&mut Deliminator, ConfigError>
    where
        F: Fn(&str) -> usize + Send + Sync + 'static,
    {
        self.insert(Deliminator::new(start, EndDetector::Callback(Arc::new(end))))
    }

    fn insert(&mut self, rule: Deliminator) -> Result<&mut Deliminator, ConfigError> {
        let len = rule.start.len();
        if len == 0 {
            return Err(ConfigError::EmptyPattern);
        }
        let bucket = self.buckets.entry(len).or_default();
        match bucket.entry(rule.start.clone()) {
            Entry::Occupied(_) => Err(ConfigError::DuplicateDeliminator(rule.start)),
            Entry::Vacant(slot) => {
                tracing::trace!(start = %rule.start, end = ?rule.end, "deliminate");
                self.max_start_len = cmp::max(self.max_start_len, len);
                Ok(slot.insert(rule))
            }
        }
    }

    /// Remove the rule starting with `start`, returning it.
    pub fn undeliminate(&mut self, start: &str) -> Result<Deliminator, ConfigError> {
        if start.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }
        let len = start.len();
        let bucket = self
            .buckets
            .get_mut(&len)
            .ok_or_else(|| ConfigError::UnknownDeliminator(start.to_string()))?;
        let rule = bucket
            .remove(start)
            .ok_or_else(|| ConfigError::UnknownDeliminator(start.to_string()))?;
        if bucket.is_empty() {
            self.buckets.remove(&len);
        }
        self.max_start_len = self.buckets.keys().next_back().copied().unwrap_or(0);
        tracing::trace!(start, "undeliminate");
        Ok(rule)
    }

    /// The rule starting with `start`.
    pub fn rule(&self, start: &str) -> Option<&Deliminator> {
        self.buckets.get(&start.len())?.get(start)
    }

    /// Mutable access to the rule starting with `start`.
    pub fn rule_mut(&mut self, start: &str) -> Option<&mut Deliminator> {
        self.buckets.get_mut(&start.len())?.get_mut(start)
    }

    /// Byte length of the longest start pattern, 0 with no rules.
    pub fn max_start_len(&self) -> usize {
        self.max_start_len
    }

    /// Number of rules.
    pub fn rule_count(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    /// Longest rule whose start pattern prefixes `rest`.
    fn match_at(&self, rest: &str) -> Option<&Deliminator> {
        self.buckets
            .range(..=cmp::min(self.max_start_len, rest.len()))
            .rev()
            .find_map(|(&len, bucket)| bucket.get(rest.get(..len)?))
    }

    // ── Tagging and macros ──────────────────────────────────────────────

    /// Replace the chain that tags flushed text.
    pub fn set_tagger(&mut self, tagger: TaggingChain) {
        self.tagger = tagger;
    }

    /// The chain that tags flushed text.
    pub fn tagger(&self) -> &TaggingChain {
        &self.tagger
    }

    /// Define a lexical macro; returns the previous body.
    pub fn define_macro(&mut self, name: impl Into<String>, body: Vec<Token>) -> Option<Vec<Token>> {
        self.macros.define(name, body)
    }

    /// Remove a lexical macro.
    pub fn undefine_macro(&mut self, name: &str) -> Option<Vec<Token>> {
        self.macros.undefine(name)
    }

    /// Whether `name` is a lexical macro.
    pub fn is_macro_defined(&self, name: &str) -> bool {
        self.macros.is_defined(name)
    }

    /// Body of lexical macro `name`.
    pub fn macro_value(&self, name: &str) -> Option<&[Token]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    /// The lexical macro table.
    pub fn macros(&self) -> &MacroTable<Vec<Token>> {
        &self.macros
    }

    // ── Scanning ────────────────────────────────────────────────────────

    /// Tokenize `text` with the default hook, discarding hook diagnostics.
    pub fn lex(&self, text: &str, file: impl Into<Arc<str>>) -> Vec<Token> {
        self.lex_source(&Source::new(text, file), &mut ExpandMacros, &mut Discard)
    }

    /// Tokenize `text` through `hook`.
    pub fn lex_with<H: TokenHook>(
        &self,
        text: &str,
        file: impl Into<Arc<str>>,
        hook: &mut H,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<Token> {
        self.lex_source(&Source::new(text, file), hook, sink)
    }

    /// Tokenize `source`, stamping positions relative to its start.
    pub fn lex_source<H: TokenHook>(
        &self,
        source: &Source<'_>,
        hook: &mut H,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<Token> {
        let text = source.text;
        let mut out = Vec::new();
        let mut cx = HookContext {
            macros: &self.macros,
            sink,
        };

        let mut pos = Cursor {
            line: source.line,
            column: source.column,
        };
        let mut pending_start = 0usize;
        let mut pending_pos = pos;
        let mut i = 0usize;

        while i < text.len() {
            let rest = &text[i..];
            let Some(rule) = self.match_at(rest) else {
                let Some(c) = rest.chars().next() else {
                    break;
                };
                pos.step(c);
                i += c.len_utf8();
                continue;
            };

            if pending_start < i {
                let token = self.pending(source, &text[pending_start..i], pending_pos, pending_start);
                hook.on_token(token, &mut out, &mut cx);
            }

            let region = &rest[..rule.region_len(rest)];
            if !rule.is_filtered() {
                let token = Token::new(
                    region,
                    TokenTag::Deliminator,
                    pos.line,
                    pos.column,
                    source.offset + i,
                    Arc::clone(&source.file),
                );
                hook.on_token(token, &mut out, &mut cx);
            }
            pos.advance(region);
            i += region.len();
            pending_start = i;
            pending_pos = pos;
        }

        if pending_start < text.len() {
            let token = self.pending(source, &text[pending_start..], pending_pos, pending_start);
            hook.on_token(token, &mut out, &mut cx);
        }

        tracing::debug!(file = %source.file, tokens = out.len(), "lexed");
        out
    }

    fn pending(&self, source: &Source<'_>, value: &str, at: Cursor, start: usize) -> Token {
        Token::new(
            value,
            self.tagger.classify(value),
            at.line,
            at.column,
            source.offset + start,
            Arc::clone(&source.file),
        )
    }
}
