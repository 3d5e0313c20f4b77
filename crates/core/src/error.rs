//! Setup-time errors.
//!
//! These are raised immediately while configuring a pass, never deferred
//! into a diagnostics report. Problems in the *input* being parsed go to a
//! [`DiagnosticSink`](crate::grammar::diag::DiagnosticSink) instead.

use thiserror::Error;

/// Invalid lexer, tree builder, rewriter, or grammar configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A deliminator rule with an empty start pattern.
    #[error("cannot deliminate an empty pattern")]
    EmptyPattern,
    /// `undeliminate` on a start pattern with no rule.
    #[error("no deliminator rule starts with '{0}'")]
    UnknownDeliminator(String),
    /// A second rule with the same start pattern.
    #[error("a deliminator rule already starts with '{0}'")]
    DuplicateDeliminator(String),
    /// A bound with an empty start or end token.
    #[error("bound '{name}' has an empty {which} token")]
    EmptyBoundToken {
        /// Bound name.
        name: String,
        /// `"start"` or `"end"`.
        which: &'static str,
    },
    /// A second bound with the same start token.
    #[error("a bound already starts with '{0}'")]
    DuplicateBound(String),
    /// A bound whose end token already closes another bound.
    #[error("end token '{end}' of bound '{name}' already closes bound '{other}'")]
    DuplicateBoundEnd {
        /// Bound being declared.
        name: String,
        /// Its end token.
        end: String,
        /// Bound that already uses that end token.
        other: String,
    },
    /// A bound whose start and end tokens are the same.
    #[error("bound '{name}' starts and ends with '{token}'")]
    SelfClosingBound {
        /// Bound name.
        name: String,
        /// The shared token.
        token: String,
    },
    /// A split token on a bound that has no element name to split into.
    #[error("bound '{0}' declares a split but no element name")]
    SplitWithoutElement(String),
    /// An operator with an empty name.
    #[error("operator name cannot be empty")]
    EmptyOperator,
    /// A grammar document that is not valid JSON(C) or has the wrong shape.
    #[error("invalid grammar document: {0}")]
    Grammar(#[from] serde_json::Error),
}
