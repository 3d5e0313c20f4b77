use std::collections::HashMap;

use super::diag::DiagnosticSink;
use super::token::Token;

/// Name → body table shared by lexical macros (bodies are token sequences)
/// and semantic macros (bodies are subtrees).
///
/// Expansion is single-pass: a body is substituted as stored and never
/// re-scanned for further macro names.
#[derive(Debug, Clone)]
pub struct MacroTable<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for MacroTable<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> MacroTable<V> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`, returning the previous body if it was already defined.
    pub fn define(&mut self, name: impl Into<String>, body: V) -> Option<V> {
        let name = name.into();
        tracing::trace!(%name, "define macro");
        self.entries.insert(name, body)
    }

    /// Define `name`, reporting a shadowing warning at `site` when it
    /// replaces an existing definition.
    pub fn define_reporting(
        &mut self,
        name: impl Into<String>,
        body: V,
        site: &Token,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<V> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            sink.macro_shadows_definition(site, &name);
        }
        self.define(name, body)
    }

    /// Remove `name`; undefining an unknown name is a no-op returning `None`.
    pub fn undefine(&mut self, name: &str) -> Option<V> {
        self.entries.remove(name)
    }

    /// Whether `name` is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Body of `name`.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(name)
    }

    /// Body of `name`, reporting a use of an undefined macro at `site` when
    /// there is none.
    pub fn get_reporting(&self, name: &str, site: &Token, sink: &mut dyn DiagnosticSink) -> Option<&V> {
        let body = self.entries.get(name);
        if body.is_none() {
            sink.undefined_macro(site, name);
        }
        body
    }

    /// Number of defined macros.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no macro is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Defined names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
