use super::token::Token;
use super::tree::Tree;

/// Serialize a tree to a pretty-printed JSON string.
pub fn to_pretty_json(tree: &Tree) -> String {
    serde_json::to_string_pretty(tree).expect("Tree serialization cannot fail")
}

/// Serialize a token stream to a pretty-printed JSON array.
pub fn to_json(tokens: &[Token]) -> String {
    serde_json::to_string_pretty(tokens).expect("Token serialization cannot fail")
}
