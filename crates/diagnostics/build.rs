//! Build script that turns `spec/diagnostics.jsonc` into Rust tables.
//!
//! Generated files (all under `OUT_DIR`):
//! - `generated_codes.rs`: one `pub const` per diagnostic id
//! - `generated_explain.rs`: id → long description
//! - `generated_severity.rs`: id → default severity
//! - `generated_templates.rs`: (id, variant) → message template

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use frontkit_jsonc_strip::to_json;
use serde::Deserialize;

const HEADER: &str = "// Generated from spec/diagnostics.jsonc by build.rs; do not edit.\n\n";

#[derive(Deserialize)]
struct Catalogue {
    diagnostics: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    id: String,
    const_name: String,
    severity: String,
    summary: String,
    description: String,
    #[serde(default)]
    context_keys: Vec<String>,
    #[serde(default)]
    message_templates: BTreeMap<String, String>,
}

fn main() {
    let spec_path = Path::new("spec/diagnostics.jsonc");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));
    let catalogue: Catalogue = serde_json::from_str(&to_json(&raw))
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", spec_path.display()));

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    let mut codes = String::from(HEADER);
    let mut explain = String::from("match id {\n");
    let mut severity = String::from(HEADER);
    severity.push_str("match id {\n");
    let mut templates = String::from(HEADER);
    templates.push_str("match (id, variant) {\n");

    for entry in &catalogue.diagnostics {
        validate(entry, &mut seen_ids, &mut seen_names);
        let id = &entry.id;

        let _ = writeln!(codes, "/// {}", entry.summary);
        let _ = writeln!(codes, "pub const {}: &str = \"{id}\";\n", entry.const_name);

        let _ = writeln!(
            explain,
            "    \"{id}\" => Some(\"{}\"),",
            escape_rust_string_literal(&entry.description)
        );

        let sev = match entry.severity.as_str() {
            "error" => "Severity::Error",
            "warn" => "Severity::Warn",
            "info" => "Severity::Info",
            other => panic!("{id}: invalid severity '{other}'"),
        };
        let _ = writeln!(severity, "    \"{id}\" => Some({sev}),");

        for (variant, template) in &entry.message_templates {
            let _ = writeln!(
                templates,
                "    (\"{id}\", \"{variant}\") => Some(\"{}\"),",
                escape_rust_string_literal(template)
            );
        }
    }

    explain.push_str("    _ => None,\n}\n");
    severity.push_str("    _ => None,\n}\n");
    templates.push_str("    _ => None,\n}\n");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out_path = Path::new(&out_dir);
    for (name, body) in [
        ("generated_codes.rs", &codes),
        ("generated_explain.rs", &explain),
        ("generated_severity.rs", &severity),
        ("generated_templates.rs", &templates),
    ] {
        fs::write(out_path.join(name), body)
            .unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    }
}

fn validate(entry: &Entry, seen_ids: &mut HashSet<String>, seen_names: &mut HashSet<String>) {
    let id = &entry.id;
    let name = &entry.const_name;
    assert!(
        !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
            && name.as_bytes()[0].is_ascii_uppercase(),
        "{id}: constName '{name}' is not a SCREAMING_SNAKE_CASE identifier"
    );
    assert!(seen_ids.insert(id.clone()), "duplicate id '{id}'");
    assert!(
        seen_names.insert(name.clone()),
        "{id}: duplicate constName '{name}'"
    );
    assert!(
        entry.message_templates.contains_key("default"),
        "{id}: messageTemplates must define a 'default' variant"
    );

    let keys: HashSet<&str> = entry.context_keys.iter().map(String::as_str).collect();
    for (variant, template) in &entry.message_templates {
        for placeholder in extract_template_placeholders(template) {
            assert!(
                keys.contains(placeholder),
                "{id}: messageTemplates.{variant} uses '{{{placeholder}}}' which is not in contextKeys"
            );
        }
    }
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}

fn extract_template_placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let key = after[..close].trim();
        if !key.is_empty() {
            found.push(key);
        }
        rest = &after[close + 1..];
    }
    found
}
