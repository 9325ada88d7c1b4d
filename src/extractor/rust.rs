//! Cargo manifests.

use super::common::{parse_toml, Requirement};
use crate::model::Operator;

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// A Cargo dependency entry. Cargo reads a bare version as a caret
/// requirement; `package = "..."` renames the crate being depended on.
fn cargo_dependency(key: &str, value: &toml::Value) -> Requirement {
    match value {
        toml::Value::String(spec) => Requirement::constrained(key, spec, Operator::Caret),
        toml::Value::Table(fields) => {
            let name = fields.get("package").and_then(|p| p.as_str()).unwrap_or(key);
            match fields.get("version").and_then(|v| v.as_str()) {
                Some(spec) => Requirement::constrained(name, spec, Operator::Caret),
                None => Requirement::named(name),
            }
        }
        _ => Requirement::named(key),
    }
}

fn dependency_table(table: Option<&toml::Value>) -> Vec<Requirement> {
    table
        .and_then(|t| t.as_table())
        .map(|deps| {
            deps.iter()
                .map(|(key, value)| cargo_dependency(key, value))
                .collect()
        })
        .unwrap_or_default()
}

pub fn cargo_toml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_toml(content) else {
        return Vec::new();
    };

    let mut requirements: Vec<Requirement> = DEPENDENCY_TABLES
        .iter()
        .flat_map(|table| dependency_table(doc.get(*table)))
        .collect();

    if let Some(workspace) = doc.get("workspace") {
        requirements.extend(dependency_table(workspace.get("dependencies")));
    }

    if let Some(targets) = doc.get("target").and_then(|t| t.as_table()) {
        for target in targets.values() {
            for table in DEPENDENCY_TABLES {
                requirements.extend(dependency_table(target.get(table)));
            }
        }
    }

    requirements
}

pub fn cargo_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_toml(content) else {
        return Vec::new();
    };
    doc.get("package")
        .and_then(|p| p.as_array())
        .map(|packages| {
            packages
                .iter()
                .filter_map(|package| {
                    let name = package.get("name")?.as_str()?;
                    let version = package
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    Some(Requirement::pinned(name, version))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_toml_tables() {
        let content = r#"
[package]
name = "demo"
version = "0.1.0"

[dependencies]
serde = { version = "1.0", features = ["derive"] }
regex = "1.10"
local = { path = "../local" }
exact = "=0.4.2"
yaml = { package = "serde_yaml_ng", version = "0.10" }

[dev-dependencies]
tempfile = "3"

[target.'cfg(unix)'.dependencies]
libc = "0.2"

[workspace.dependencies]
tokio = "~1.35"
"#;
        assert_eq!(
            cargo_toml(content),
            vec![
                Requirement::new("serde", Operator::Caret, "1.0"),
                Requirement::new("regex", Operator::Caret, "1.10"),
                Requirement::named("local"),
                Requirement::new("exact", Operator::Eq, "0.4.2"),
                Requirement::new("serde_yaml_ng", Operator::Caret, "0.10"),
                Requirement::new("tempfile", Operator::Caret, "3"),
                Requirement::new("tokio", Operator::Tilde, "1.35"),
                Requirement::new("libc", Operator::Caret, "0.2"),
            ]
        );
    }

    #[test]
    fn test_cargo_lock_packages() {
        let content = r#"
version = 3

[[package]]
name = "aho-corasick"
version = "1.1.2"
source = "registry+https://github.com/rust-lang/crates.io-index"

[[package]]
name = "demo"
version = "0.1.0"
"#;
        assert_eq!(
            cargo_lock(content),
            vec![
                Requirement::pinned("aho-corasick", "1.1.2"),
                Requirement::pinned("demo", "0.1.0"),
            ]
        );
    }

    #[test]
    fn test_cargo_malformed() {
        assert!(cargo_toml("[dependencies\nserde = ").is_empty());
        assert!(cargo_lock("[[package]\n").is_empty());
    }
}
