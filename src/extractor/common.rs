//! Helpers shared by the per-format parsers.

use crate::model::Operator;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// A dependency as declared by a manifest, before the registry attaches the
/// ecosystem and source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    pub operator: Operator,
    pub version: String,
}

impl Requirement {
    /// An operator without a version carries no constraint and is dropped.
    pub fn new(name: impl Into<String>, operator: Operator, version: impl Into<String>) -> Self {
        let version = version.into();
        let operator = if version.trim().is_empty() {
            Operator::None
        } else {
            operator
        };
        Self {
            name: name.into(),
            operator,
            version,
        }
    }

    /// A dependency whose version is not declared.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Operator::None, "")
    }

    /// A dependency with a constraint string such as `^1.2.3` or `~> 6.1`.
    pub fn constrained(name: impl Into<String>, spec: &str, bare: Operator) -> Self {
        let (operator, version) = split_constraint(spec, bare);
        Self::new(name, operator, version)
    }

    /// A dependency pinned to an exact version. An empty version stays
    /// unconstrained.
    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        let operator = if version.is_empty() {
            Operator::None
        } else {
            Operator::Eq
        };
        Self::new(name, operator, version)
    }
}

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '~', '^'];

fn looks_like_version(text: &str) -> bool {
    let body = text.strip_prefix('v').unwrap_or(text);
    body.starts_with(|c: char| c.is_ascii_digit())
}

/// Splits a constraint string into a record operator and a version.
///
/// Only the first clause of a compound constraint is kept (`>=2.0,<3.0` gives
/// `>=` and `2.0`). `bare` is the ecosystem's meaning of a version written
/// without an operator; it only applies to text that looks like a version.
/// Symbols outside the record operator set (`!=`) are kept in the version
/// text with no operator.
pub fn split_constraint(spec: &str, bare: Operator) -> (Operator, String) {
    let first = spec
        .split(|c| c == ',' || c == '|')
        .next()
        .unwrap_or_default()
        .trim();

    if first.is_empty() || first == "*" {
        return (Operator::None, String::new());
    }

    let symbol_end = first
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(first.len());
    let (symbol, rest) = first.split_at(symbol_end);
    let version = rest
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    match Operator::from_symbol(symbol) {
        Some(Operator::None) if looks_like_version(&version) => (bare, version),
        Some(Operator::None) => (Operator::None, first.to_string()),
        Some(_) if version.is_empty() => (Operator::None, String::new()),
        Some(operator) => (operator, version),
        None => (Operator::None, first.to_string()),
    }
}

pub fn parse_json(content: &str) -> Option<serde_json::Value> {
    serde_json::from_str(content)
        .map_err(|e| tracing::debug!("invalid JSON: {}", e))
        .ok()
}

pub fn parse_toml(content: &str) -> Option<toml::Value> {
    content
        .parse::<toml::Table>()
        .map(toml::Value::Table)
        .map_err(|e| tracing::debug!("invalid TOML: {}", e))
        .ok()
}

pub fn parse_yaml(content: &str) -> Option<serde_yaml_ng::Value> {
    serde_yaml_ng::from_str(content)
        .map_err(|e| tracing::debug!("invalid YAML: {}", e))
        .ok()
}

/// Reads a `name -> constraint` JSON object such as npm's `dependencies`.
/// Values may be strings or objects carrying a `version` field.
pub fn json_dependency_map(
    section: Option<&serde_json::Value>,
    constraint: fn(&str, &str) -> Requirement,
) -> Vec<Requirement> {
    let Some(map) = section.and_then(|s| s.as_object()) else {
        return Vec::new();
    };

    map.iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(spec) => constraint(name, spec),
            serde_json::Value::Object(fields) => {
                match fields.get("version").and_then(|v| v.as_str()) {
                    Some(spec) => constraint(name, spec),
                    None => Requirement::named(name),
                }
            }
            _ => Requirement::named(name),
        })
        .collect()
}

/// Runs several patterns over `content` and returns their results in source
/// order.
pub fn ordered_captures(
    content: &str,
    patterns: &[(&Regex, fn(&Captures) -> Option<Requirement>)],
) -> Vec<Requirement> {
    let mut found: Vec<(usize, Requirement)> = patterns
        .iter()
        .flat_map(|(regex, build)| {
            regex.captures_iter(content).filter_map(move |caps| {
                let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
                build(&caps).map(|req| (start, req))
            })
        })
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, req)| req).collect()
}

/// Drops repeated records, keeping the first occurrence.
pub fn dedupe(requirements: Vec<Requirement>) -> Vec<Requirement> {
    let mut seen = HashSet::new();
    requirements
        .into_iter()
        .filter(|req| seen.insert((req.name.clone(), req.version.clone())))
        .collect()
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn attributes(element: &BytesStart) -> HashMap<String, String> {
    element
        .attributes()
        .flatten()
        .filter_map(|attr| {
            let key = local_name(attr.key.local_name().as_ref());
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Collects every `element` in an XML document as a field map built from its
/// attributes and the text of its direct children. Attributes win over
/// children of the same name. Returns `None` if the document is malformed.
pub fn xml_elements(content: &str, element: &str) -> Option<Vec<HashMap<String, String>>> {
    let mut reader = Reader::from_str(content);
    let mut found = Vec::new();
    let mut open: Option<(usize, HashMap<String, String>)> = None;
    let mut child: Option<String> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = local_name(e.local_name().as_ref());
                match open.as_ref().map(|(level, _)| *level) {
                    None if name == element => open = Some((depth, attributes(&e))),
                    Some(level) if depth == level + 1 => child = Some(name),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if open.is_none() && local_name(e.local_name().as_ref()) == element {
                    found.push(attributes(&e));
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some((level, fields)), Some(name)) = (open.as_mut(), child.as_ref()) {
                    if depth == *level + 1 {
                        let text = t.unescape().ok()?;
                        let text = text.trim();
                        if !text.is_empty() {
                            fields
                                .entry(name.clone())
                                .or_insert_with(|| text.to_string());
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                let level = open.as_ref().map(|(level, _)| *level);
                if level == Some(depth) {
                    if let Some((_, fields)) = open.take() {
                        found.push(fields);
                    }
                } else if level.map(|l| l + 1) == Some(depth) {
                    child = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("invalid XML: {}", e);
                return None;
            }
            _ => {}
        }
    }

    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_constraint_operators() {
        assert_eq!(split_constraint("^1.2.3", Operator::Eq), (Operator::Caret, "1.2.3".into()));
        assert_eq!(split_constraint("~> 6.1", Operator::Eq), (Operator::Tilde, "6.1".into()));
        assert_eq!(split_constraint(">= 2.0, < 3.0", Operator::Eq), (Operator::Ge, "2.0".into()));
        assert_eq!(split_constraint("==2.28.0", Operator::None), (Operator::Eq, "2.28.0".into()));
    }

    #[test]
    fn test_split_constraint_bare_versions() {
        assert_eq!(split_constraint("1.0.2", Operator::Eq), (Operator::Eq, "1.0.2".into()));
        assert_eq!(split_constraint("1.0", Operator::Caret), (Operator::Caret, "1.0".into()));
        assert_eq!(split_constraint("v2.3.0", Operator::Eq), (Operator::Eq, "v2.3.0".into()));
    }

    #[test]
    fn test_split_constraint_non_versions() {
        assert_eq!(split_constraint("*", Operator::Eq), (Operator::None, String::new()));
        assert_eq!(split_constraint("", Operator::Eq), (Operator::None, String::new()));
        assert_eq!(split_constraint("latest", Operator::Eq), (Operator::None, "latest".into()));
        assert_eq!(split_constraint("!=1.5", Operator::Eq), (Operator::None, "!=1.5".into()));
        assert_eq!(
            split_constraint("dev-master", Operator::Eq),
            (Operator::None, "dev-master".into())
        );
    }

    #[test]
    fn test_operator_without_version_is_unconstrained() {
        assert_eq!(split_constraint(">=", Operator::Eq), (Operator::None, String::new()));
        assert_eq!(split_constraint("^", Operator::Eq), (Operator::None, String::new()));
        assert_eq!(split_constraint("~> ", Operator::Eq), (Operator::None, String::new()));
        assert_eq!(Requirement::new("a", Operator::Eq, ""), Requirement::named("a"));
        assert_eq!(Requirement::constrained("b", ">=", Operator::Eq), Requirement::named("b"));
    }

    #[test]
    fn test_xml_elements_merges_attributes_and_children() {
        let xml = r#"<Project>
            <ItemGroup>
                <PackageReference Include="Serilog" Version="2.10.0" />
                <PackageReference Include="Dapper">
                    <Version>2.0.123</Version>
                </PackageReference>
            </ItemGroup>
        </Project>"#;
        let elements = xml_elements(xml, "PackageReference").unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0]["Include"], "Serilog");
        assert_eq!(elements[0]["Version"], "2.10.0");
        assert_eq!(elements[1]["Include"], "Dapper");
        assert_eq!(elements[1]["Version"], "2.0.123");
    }

    #[test]
    fn test_xml_elements_rejects_mismatched_tags() {
        assert!(xml_elements("<a><b></a>", "b").is_none());
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let reqs = vec![
            Requirement::pinned("a", "1"),
            Requirement::pinned("b", "1"),
            Requirement::pinned("a", "1"),
        ];
        let names: Vec<String> = dedupe(reqs).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
