//! Python manifests: pip requirements, Poetry/PEP 621 pyproject, Pipenv,
//! setuptools and conda environments.

use super::common::{parse_json, parse_toml, parse_yaml, split_constraint, Requirement};
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_REQUIREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*(.*)$").unwrap()
});

static RE_INSTALL_REQUIRES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"install_requires\s*=\s*\[").unwrap());

static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Reads one PEP 508 requirement such as `requests[socks]>=2.0; python_version>"3"`.
///
/// Direct references (`name @ url`) keep the name only. Anything that is not a
/// requirement (VCS URLs, paths) yields `None`.
pub(super) fn requirement_spec(spec: &str) -> Option<Requirement> {
    let spec = spec.split(';').next().unwrap_or_default().trim();
    let caps = RE_REQUIREMENT.captures(spec)?;
    let name = caps.get(1)?.as_str();
    let rest = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .unwrap_or_default()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();

    if rest.is_empty() || rest.starts_with('@') {
        return Some(Requirement::named(name));
    }
    if !rest.starts_with(|c: char| "<>=!~".contains(c)) {
        return None;
    }

    let (operator, version) = split_constraint(rest, Operator::None);
    Some(Requirement::new(name, operator, version))
}

pub fn requirements_txt(content: &str) -> Vec<Requirement> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.starts_with('#') || line.starts_with('-') {
                return None;
            }
            let line = line
                .split(" #")
                .next()
                .unwrap_or_default()
                .trim_end_matches('\\')
                .trim();
            if line.is_empty() {
                return None;
            }
            requirement_spec(line)
        })
        .collect()
}

/// Reads a Poetry-style `name = constraint` table. `python` is the
/// interpreter, not a dependency.
fn poetry_table(table: Option<&toml::Value>) -> Vec<Requirement> {
    let Some(table) = table.and_then(|t| t.as_table()) else {
        return Vec::new();
    };

    table
        .iter()
        .filter(|(name, _)| name.as_str() != "python")
        .map(|(name, value)| match value {
            toml::Value::String(spec) => Requirement::constrained(name, spec, Operator::Eq),
            toml::Value::Table(fields) => match fields.get("version").and_then(|v| v.as_str()) {
                Some(spec) => Requirement::constrained(name, spec, Operator::Eq),
                None => Requirement::named(name),
            },
            _ => Requirement::named(name),
        })
        .collect()
}

fn pep508_array(value: Option<&toml::Value>) -> Vec<Requirement> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .filter_map(requirement_spec)
                .collect()
        })
        .unwrap_or_default()
}

pub fn pyproject_toml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_toml(content) else {
        return Vec::new();
    };
    let mut requirements = Vec::new();

    if let Some(project) = doc.get("project") {
        requirements.extend(pep508_array(project.get("dependencies")));
        if let Some(extras) = project
            .get("optional-dependencies")
            .and_then(|o| o.as_table())
        {
            for group in extras.values() {
                requirements.extend(pep508_array(Some(group)));
            }
        }
    }

    if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) {
        requirements.extend(poetry_table(poetry.get("dependencies")));
        requirements.extend(poetry_table(poetry.get("dev-dependencies")));
        if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
            for group in groups.values() {
                requirements.extend(poetry_table(group.get("dependencies")));
            }
        }
    }

    requirements
}

pub fn pipfile(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_toml(content) else {
        return Vec::new();
    };
    let mut requirements = poetry_table(doc.get("packages"));
    requirements.extend(poetry_table(doc.get("dev-packages")));
    requirements
}

pub fn pipfile_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };

    ["default", "develop"]
        .iter()
        .filter_map(|section| doc.get(*section).and_then(|s| s.as_object()))
        .flat_map(|packages| {
            packages.iter().map(|(name, info)| {
                match info.get("version").and_then(|v| v.as_str()) {
                    Some(spec) => Requirement::constrained(name, spec, Operator::Eq),
                    None => Requirement::named(name),
                }
            })
        })
        .collect()
}

/// Body of a list literal starting at `start`, up to the bracket that closes
/// it. Brackets inside quoted strings (`requests[socks]`) do not count.
fn list_body(content: &str, start: usize) -> Option<&str> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (offset, c) in content[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn setup_py(content: &str) -> Vec<Requirement> {
    RE_INSTALL_REQUIRES
        .find_iter(content)
        .filter_map(|m| list_body(content, m.end()))
        .flat_map(|body| {
            RE_QUOTED
                .captures_iter(body)
                .filter_map(|item| item.get(1).and_then(|m| requirement_spec(m.as_str())))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `install_requires` in setup.cfg is either an inline comma list or a block
/// of indented continuation lines.
pub fn setup_cfg(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if in_block {
            if trimmed.is_empty() {
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                requirements.extend(requirement_spec(trimmed));
                continue;
            }
            in_block = false;
        }

        if let Some(value) = trimmed
            .strip_prefix("install_requires")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='))
        {
            in_block = true;
            requirements.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .filter_map(requirement_spec),
            );
        }
    }

    requirements
}

/// Reads a conda spec: `[channel::]name[op]version[=build]`.
fn conda_spec(spec: &str) -> Option<Requirement> {
    let spec = spec.rsplit("::").next().unwrap_or(spec).trim();
    let caps = RE_REQUIREMENT.captures(spec)?;
    let name = caps.get(1)?.as_str();
    let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    if rest.is_empty() {
        return Some(Requirement::named(name));
    }

    let (operator, version) = split_constraint(rest, Operator::Eq);
    let version = version.split('=').next().unwrap_or_default().to_string();
    Some(Requirement::new(name, operator, version))
}

pub fn environment_yml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    let Some(dependencies) = doc.get("dependencies").and_then(|d| d.as_sequence()) else {
        return Vec::new();
    };

    let mut requirements = Vec::new();
    for dependency in dependencies {
        match dependency {
            serde_yaml_ng::Value::String(spec) => requirements.extend(conda_spec(spec)),
            serde_yaml_ng::Value::Mapping(nested) => {
                for specs in nested.values().filter_map(|v| v.as_sequence()) {
                    requirements.extend(
                        specs
                            .iter()
                            .filter_map(|s| s.as_str())
                            .filter_map(requirement_spec),
                    );
                }
            }
            _ => {}
        }
    }
    requirements
}
