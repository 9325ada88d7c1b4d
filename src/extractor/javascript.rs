//! JavaScript manifests: npm, Yarn, pnpm, Bower and webpack configs.

use super::common::{dedupe, json_dependency_map, parse_json, parse_yaml, Requirement};
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_MODULE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:\brequire\(\s*|\bfrom\s+|\bimport\s+)['"]([^'"]+)['"]"#).unwrap()
});

const NODE_BUILTINS: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "module",
    "net", "os", "path", "process", "querystring", "stream", "url", "util", "vm", "zlib",
];

/// npm reads a bare version as an exact pin. Tags, URLs and protocol
/// specifiers (`github:`, `file:`, `workspace:`) are kept as written.
fn npm_constraint(name: &str, spec: &str) -> Requirement {
    if spec.contains(':') || spec.contains('/') {
        return Requirement::new(name, Operator::None, spec.trim());
    }
    Requirement::constrained(name, spec, Operator::Eq)
}

const MANIFEST_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

pub fn package_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };
    MANIFEST_SECTIONS
        .iter()
        .flat_map(|section| json_dependency_map(doc.get(*section), npm_constraint))
        .collect()
}

pub fn bower_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };
    ["dependencies", "devDependencies"]
        .iter()
        .flat_map(|section| json_dependency_map(doc.get(*section), npm_constraint))
        .collect()
}

/// Lockfile v2/v3 lists installs under `packages` keyed by their
/// `node_modules/...` path; v1 only has the nested `dependencies` map.
pub fn package_lock_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };

    if let Some(packages) = doc.get("packages").and_then(|p| p.as_object()) {
        return packages
            .iter()
            .filter(|(path, _)| !path.is_empty())
            .filter_map(|(path, info)| {
                let name = info
                    .get("name")
                    .and_then(|n| n.as_str())
                    .or_else(|| path.rsplit("node_modules/").next())?;
                let version = info.get("version").and_then(|v| v.as_str()).unwrap_or_default();
                Some(Requirement::pinned(name, version))
            })
            .collect();
    }

    doc.get("dependencies")
        .and_then(|d| d.as_object())
        .map(|deps| {
            deps.iter()
                .map(|(name, info)| {
                    let version = info.get("version").and_then(|v| v.as_str()).unwrap_or_default();
                    Requirement::pinned(name, version)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Package name from a yarn.lock entry header such as
/// `"@babel/core@^7.0.0", "@babel/core@^7.1.0"` or `lodash@npm:^4.17.21`.
fn yarn_entry_name(header: &str) -> Option<String> {
    let first = header.split(',').next()?.trim().trim_matches('"');
    let at = first.get(1..)?.find('@')? + 1;
    Some(first[..at].to_string())
}

/// Handles both the classic (`version "1.2.3"`) and Berry (`version: 1.2.3`)
/// lockfile layouts.
pub fn yarn_lock(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            current = line
                .trim_end()
                .strip_suffix(':')
                .and_then(yarn_entry_name);
            continue;
        }

        let Some(name) = current.as_ref() else {
            continue;
        };
        let Some(rest) = line.trim().strip_prefix("version") else {
            continue;
        };
        if !rest.starts_with([' ', ':']) {
            continue;
        }
        let version = rest.trim_start_matches(':').trim().trim_matches('"');
        if !version.is_empty() {
            requirements.push(Requirement::pinned(name.clone(), version));
            current = None;
        }
    }

    requirements
}

/// Reduces an import specifier to its package: `lodash/fp` is `lodash`,
/// `@scope/pkg/sub` is `@scope/pkg`.
fn package_of(specifier: &str) -> String {
    let mut segments = specifier.split('/');
    match (segments.next(), segments.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{}/{}", scope, name),
        (Some(name), _) => name.to_string(),
        _ => specifier.to_string(),
    }
}

pub fn webpack_config_js(content: &str) -> Vec<Requirement> {
    let requirements = RE_MODULE_IMPORT
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|spec| {
            !spec.starts_with('.') && !spec.starts_with('/') && !spec.starts_with("node:")
        })
        .map(package_of)
        .filter(|name| !NODE_BUILTINS.contains(&name.as_str()))
        .map(Requirement::named)
        .collect();
    dedupe(requirements)
}

/// Splits a pnpm package key. Covers `/name/1.0.0` (lockfile v5),
/// `/name@1.0.0` (v6) and `name@1.0.0` (v9), with or without a scope and a
/// peer suffix.
fn pnpm_package_key(key: &str) -> Option<(String, String)> {
    let key = key.trim_start_matches('/');
    let key = key.split('(').next()?;

    let (head, last) = key.rsplit_once('/').unwrap_or(("", key));
    if !head.is_empty() && last.starts_with(|c: char| c.is_ascii_digit()) {
        let version = last.split('_').next().unwrap_or(last);
        return Some((head.to_string(), version.to_string()));
    }

    let at = key.get(1..)?.find('@')? + 1;
    Some((key[..at].to_string(), key[at + 1..].to_string()))
}

pub fn pnpm_lock_yaml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    let Some(packages) = doc.get("packages").and_then(|p| p.as_mapping()) else {
        return Vec::new();
    };

    packages
        .iter()
        .filter_map(|(key, info)| {
            let (name, key_version) = pnpm_package_key(key.as_str()?)?;
            let version = info
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(key_version);
            Some(Requirement::pinned(name, version))
        })
        .collect()
}
