//! NuGet and Paket manifests.

use super::common::{dedupe, json_dependency_map, parse_json, xml_elements, Requirement};
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_PAKET_RESOLVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^    (\S+) \(([^)]+)\)").unwrap());

const PAKET_KEYWORDS: &[&str] = &[
    "source", "group", "framework", "storage", "references", "strategy", "lowest_matching",
    "content", "redirects", "github", "gist", "http", "git", "clitool", "generate_load_scripts",
];

/// NuGet version notation. A plain version is a minimum; brackets give
/// inclusive or exclusive bounds, and `[1.2.3]` is an exact pin. Only the
/// lower bound is kept when both are present.
fn nuget_range(name: &str, spec: &str) -> Requirement {
    let spec = spec.trim();
    if spec.is_empty() {
        return Requirement::named(name);
    }
    if !spec.starts_with(['[', '(']) {
        return Requirement::constrained(name, spec, Operator::Ge);
    }

    let inclusive_low = spec.starts_with('[');
    let inclusive_high = spec.ends_with(']');
    let inner = spec[1..].trim_end_matches([']', ')']);

    let Some((low, high)) = inner.split_once(',') else {
        return Requirement::pinned(name, inner.trim());
    };
    let (low, high) = (low.trim(), high.trim());

    if !low.is_empty() {
        let op = if inclusive_low { Operator::Ge } else { Operator::Gt };
        Requirement::new(name, op, low)
    } else if !high.is_empty() {
        let op = if inclusive_high { Operator::Le } else { Operator::Lt };
        Requirement::new(name, op, high)
    } else {
        Requirement::named(name)
    }
}

pub fn packages_config(content: &str) -> Vec<Requirement> {
    xml_elements(content, "package")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|fields| {
            let id = fields.get("id")?;
            let version = fields.get("version").cloned().unwrap_or_default();
            Some(Requirement::pinned(id.clone(), version))
        })
        .collect()
}

/// Legacy `project.json`: top-level dependencies plus per-framework ones.
pub fn project_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };

    let mut requirements = json_dependency_map(doc.get("dependencies"), nuget_range);
    if let Some(frameworks) = doc.get("frameworks").and_then(|f| f.as_object()) {
        for framework in frameworks.values() {
            requirements.extend(json_dependency_map(framework.get("dependencies"), nuget_range));
        }
    }
    requirements
}

/// `PackageReference` items of an SDK-style project.
pub fn csproj(content: &str) -> Vec<Requirement> {
    xml_elements(content, "PackageReference")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|fields| {
            let name = fields.get("Include").or_else(|| fields.get("Update"))?;
            let version = fields.get("Version").map(String::as_str).unwrap_or_default();
            Some(nuget_range(name, version))
        })
        .collect()
}

pub fn nuspec(content: &str) -> Vec<Requirement> {
    xml_elements(content, "dependency")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|fields| {
            let id = fields.get("id")?;
            let version = fields.get("version").map(String::as_str).unwrap_or_default();
            Some(nuget_range(id, version))
        })
        .collect()
}

fn split_library_key(key: &str) -> Option<Requirement> {
    let (name, version) = key.split_once('/')?;
    Some(Requirement::pinned(name, version))
}

/// `obj/project.assets.json`. Libraries are keyed `Name/Version`; older
/// restores only fill in `targets`.
pub fn project_assets_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };

    if let Some(libraries) = doc.get("libraries").and_then(|l| l.as_object()) {
        let found: Vec<Requirement> = libraries
            .iter()
            .filter(|(_, info)| {
                info.get("type").and_then(|t| t.as_str()).unwrap_or("package") == "package"
            })
            .filter_map(|(key, _)| split_library_key(key))
            .collect();
        if !found.is_empty() {
            return found;
        }
    }

    let found = doc
        .get("targets")
        .and_then(|t| t.as_object())
        .into_iter()
        .flat_map(|targets| targets.values())
        .filter_map(|target| target.as_object())
        .flat_map(|libraries| libraries.keys())
        .filter_map(|key| split_library_key(key))
        .collect();
    dedupe(found)
}

/// `packages.lock.json` lists the resolved graph once per target framework.
pub fn packages_lock_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };

    let found = doc
        .get("dependencies")
        .and_then(|d| d.as_object())
        .into_iter()
        .flat_map(|frameworks| frameworks.values())
        .filter_map(|framework| framework.as_object())
        .flat_map(|packages| packages.iter())
        .filter(|(_, info)| info.get("type").and_then(|t| t.as_str()) != Some("Project"))
        .map(|(name, info)| {
            let resolved = info.get("resolved").and_then(|r| r.as_str()).unwrap_or_default();
            Requirement::pinned(name, resolved)
        })
        .collect();
    dedupe(found)
}

/// A `nuget Name [constraint] [options]` line. Option tokens end in `:`
/// (`framework:`, `restriction:`) and close the constraint.
fn paket_nuget_line(rest: &str) -> Option<Requirement> {
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?;
    let constraint: Vec<&str> = tokens.take_while(|token| !token.ends_with(':')).collect();
    if constraint.is_empty() {
        return Some(Requirement::named(name));
    }
    Some(Requirement::constrained(name, &constraint.join(" "), Operator::Ge))
}

fn paket_lines(content: &str, allow_bare_names: bool) -> Vec<Requirement> {
    let requirements = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix("nuget ") {
                return paket_nuget_line(rest);
            }
            let mut tokens = line.split_whitespace();
            let first = tokens.next()?;
            let single = tokens.next().is_none();
            let plain = !first.contains([':', '/']) && !PAKET_KEYWORDS.contains(&first);
            (allow_bare_names && single && plain).then(|| Requirement::named(first))
        })
        .collect();
    dedupe(requirements)
}

/// Paket references-style file: `nuget` lines plus bare package names.
pub fn paket(content: &str) -> Vec<Requirement> {
    paket_lines(content, true)
}

pub fn paket_dependencies(content: &str) -> Vec<Requirement> {
    paket_lines(content, false)
}

/// Resolved packages in `paket.lock` are indented four spaces; their
/// transitive constraints are indented further.
pub fn paket_lock(content: &str) -> Vec<Requirement> {
    let requirements = RE_PAKET_RESOLVED
        .captures_iter(content)
        .map(|caps| Requirement::pinned(&caps[1], caps[2].trim()))
        .collect();
    dedupe(requirements)
}
