//! Composer manifests.

use super::common::{parse_json, Requirement};
use crate::model::Operator;

/// Platform requirements (`php`, `ext-json`) have no vendor prefix and are
/// not packages.
fn is_package(name: &str) -> bool {
    name.contains('/')
}

fn composer_constraint(name: &str, spec: &str) -> Requirement {
    Requirement::constrained(name, spec, Operator::Eq)
}

pub fn composer_json(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };
    ["require", "require-dev"]
        .iter()
        .filter_map(|section| doc.get(*section).and_then(|s| s.as_object()))
        .flat_map(|map| map.iter())
        .filter(|(name, _)| is_package(name))
        .map(|(name, spec)| composer_constraint(name, spec.as_str().unwrap_or_default()))
        .collect()
}

pub fn composer_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };
    ["packages", "packages-dev"]
        .iter()
        .filter_map(|section| doc.get(*section).and_then(|s| s.as_array()))
        .flatten()
        .filter_map(|package| {
            let name = package.get("name")?.as_str()?;
            let version = package.get("version").and_then(|v| v.as_str()).unwrap_or_default();
            Some(Requirement::pinned(name, version))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composer_json_skips_platform_requirements() {
        let content = r#"{
            "require": {
                "php": ">=8.1",
                "ext-mbstring": "*",
                "laravel/framework": "^10.10",
                "guzzlehttp/guzzle": "7.8.0"
            },
            "require-dev": {"phpunit/phpunit": "~10.1"}
        }"#;
        assert_eq!(
            composer_json(content),
            vec![
                Requirement::new("laravel/framework", Operator::Caret, "10.10"),
                Requirement::new("guzzlehttp/guzzle", Operator::Eq, "7.8.0"),
                Requirement::new("phpunit/phpunit", Operator::Tilde, "10.1"),
            ]
        );
    }

    #[test]
    fn test_composer_lock() {
        let content = r#"{
            "packages": [{"name": "monolog/monolog", "version": "3.4.0"}],
            "packages-dev": [{"name": "mockery/mockery", "version": "1.6.6"}]
        }"#;
        assert_eq!(
            composer_lock(content),
            vec![
                Requirement::pinned("monolog/monolog", "3.4.0"),
                Requirement::pinned("mockery/mockery", "1.6.6"),
            ]
        );
    }
}
