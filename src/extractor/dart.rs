//! Dart and Flutter pubspecs.

use super::common::{parse_yaml, Requirement};
use crate::model::Operator;
use serde_yaml_ng::Value;

/// Hosted dependencies carry a version constraint, either directly or under
/// `version`. SDK, path and git dependencies have none.
fn pub_dependency(name: &str, value: &Value) -> Requirement {
    let spec = match value {
        Value::Mapping(_) => value.get("version"),
        other => Some(other),
    };
    let spec = match spec {
        Some(Value::String(spec)) => spec.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };
    match spec.as_str() {
        "" | "any" => Requirement::named(name),
        spec => Requirement::constrained(name, spec, Operator::Eq),
    }
}

pub fn pubspec_yaml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    ["dependencies", "dev_dependencies"]
        .iter()
        .filter_map(|section| doc.get(*section).and_then(|s| s.as_mapping()))
        .flat_map(|deps| deps.iter())
        .filter_map(|(name, value)| Some(pub_dependency(name.as_str()?, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubspec_dependency_shapes() {
        let content = "\
name: app
environment:
  sdk: '>=3.0.0 <4.0.0'
dependencies:
  flutter:
    sdk: flutter
  http: ^1.1.0
  intl: 0.18.1
  collection: any
  shared:
    path: ../shared
  dio:
    hosted: https://pub.dev
    version: '>=5.0.0 <6.0.0'
dev_dependencies:
  lints:
";
        assert_eq!(
            pubspec_yaml(content),
            vec![
                Requirement::named("flutter"),
                Requirement::new("http", Operator::Caret, "1.1.0"),
                Requirement::new("intl", Operator::Eq, "0.18.1"),
                Requirement::named("collection"),
                Requirement::named("shared"),
                Requirement::new("dio", Operator::Ge, "5.0.0"),
                Requirement::named("lints"),
            ]
        );
    }

    #[test]
    fn test_pubspec_malformed() {
        assert!(pubspec_yaml("dependencies: [http").is_empty());
        assert!(pubspec_yaml("- just\n- a list\n").is_empty());
    }
}
