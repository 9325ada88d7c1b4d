//! Bundler manifests.

use super::common::Requirement;
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_GEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*gem\s*\(?\s*['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).unwrap()
});

/// Resolved specs in Gemfile.lock sit four spaces deep; their own
/// dependencies are indented further and are not matched.
static RE_LOCKED_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^    ([^\s(]+) \(([^)]+)\)\s*$").unwrap());

pub fn gemfile(content: &str) -> Vec<Requirement> {
    RE_GEM
        .captures_iter(content)
        .map(|caps| {
            let name = &caps[1];
            match caps.get(2) {
                Some(spec) => Requirement::constrained(name, spec.as_str(), Operator::Eq),
                None => Requirement::named(name),
            }
        })
        .collect()
}

pub fn gemfile_lock(content: &str) -> Vec<Requirement> {
    RE_LOCKED_SPEC
        .captures_iter(content)
        .map(|caps| {
            // Platform-specific gems carry a suffix: `nokogiri (1.15.4-x86_64-linux)`.
            let version = caps[2].split('-').next().unwrap_or_default();
            Requirement::pinned(&caps[1], version)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemfile() {
        let content = r#"source "https://rubygems.org"

gem "rails", "~> 7.0.4"
gem 'pg', '>= 0.18', '< 2.0'
gem "puma"
  gem("bootsnap", "1.16.0", require: false)
# gem "commented"
"#;
        assert_eq!(
            gemfile(content),
            vec![
                Requirement::new("rails", Operator::Tilde, "7.0.4"),
                Requirement::new("pg", Operator::Ge, "0.18"),
                Requirement::named("puma"),
                Requirement::new("bootsnap", Operator::Eq, "1.16.0"),
            ]
        );
    }

    #[test]
    fn test_gemfile_lock_top_level_specs() {
        let content = "\
GEM
  remote: https://rubygems.org/
  specs:
    actioncable (7.0.4)
      actionpack (= 7.0.4)
      nio4r (~> 2.0)
    nokogiri (1.15.4-x86_64-linux)
      racc (~> 1.4)

PLATFORMS
  x86_64-linux

DEPENDENCIES
  rails (~> 7.0.4)
";
        assert_eq!(
            gemfile_lock(content),
            vec![
                Requirement::pinned("actioncable", "7.0.4"),
                Requirement::pinned("nokogiri", "1.15.4"),
            ]
        );
    }
}
