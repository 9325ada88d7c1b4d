//! CocoaPods, Swift Package Manager and Carthage manifests.

use super::common::Requirement;
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_POD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*pod\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).unwrap()
});

static RE_LOCKED_POD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^  - "?([^\s"(]+) \(([^)]+)\)"?:?\s*$"#).unwrap());

static RE_SWIFT_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"url:\s*"([^"]+)""#).unwrap());

static RE_SWIFT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"name:\s*"([^"]+)""#).unwrap());

static RE_SWIFT_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:\.?(exact|upToNextMinor|upToNextMajor|branch|revision)\s*\(?\s*(?:from\s*:\s*)?|\b(from|exact|branch|revision)\s*:\s*)"([^"]+)""#,
    )
    .unwrap()
});

static RE_SWIFT_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*\.\.[.<]\s*"[^"]+""#).unwrap());

static RE_CARTFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(github|git|binary)\s+"([^"]+)"(?:\s+(.+?))?\s*$"#).unwrap()
});

pub fn podfile(content: &str) -> Vec<Requirement> {
    RE_POD
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

/// Installed pods from the `PODS:` section. Subspec dependencies are nested
/// one level deeper and skipped.
pub fn podfile_lock(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_pods = false;

    for line in content.lines() {
        if !line.starts_with(char::is_whitespace) && !line.is_empty() {
            in_pods = line.trim_end() == "PODS:";
            continue;
        }
        if !in_pods {
            continue;
        }
        if let Some(caps) = RE_LOCKED_POD.captures(line) {
            requirements.push(Requirement::pinned(&caps[1], &caps[2]));
        }
    }

    requirements
}

/// Repository identity without scheme or `.git`, e.g.
/// `github.com/apple/swift-nio`.
fn repository_name(url: &str) -> String {
    let url = url.trim();
    let url = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let url = url.strip_prefix("git@").unwrap_or(url).replacen(':', "/", 1);
    url.trim_end_matches('/').trim_end_matches(".git").to_string()
}

/// Body of each `.package(...)` call, honouring nested parentheses.
fn package_calls(content: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut search = 0;

    while let Some(found) = content[search..].find(".package(") {
        let start = search + found + ".package(".len();
        let mut depth = 1usize;
        let mut end = None;
        for (offset, c) in content[start..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(start + offset);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            break;
        };
        bodies.push(&content[start..end]);
        search = end;
    }

    bodies
}

fn swift_rule(body: &str, name: String) -> Requirement {
    if let Some(caps) = RE_SWIFT_RANGE.captures(body) {
        return Requirement::new(name, Operator::Ge, &caps[1]);
    }
    let Some(caps) = RE_SWIFT_RULE.captures(body) else {
        return Requirement::named(name);
    };
    let rule = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or_default();
    let version = &caps[3];
    let operator = match rule {
        "exact" => Operator::Eq,
        "upToNextMinor" => Operator::Tilde,
        "upToNextMajor" | "from" => Operator::Caret,
        _ => Operator::None,
    };
    Requirement::new(name, operator, version)
}

/// Package dependencies declared in a Swift package manifest.
pub fn packages_swift(content: &str) -> Vec<Requirement> {
    package_calls(content)
        .into_iter()
        .filter_map(|body| {
            let url = RE_SWIFT_URL.captures(body).map(|caps| repository_name(&caps[1]));
            let name =
                url.or_else(|| RE_SWIFT_NAME.captures(body).map(|caps| caps[1].to_string()))?;
            Some(swift_rule(body, name))
        })
        .collect()
}

/// `github "owner/repo" ~> 1.0`, `git "url" "branch"` or `binary "url" 1.0`.
/// A quoted trailing value names a branch or commit.
pub fn cartfile(content: &str) -> Vec<Requirement> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default();
            let caps = RE_CARTFILE.captures(line)?;
            let name = match &caps[1] {
                "github" if !caps[2].contains("://") => {
                    format!("github.com/{}", caps[2].trim_end_matches(".git"))
                }
                _ => repository_name(&caps[2]),
            };
            let Some(spec) = caps.get(3).map(|m| m.as_str().trim()) else {
                return Some(Requirement::named(name));
            };
            if spec.starts_with('"') {
                return Some(Requirement::new(name, Operator::None, spec.trim_matches('"')));
            }
            Some(Requirement::constrained(name, spec, Operator::Eq))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_podfile() {
        let content = r#"
platform :ios, '14.0'
target 'App' do
  use_frameworks!
  pod 'Alamofire', '~> 5.6'
  pod 'SwiftyJSON'
  pod 'Kingfisher', :git => 'https://github.com/onevcat/Kingfisher.git'
  pod "Firebase/Analytics", "10.15.0"
end
"#;
        assert_eq!(
            podfile(content),
            vec![
                Requirement::new("Alamofire", Operator::Tilde, "5.6"),
                Requirement::named("SwiftyJSON"),
                Requirement::named("Kingfisher"),
                Requirement::new("Firebase/Analytics", Operator::Eq, "10.15.0"),
            ]
        );
    }

    #[test]
    fn test_podfile_lock_pods_section_only() {
        let content = r#"PODS:
  - Alamofire (5.6.4)
  - "Firebase/Analytics (10.15.0)":
    - FirebaseAnalytics (= 10.15.0)
  - SwiftyJSON (5.0.1)

DEPENDENCIES:
  - Alamofire (~> 5.6)

SPEC CHECKSUMS:
  Alamofire: 4e95d97098eacb88856099c4fc79b526a299e48c

COCOAPODS: 1.12.1
"#;
        assert_eq!(
            podfile_lock(content),
            vec![
                Requirement::pinned("Alamofire", "5.6.4"),
                Requirement::pinned("Firebase/Analytics", "10.15.0"),
                Requirement::pinned("SwiftyJSON", "5.0.1"),
            ]
        );
    }

    #[test]
    fn test_packages_swift_rules() {
        let content = r#"// swift-tools-version:5.7
import PackageDescription

let package = Package(
    name: "App",
    dependencies: [
        .package(url: "https://github.com/apple/swift-nio.git", from: "2.58.0"),
        .package(url: "https://github.com/vapor/vapor.git", .upToNextMinor(from: "4.77.0")),
        .package(url: "https://github.com/pointfreeco/swift-tagged", exact: "0.10.0"),
        .package(url: "https://github.com/jpsim/Yams.git", "5.0.0"..<"6.0.0"),
        .package(url: "git@github.com:org/private.git", branch: "main"),
        .package(path: "../Local"),
    ],
    targets: [.target(name: "App", dependencies: [.product(name: "NIO", package: "swift-nio")])]
)
"#;
        assert_eq!(
            packages_swift(content),
            vec![
                Requirement::new("github.com/apple/swift-nio", Operator::Caret, "2.58.0"),
                Requirement::new("github.com/vapor/vapor", Operator::Tilde, "4.77.0"),
                Requirement::new("github.com/pointfreeco/swift-tagged", Operator::Eq, "0.10.0"),
                Requirement::new("github.com/jpsim/Yams", Operator::Ge, "5.0.0"),
                Requirement::new("github.com/org/private", Operator::None, "main"),
            ]
        );
    }

    #[test]
    fn test_cartfile() {
        let content = r#"# Networking
github "Alamofire/Alamofire" ~> 5.6
github "ReactiveX/RxSwift" "main"
git "https://enterprise.local/lib.git" >= 1.0
binary "https://example.com/Framework.json" == 2.3.0
github "Quick/Nimble"
"#;
        assert_eq!(
            cartfile(content),
            vec![
                Requirement::new("github.com/Alamofire/Alamofire", Operator::Tilde, "5.6"),
                Requirement::new("github.com/ReactiveX/RxSwift", Operator::None, "main"),
                Requirement::new("enterprise.local/lib", Operator::Ge, "1.0"),
                Requirement::new("example.com/Framework.json", Operator::Eq, "2.3.0"),
                Requirement::named("github.com/Quick/Nimble"),
            ]
        );
    }
}
