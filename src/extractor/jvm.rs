//! Maven, Gradle and Ant/Ivy build files.

use super::common::{ordered_captures, xml_elements, Requirement};
use crate::model::Operator;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Captures, Regex};
use std::collections::HashMap;

static RE_LOCK_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([^#\s:=]+):([^:=\s]+):([^:=\s]+)=").unwrap());

static RE_GRADLE_COORDINATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:implementation|api|compile|compileOnly|compileOnlyApi|runtime|runtimeOnly|testImplementation|testCompile|testCompileOnly|testRuntimeOnly|annotationProcessor|kapt|ksp|classpath)\s*\(?\s*['"]([^'":\s]+):([^'":\s]+)(?::([^'":@\s]+))?[^'"]*['"]"#,
    )
    .unwrap()
});

static RE_GRADLE_MAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\bgroup\s*[:=]\s*['"]([^'"]+)['"]\s*,\s*name\s*[:=]\s*['"]([^'"]+)['"](?:\s*,\s*version\s*[:=]\s*['"]([^'"]+)['"])?"#,
    )
    .unwrap()
});

static RE_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*include\b(.*)$").unwrap());

static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

static RE_PROPERTY_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

fn coordinate(group: &str, artifact: &str) -> String {
    format!("{}:{}", group, artifact)
}

/// Maven and Gradle read a plain version as an exact pin. Interval
/// notation (`[1.0,2.0)`) and dynamic versions (`1.+`) are kept as written.
fn jvm_version(name: String, version: &str) -> Requirement {
    let version = version.trim();
    if version.starts_with(['[', '(']) || version.contains('+') || version.contains("${") {
        return Requirement::new(name, Operator::None, version);
    }
    Requirement::pinned(name, version)
}

#[derive(Default)]
struct PomDependency {
    group: String,
    artifact: String,
    version: String,
}

/// Reads every `<dependency>` in a POM, including those under
/// `dependencyManagement` and plugins. `${...}` references are resolved
/// against `<properties>` and the project's own version; unknown
/// references are left as written.
pub fn pom_xml(content: &str) -> Vec<Requirement> {
    let mut reader = Reader::from_str(content);
    let mut path: Vec<String> = Vec::new();
    let mut properties: HashMap<String, String> = HashMap::new();
    let mut dependencies = Vec::new();
    let mut current: Option<PomDependency> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "dependency" {
                    current = Some(PomDependency::default());
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("dependency") {
                    dependencies.extend(current.take());
                }
            }
            Ok(Event::Text(t)) => {
                let Ok(text) = t.unescape() else {
                    return Vec::new();
                };
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let depth = path.len();
                let leaf = path.last().map(String::as_str).unwrap_or_default();
                let parent = depth
                    .checked_sub(2)
                    .and_then(|i| path.get(i))
                    .map(String::as_str)
                    .unwrap_or_default();

                if parent == "dependency" {
                    if let Some(dep) = current.as_mut() {
                        match leaf {
                            "groupId" => dep.group = text.to_string(),
                            "artifactId" => dep.artifact = text.to_string(),
                            "version" => dep.version = text.to_string(),
                            _ => {}
                        }
                    }
                } else if depth == 3 && parent == "properties" {
                    properties.insert(leaf.to_string(), text.to_string());
                } else if depth == 2 && leaf == "version" {
                    properties.insert("project.version".to_string(), text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("invalid POM: {}", e);
                return Vec::new();
            }
            _ => {}
        }
    }

    let resolve = |value: &str| {
        RE_PROPERTY_REF
            .replace_all(value, |caps: &Captures| {
                properties
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    };

    dependencies
        .into_iter()
        .filter(|dep| !dep.artifact.is_empty())
        .map(|dep| {
            let name = coordinate(&resolve(&dep.group), &resolve(&dep.artifact));
            jvm_version(name, &resolve(&dep.version))
        })
        .collect()
}

/// Version catalog style properties: `kotlinVersion=1.9.0` or
/// `okhttp.version=4.12.0` declare a version for `kotlin` and `okhttp`.
pub fn gradle_properties(content: &str) -> Vec<Requirement> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(['#', '!']))
        .filter_map(|line| {
            let (key, value) = line.split_once(['=', ':'])?;
            let key = key.trim();
            let stem = key
                .len()
                .checked_sub("version".len())
                .filter(|&at| key.is_char_boundary(at))
                .filter(|&at| key[at..].eq_ignore_ascii_case("version"))
                .map(|at| key[..at].trim_end_matches(['.', '_', '-']))?;
            if stem.is_empty() {
                return None;
            }
            Some(jvm_version(stem.to_string(), value))
        })
        .collect()
}

pub fn gradle_lockfile(content: &str) -> Vec<Requirement> {
    RE_LOCK_ENTRY
        .captures_iter(content)
        .map(|caps| Requirement::pinned(coordinate(&caps[1], &caps[2]), &caps[3]))
        .collect()
}

fn gradle_dependency(caps: &Captures) -> Option<Requirement> {
    let name = coordinate(caps.get(1)?.as_str(), caps.get(2)?.as_str());
    Some(match caps.get(3) {
        Some(version) => jvm_version(name, version.as_str()),
        None => Requirement::named(name),
    })
}

/// Handles both the Groovy and Kotlin DSLs.
pub fn build_gradle(content: &str) -> Vec<Requirement> {
    ordered_captures(
        content,
        &[
            (&*RE_GRADLE_COORDINATE, gradle_dependency),
            (&*RE_GRADLE_MAP, gradle_dependency),
        ],
    )
}

/// Included subprojects, reported without their leading `:`.
pub fn settings_gradle(content: &str) -> Vec<Requirement> {
    RE_INCLUDE
        .captures_iter(content)
        .flat_map(|caps| {
            let args = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            RE_QUOTED
                .captures_iter(args)
                .map(|quoted| {
                    let module = quoted[1].trim_start_matches(':');
                    Requirement::named(module)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Ivy dependencies declared in an Ant build file.
pub fn build_xml(content: &str) -> Vec<Requirement> {
    let Some(elements) = xml_elements(content, "dependency") else {
        return Vec::new();
    };
    elements
        .into_iter()
        .filter_map(|fields| {
            let artifact = fields.get("name")?;
            let name = match fields.get("org") {
                Some(org) => coordinate(org, artifact),
                None => artifact.clone(),
            };
            let rev = fields.get("rev").map(String::as_str).unwrap_or_default();
            Some(jvm_version(name, rev))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pom_resolves_properties() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <groupId>com.example</groupId>
  <artifactId>app</artifactId>
  <version>1.4.0</version>
  <dependencies>
    <dependency>
      <groupId>org.springframework</groupId>
      <artifactId>spring-core</artifactId>
      <version>${spring.version}</version>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>app-common</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>[4.12,5.0)</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
    </dependency>
  </dependencies>
  <properties>
    <spring.version>5.3.27</spring.version>
  </properties>
</project>"#;
        assert_eq!(
            pom_xml(content),
            vec![
                Requirement::pinned("org.springframework:spring-core", "5.3.27"),
                Requirement::pinned("com.example:app-common", "1.4.0"),
                Requirement::new("junit:junit", Operator::None, "[4.12,5.0)"),
                Requirement::named("org.slf4j:slf4j-api"),
            ]
        );
    }

    #[test]
    fn test_pom_unresolved_property_kept() {
        let content = r#"<project><dependencies><dependency>
            <groupId>g</groupId><artifactId>a</artifactId><version>${missing}</version>
        </dependency></dependencies></project>"#;
        assert_eq!(
            pom_xml(content),
            vec![Requirement::new("g:a", Operator::None, "${missing}")]
        );
    }

    #[test]
    fn test_pom_malformed() {
        assert!(pom_xml("<project><dependencies></project>").is_empty());
    }

    #[test]
    fn test_gradle_properties_versions_only() {
        let content = "\
# build settings
org.gradle.jvmargs=-Xmx2048m
kotlinVersion=1.9.0
okhttp.version = 4.12.0
version=2.0.0
";
        assert_eq!(
            gradle_properties(content),
            vec![
                Requirement::pinned("kotlin", "1.9.0"),
                Requirement::pinned("okhttp", "4.12.0"),
            ]
        );
    }

    #[test]
    fn test_gradle_lockfile() {
        let content = "\
# This is a Gradle generated file for dependency locking.
com.google.guava:guava:32.1.2-jre=compileClasspath,runtimeClasspath
org.slf4j:slf4j-api:2.0.9=runtimeClasspath
empty=annotationProcessor
";
        assert_eq!(
            gradle_lockfile(content),
            vec![
                Requirement::pinned("com.google.guava:guava", "32.1.2-jre"),
                Requirement::pinned("org.slf4j:slf4j-api", "2.0.9"),
            ]
        );
    }

    #[test]
    fn test_build_gradle_groovy_and_kotlin() {
        let groovy = r#"
dependencies {
    implementation 'com.squareup.okhttp3:okhttp:4.12.0'
    testImplementation group: 'junit', name: 'junit', version: '4.13.2'
    compileOnly "org.projectlombok:lombok"
}
"#;
        assert_eq!(
            build_gradle(groovy),
            vec![
                Requirement::pinned("com.squareup.okhttp3:okhttp", "4.12.0"),
                Requirement::pinned("junit:junit", "4.13.2"),
                Requirement::named("org.projectlombok:lombok"),
            ]
        );

        let kotlin = r#"
dependencies {
    implementation("io.ktor:ktor-server-core:2.3.4")
    api("com.google.guava:guava:32.+")
}
"#;
        assert_eq!(
            build_gradle(kotlin),
            vec![
                Requirement::pinned("io.ktor:ktor-server-core", "2.3.4"),
                Requirement::new("com.google.guava:guava", Operator::None, "32.+"),
            ]
        );
    }

    #[test]
    fn test_settings_gradle_modules() {
        let content = r#"
rootProject.name = 'shop'
include ':app', ':core'
include("feature-cart")
"#;
        assert_eq!(
            settings_gradle(content),
            vec![
                Requirement::named("app"),
                Requirement::named("core"),
                Requirement::named("feature-cart"),
            ]
        );
    }

    #[test]
    fn test_build_xml_ivy_dependencies() {
        let content = r#"<project name="legacy">
  <ivy:dependencies xmlns:ivy="antlib:org.apache.ivy.ant">
    <ivy:dependency org="commons-io" name="commons-io" rev="2.11.0"/>
    <ivy:dependency name="local-lib"/>
  </ivy:dependencies>
</project>"#;
        assert_eq!(
            build_xml(content),
            vec![
                Requirement::pinned("commons-io:commons-io", "2.11.0"),
                Requirement::named("local-lib"),
            ]
        );
    }
}
