//! Go modules and the older vendoring tools.

use super::common::{dedupe, parse_json, parse_toml, parse_yaml, Requirement};

fn strip_line_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or_default().trim()
}

fn module_line(line: &str) -> Option<Requirement> {
    let mut tokens = line.split_whitespace();
    let module = tokens.next()?;
    let version = tokens.next().unwrap_or_default();
    Some(Requirement::pinned(module, version))
}

/// `require` directives, both single-line and parenthesised blocks.
pub fn go_mod(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = strip_line_comment(raw);
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
            } else {
                requirements.extend(module_line(line));
            }
            continue;
        }

        let Some(rest) = line.strip_prefix("require") else {
            continue;
        };
        let rest = rest.trim();
        if rest == "(" {
            in_block = true;
        } else if !rest.is_empty() {
            requirements.extend(module_line(rest));
        }
    }

    requirements
}

/// Every module version in the checksum database, once.
pub fn go_sum(content: &str) -> Vec<Requirement> {
    let requirements = content
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let module = tokens.next()?;
            let version = tokens.next()?;
            let version = version.strip_suffix("/go.mod").unwrap_or(version);
            Some(Requirement::pinned(module, version))
        })
        .collect();
    dedupe(requirements)
}

fn yaml_entries(
    list: Option<&serde_yaml_ng::Value>,
    name_key: &str,
    version_keys: &[&str],
) -> Vec<Requirement> {
    list.and_then(|l| l.as_sequence())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get(name_key)?.as_str()?;
                    let version = version_keys
                        .iter()
                        .find_map(|key| entry.get(*key).and_then(|v| v.as_str()))
                        .unwrap_or_default();
                    Some(Requirement::pinned(name, version))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn glide_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    ["imports", "testImports"]
        .iter()
        .flat_map(|section| yaml_entries(doc.get(*section), "name", &["version"]))
        .collect()
}

pub fn glide_yaml(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    ["import", "testImport"]
        .iter()
        .flat_map(|section| yaml_entries(doc.get(*section), "package", &["version"]))
        .collect()
}

/// gogradle pins by tag or commit when no version is recorded.
pub fn gogradle_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_yaml(content) else {
        return Vec::new();
    };
    let Some(dependencies) = doc.get("dependencies") else {
        return Vec::new();
    };
    ["build", "test"]
        .iter()
        .flat_map(|scope| {
            yaml_entries(dependencies.get(*scope), "name", &["version", "tag", "commit"])
        })
        .collect()
}

/// dep's `Gopkg.lock`: `[[projects]]` with a version tag or a revision.
pub fn gopkg_lock(content: &str) -> Vec<Requirement> {
    let Some(doc) = parse_toml(content) else {
        return Vec::new();
    };
    doc.get("projects")
        .and_then(|p| p.as_array())
        .map(|projects| {
            projects
                .iter()
                .filter_map(|project| {
                    let name = project.get("name")?.as_str()?;
                    let version = project
                        .get("version")
                        .or_else(|| project.get("revision"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    Some(Requirement::pinned(name, version))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn path_version_lines(content: &str) -> Vec<Requirement> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .filter_map(module_line)
        .filter(|req| req.name.contains('/'))
        .collect()
}

/// Godeps in its JSON form (`Deps` with `ImportPath`/`Rev`), or as plain
/// `path revision` lines.
pub fn godeps_lock(content: &str) -> Vec<Requirement> {
    if !content.trim_start().starts_with('{') {
        return path_version_lines(content);
    }
    let Some(doc) = parse_json(content) else {
        return Vec::new();
    };
    doc.get("Deps")
        .and_then(|d| d.as_array())
        .map(|deps| {
            deps.iter()
                .filter_map(|dep| {
                    let path = dep.get("ImportPath")?.as_str()?;
                    let rev = dep.get("Rev").and_then(|r| r.as_str()).unwrap_or_default();
                    Some(Requirement::pinned(path, rev))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// trash/vndr `vendor.conf`: `import/path version [repository]`.
pub fn vendor_conf(content: &str) -> Vec<Requirement> {
    path_version_lines(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_mod_requires() {
        let content = "\
module example.com/app

go 1.21

require github.com/pkg/errors v0.9.1

require (
\tgolang.org/x/net v0.17.0 // indirect
\tgithub.com/stretchr/testify v1.8.4
)

replace github.com/pkg/errors => ../errors
";
        assert_eq!(
            go_mod(content),
            vec![
                Requirement::pinned("github.com/pkg/errors", "v0.9.1"),
                Requirement::pinned("golang.org/x/net", "v0.17.0"),
                Requirement::pinned("github.com/stretchr/testify", "v1.8.4"),
            ]
        );
    }

    #[test]
    fn test_go_sum_collapses_go_mod_lines() {
        let content = "\
github.com/pkg/errors v0.9.1 h1:FEBLx1zS214owpjy7qsBeixbURkuhQAwrK5UwLGTwt4=
github.com/pkg/errors v0.9.1/go.mod h1:bwawxfHBFNV+L2hUp1rHADufV3IMtnDRdf1r5NINEl0=
";
        assert_eq!(
            go_sum(content),
            vec![Requirement::pinned("github.com/pkg/errors", "v0.9.1")]
        );
    }

    #[test]
    fn test_glide_files() {
        let lock = "\
hash: abc
imports:
- name: github.com/gorilla/mux
  version: 53c1911da2b537f792e7cafcb446b05ffe33b996
testImports:
- name: github.com/stretchr/testify
  version: v1.1.4
";
        assert_eq!(
            glide_lock(lock),
            vec![
                Requirement::pinned(
                    "github.com/gorilla/mux",
                    "53c1911da2b537f792e7cafcb446b05ffe33b996"
                ),
                Requirement::pinned("github.com/stretchr/testify", "v1.1.4"),
            ]
        );

        let manifest = "\
package: example.com/app
import:
- package: github.com/gorilla/mux
  version: v1.6.2
- package: github.com/sirupsen/logrus
";
        assert_eq!(
            glide_yaml(manifest),
            vec![
                Requirement::pinned("github.com/gorilla/mux", "v1.6.2"),
                Requirement::named("github.com/sirupsen/logrus"),
            ]
        );
    }

    #[test]
    fn test_gogradle_lock() {
        let content = "\
apiVersion: \"0.8.1\"
dependencies:
  build:
  - name: \"github.com/golang/protobuf\"
    vcs: \"git\"
    commit: \"130e6b02ab059e7b717a096f397c5b60111cae74\"
  test:
  - name: \"github.com/stretchr/testify\"
    tag: \"v1.2.0\"
";
        assert_eq!(
            gogradle_lock(content),
            vec![
                Requirement::pinned(
                    "github.com/golang/protobuf",
                    "130e6b02ab059e7b717a096f397c5b60111cae74"
                ),
                Requirement::pinned("github.com/stretchr/testify", "v1.2.0"),
            ]
        );
    }

    #[test]
    fn test_gopkg_lock() {
        let content = r#"
[[projects]]
  name = "github.com/pkg/errors"
  packages = ["."]
  revision = "645ef00459ed84a119197bfb8d8205042c6df63d"
  version = "v0.8.0"

[[projects]]
  branch = "master"
  name = "golang.org/x/sys"
  revision = "a1a1a1"
"#;
        assert_eq!(
            gopkg_lock(content),
            vec![
                Requirement::pinned("github.com/pkg/errors", "v0.8.0"),
                Requirement::pinned("golang.org/x/sys", "a1a1a1"),
            ]
        );
    }

    #[test]
    fn test_godeps_json_and_lines() {
        let json = r#"{"ImportPath": "example.com/app", "Deps": [
            {"ImportPath": "github.com/kr/pretty", "Rev": "cfb55aafdaf3ec08f0db22699ab822c50091b1c4"}
        ]}"#;
        assert_eq!(
            godeps_lock(json),
            vec![Requirement::pinned(
                "github.com/kr/pretty",
                "cfb55aafdaf3ec08f0db22699ab822c50091b1c4"
            )]
        );

        let lines = "github.com/kr/pretty cfb55aa\n";
        assert_eq!(
            godeps_lock(lines),
            vec![Requirement::pinned("github.com/kr/pretty", "cfb55aa")]
        );
    }

    #[test]
    fn test_vendor_conf() {
        let content = "\
# runtime
github.com/docker/go-units v0.4.0
golang.org/x/sys 95c6576299259db960f6c5b9b69ea52422860fce https://github.com/golang/sys
notapath 1.0
";
        assert_eq!(
            vendor_conf(content),
            vec![
                Requirement::pinned("github.com/docker/go-units", "v0.4.0"),
                Requirement::pinned("golang.org/x/sys", "95c6576299259db960f6c5b9b69ea52422860fce"),
            ]
        );
    }
}
