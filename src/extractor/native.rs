//! C and C++ build files. Neither format declares packages formally, so
//! both are pattern scans.

use super::common::{dedupe, ordered_captures, Requirement};
use crate::model::Operator;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_FIND_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfind_package\s*\(\s*([A-Za-z0-9_.+-]+)(?:\s+([0-9][A-Za-z0-9_.]*))?")
        .unwrap()
});

static RE_FETCH_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFetchContent_Declare\s*\(\s*([A-Za-z0-9_.+-]+)([^)]*)\)").unwrap()
});

static RE_GIT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bGIT_TAG\s+([^\s)]+)").unwrap());

static RE_LINK_LIBRARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)-l([A-Za-z0-9_+.-]+)").unwrap());

/// `find_package(Boost 1.70 ...)` asks for at least that version.
fn found_package(caps: &Captures) -> Option<Requirement> {
    let name = caps.get(1)?.as_str();
    Some(match caps.get(2) {
        Some(version) => Requirement::new(name, Operator::Ge, version.as_str()),
        None => Requirement::named(name),
    })
}

fn fetched_content(caps: &Captures) -> Option<Requirement> {
    let name = caps.get(1)?.as_str();
    let tag = caps
        .get(2)
        .and_then(|body| RE_GIT_TAG.captures(body.as_str()))
        .and_then(|tag| tag.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    Some(Requirement::pinned(name, tag))
}

pub fn cmakelists(content: &str) -> Vec<Requirement> {
    ordered_captures(
        content,
        &[
            (&*RE_FIND_PACKAGE, found_package),
            (&*RE_FETCH_CONTENT, fetched_content),
        ],
    )
}

/// Libraries passed to the linker as `-l<name>`.
pub fn makefile(content: &str) -> Vec<Requirement> {
    let requirements = RE_LINK_LIBRARY
        .captures_iter(content)
        .map(|caps| Requirement::named(&caps[1]))
        .collect();
    dedupe(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmakelists() {
        let content = r#"
cmake_minimum_required(VERSION 3.14)
project(demo)
find_package(Boost 1.70 REQUIRED COMPONENTS filesystem)
find_package(Threads REQUIRED)
include(FetchContent)
FetchContent_Declare(
  googletest
  GIT_REPOSITORY https://github.com/google/googletest.git
  GIT_TAG        v1.14.0
)
"#;
        assert_eq!(
            cmakelists(content),
            vec![
                Requirement::new("Boost", Operator::Ge, "1.70"),
                Requirement::named("Threads"),
                Requirement::pinned("googletest", "v1.14.0"),
            ]
        );
    }

    #[test]
    fn test_makefile_link_flags() {
        let content = "\
CC=gcc
LDLIBS = -lssl -lcrypto -L/usr/local/lib
app: main.o
\t$(CC) -o app main.o -lssl -lz
";
        assert_eq!(
            makefile(content),
            vec![
                Requirement::named("ssl"),
                Requirement::named("crypto"),
                Requirement::named("z"),
            ]
        );
    }
}
