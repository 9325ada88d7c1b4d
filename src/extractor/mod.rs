//! Manifest extractors.
//!
//! Every supported manifest format is a [`ManifestFormat`] entry in one flat
//! [`Registry`], keyed by its identifier (the file name it is found under).
//! Parsers are plain functions from text to records; they never fail; a file
//! they cannot read yields no records.
//!
//! # Supported Formats
//!
//! | Ecosystem | Identifiers |
//! |-----------|-------------|
//! | pip | `requirements.txt`, `pyproject.toml`, `Pipfile`, `pipfile.toml`, `pipfile.lock`, `setup.py`, `setup.cfg`, `environment.yml` |
//! | npm | `package.json`, `package-lock.json`, `yarn.lock`, `webpack.config.js`, `pnpm-lock.yaml`, `bower.json` |
//! | RubyGems | `Gemfile`, `Gemfile.lock` |
//! | Composer | `composer.json`, `composer.lock` |
//! | Maven | `pom.xml`, `gradle.properties`, `gradle.lockfile`, `build.gradle`, `build.xml`, `build.gradle.kts`, `settings.gradle` |
//! | Cargo | `Cargo.toml`, `Cargo.lock` |
//! | NuGet | `packages.config`, `project.json`, `.csproj`, `.nuspec`, `project.assets.json`, `packages.lock.json`, `.paket`, `paket.dependencies`, `paket.lock` |
//! | Go | `go.mod`, `go.sum`, `glide.lock`, `glide.yaml`, `gogradle.lock`, `Gopkg.lock`, `Godeps.lock`, `vendor.conf` |
//! | C/C++ | `CMakeLists.txt`, `Makefile` |
//! | Pub | `pubspec.yaml` |
//! | CocoaPods | `Podfile`, `Podfile.lock` |
//! | Swift | `packages.swift`, `Cartfile` |
//!
//! # Example
//!
//! ```
//! use depscan::extractor;
//! use depscan::{Ecosystem, Operator};
//!
//! let records = extractor::extract("requirements.txt", "requests==2.28.0\n");
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].name, "requests");
//! assert_eq!(records[0].operator, Operator::Eq);
//! assert_eq!(records[0].version, "2.28.0");
//! assert_eq!(records[0].ecosystem, Ecosystem::Pip);
//! ```

mod common;
mod dart;
mod dotnet;
mod go;
mod javascript;
mod jvm;
mod native;
mod php;
mod python;
mod ruby;
mod rust;
mod swift;

pub use common::{split_constraint, Requirement};

use crate::model::{DependencyRecord, Ecosystem};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A text-to-requirements parser for one manifest format.
pub type ParseFn = fn(&str) -> Vec<Requirement>;

/// One entry of the registry.
#[derive(Debug, Clone, Copy)]
pub struct ManifestFormat {
    pub id: &'static str,
    pub ecosystem: Ecosystem,
    parse: ParseFn,
}

impl ManifestFormat {
    pub const fn new(id: &'static str, ecosystem: Ecosystem, parse: ParseFn) -> Self {
        Self { id, ecosystem, parse }
    }

    /// Parses `content` into records tagged with this format's ecosystem and
    /// identifier, in source order.
    pub fn parse(&self, content: &str) -> Vec<DependencyRecord> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        (self.parse)(content)
            .into_iter()
            .filter(|req| !req.name.trim().is_empty())
            .map(|req| {
                DependencyRecord::new(req.name, req.operator, req.version, self.ecosystem, self.id)
            })
            .collect()
    }
}

const BUILTIN_FORMATS: &[ManifestFormat] = &[
    ManifestFormat::new("requirements.txt", Ecosystem::Pip, python::requirements_txt),
    ManifestFormat::new("pyproject.toml", Ecosystem::Pip, python::pyproject_toml),
    ManifestFormat::new("Pipfile", Ecosystem::Pip, python::pipfile),
    ManifestFormat::new("pipfile.toml", Ecosystem::Pip, python::pipfile),
    ManifestFormat::new("pipfile.lock", Ecosystem::Pip, python::pipfile_lock),
    ManifestFormat::new("setup.py", Ecosystem::Pip, python::setup_py),
    ManifestFormat::new("setup.cfg", Ecosystem::Pip, python::setup_cfg),
    ManifestFormat::new("environment.yml", Ecosystem::Pip, python::environment_yml),
    ManifestFormat::new("package.json", Ecosystem::Npm, javascript::package_json),
    ManifestFormat::new("package-lock.json", Ecosystem::Npm, javascript::package_lock_json),
    ManifestFormat::new("yarn.lock", Ecosystem::Npm, javascript::yarn_lock),
    ManifestFormat::new("webpack.config.js", Ecosystem::Npm, javascript::webpack_config_js),
    ManifestFormat::new("pnpm-lock.yaml", Ecosystem::Npm, javascript::pnpm_lock_yaml),
    ManifestFormat::new("bower.json", Ecosystem::Npm, javascript::bower_json),
    ManifestFormat::new("Gemfile", Ecosystem::RubyGems, ruby::gemfile),
    ManifestFormat::new("Gemfile.lock", Ecosystem::RubyGems, ruby::gemfile_lock),
    ManifestFormat::new("composer.json", Ecosystem::Composer, php::composer_json),
    ManifestFormat::new("composer.lock", Ecosystem::Composer, php::composer_lock),
    ManifestFormat::new("pom.xml", Ecosystem::Maven, jvm::pom_xml),
    ManifestFormat::new("gradle.properties", Ecosystem::Maven, jvm::gradle_properties),
    ManifestFormat::new("gradle.lockfile", Ecosystem::Maven, jvm::gradle_lockfile),
    ManifestFormat::new("build.gradle", Ecosystem::Maven, jvm::build_gradle),
    ManifestFormat::new("build.xml", Ecosystem::Maven, jvm::build_xml),
    ManifestFormat::new("build.gradle.kts", Ecosystem::Maven, jvm::build_gradle),
    ManifestFormat::new("settings.gradle", Ecosystem::Maven, jvm::settings_gradle),
    ManifestFormat::new("Cargo.toml", Ecosystem::Cargo, rust::cargo_toml),
    ManifestFormat::new("Cargo.lock", Ecosystem::Cargo, rust::cargo_lock),
    ManifestFormat::new("packages.config", Ecosystem::NuGet, dotnet::packages_config),
    ManifestFormat::new("project.json", Ecosystem::NuGet, dotnet::project_json),
    ManifestFormat::new(".csproj", Ecosystem::NuGet, dotnet::csproj),
    ManifestFormat::new(".nuspec", Ecosystem::NuGet, dotnet::nuspec),
    ManifestFormat::new("project.assets.json", Ecosystem::NuGet, dotnet::project_assets_json),
    ManifestFormat::new("packages.lock.json", Ecosystem::NuGet, dotnet::packages_lock_json),
    ManifestFormat::new(".paket", Ecosystem::NuGet, dotnet::paket),
    ManifestFormat::new("paket.dependencies", Ecosystem::NuGet, dotnet::paket_dependencies),
    ManifestFormat::new("paket.lock", Ecosystem::NuGet, dotnet::paket_lock),
    ManifestFormat::new("go.mod", Ecosystem::Go, go::go_mod),
    ManifestFormat::new("go.sum", Ecosystem::Go, go::go_sum),
    ManifestFormat::new("glide.lock", Ecosystem::Go, go::glide_lock),
    ManifestFormat::new("glide.yaml", Ecosystem::Go, go::glide_yaml),
    ManifestFormat::new("gogradle.lock", Ecosystem::Go, go::gogradle_lock),
    ManifestFormat::new("Gopkg.lock", Ecosystem::Go, go::gopkg_lock),
    ManifestFormat::new("Godeps.lock", Ecosystem::Go, go::godeps_lock),
    ManifestFormat::new("vendor.conf", Ecosystem::Go, go::vendor_conf),
    ManifestFormat::new("CMakeLists.txt", Ecosystem::Native, native::cmakelists),
    ManifestFormat::new("Makefile", Ecosystem::Native, native::makefile),
    ManifestFormat::new("pubspec.yaml", Ecosystem::Pub, dart::pubspec_yaml),
    ManifestFormat::new("Podfile", Ecosystem::CocoaPods, swift::podfile),
    ManifestFormat::new("Podfile.lock", Ecosystem::CocoaPods, swift::podfile_lock),
    ManifestFormat::new("packages.swift", Ecosystem::Swift, swift::packages_swift),
    ManifestFormat::new("Cartfile", Ecosystem::Swift, swift::cartfile),
];

/// Identifiers that name a file extension rather than a file.
const SUFFIX_IDS: [&str; 3] = [".csproj", ".nuspec", ".paket"];

/// Identifier → parser table. Lookup is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<ManifestFormat>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in format, in table order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for format in BUILTIN_FORMATS {
            registry.register(*format);
        }
        registry
    }

    /// Adds a format. Registering an identifier again replaces its parser in
    /// place.
    pub fn register(&mut self, format: ManifestFormat) {
        match self.index.get(format.id) {
            Some(&at) => self.entries[at] = format,
            None => {
                self.index.insert(format.id, self.entries.len());
                self.entries.push(format);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ManifestFormat> {
        self.index.get(id).map(|&at| &self.entries[at])
    }

    /// Runs the parser registered under `id`. Unknown identifiers yield no
    /// records.
    pub fn extract(&self, id: &str, content: &str) -> Vec<DependencyRecord> {
        match self.get(id) {
            Some(format) => format.parse(content),
            None => {
                tracing::debug!("no parser registered for {}", id);
                Vec::new()
            }
        }
    }

    pub fn formats(&self) -> &[ManifestFormat] {
        &self.entries
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|format| format.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps a file name found on disk to its identifier: exact names first,
    /// then `App.csproj`-style names onto the extension identifiers.
    pub fn resolve_file_name(&self, file_name: &str) -> Option<&'static str> {
        if let Some(format) = self.get(file_name) {
            return Some(format.id);
        }
        SUFFIX_IDS
            .iter()
            .find(|suffix| file_name.len() > suffix.len() && file_name.ends_with(*suffix))
            .and_then(|suffix| self.get(suffix))
            .map(|format| format.id)
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::builtin);

/// The shared built-in registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Extracts records from `content` using the built-in parser for `id`.
pub fn extract(id: &str, content: &str) -> Vec<DependencyRecord> {
    registry().extract(id, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;

    #[test]
    fn test_builtin_has_every_identifier_once() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 51);
        assert_eq!(registry.identifiers().next(), Some("requirements.txt"));
        assert_eq!(registry.identifiers().last(), Some("Cartfile"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = Registry::builtin();
        assert!(registry.get("Pipfile").is_some());
        assert!(registry.get("pipfile").is_none());
        assert!(registry.get("cargo.toml").is_none());
    }

    #[test]
    fn test_unknown_identifier_yields_nothing() {
        assert!(extract("unknown.lock", "anything").is_empty());
    }

    #[test]
    fn test_records_carry_ecosystem_and_source() {
        let records = extract("Cargo.toml", "[dependencies]\nserde = \"1.0\"\n");
        assert_eq!(
            records,
            vec![DependencyRecord::new(
                "serde",
                Operator::Caret,
                "1.0",
                Ecosystem::Cargo,
                "Cargo.toml"
            )]
        );
    }

    #[test]
    fn test_register_new_format() {
        fn one_per_line(content: &str) -> Vec<Requirement> {
            content.lines().map(Requirement::named).collect()
        }

        let mut registry = Registry::builtin();
        registry.register(ManifestFormat::new("deps.txt", Ecosystem::Native, one_per_line));
        assert_eq!(registry.len(), 52);
        assert_eq!(registry.extract("deps.txt", "zlib\nssl\n").len(), 2);
        assert_eq!(registry.extract("requirements.txt", "flask\n").len(), 1);
    }

    #[test]
    fn test_resolve_file_name() {
        let registry = registry();
        assert_eq!(registry.resolve_file_name("go.mod"), Some("go.mod"));
        assert_eq!(registry.resolve_file_name("Api.csproj"), Some(".csproj"));
        assert_eq!(registry.resolve_file_name("MyLib.nuspec"), Some(".nuspec"));
        assert_eq!(registry.resolve_file_name(".csproj"), Some(".csproj"));
        assert_eq!(registry.resolve_file_name("README.md"), None);
    }
}
