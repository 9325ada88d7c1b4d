use serde::{Deserialize, Serialize};

/// Package-manager family a manifest format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Pip,
    Npm,
    RubyGems,
    Composer,
    Maven,
    Cargo,
    NuGet,
    Go,
    Native,
    Pub,
    CocoaPods,
    Swift,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 12] = [
        Ecosystem::Pip,
        Ecosystem::Npm,
        Ecosystem::RubyGems,
        Ecosystem::Composer,
        Ecosystem::Maven,
        Ecosystem::Cargo,
        Ecosystem::NuGet,
        Ecosystem::Go,
        Ecosystem::Native,
        Ecosystem::Pub,
        Ecosystem::CocoaPods,
        Ecosystem::Swift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Pip => "pip",
            Ecosystem::Npm => "npm",
            Ecosystem::RubyGems => "rubygems",
            Ecosystem::Composer => "composer",
            Ecosystem::Maven => "maven",
            Ecosystem::Cargo => "cargo",
            Ecosystem::NuGet => "nuget",
            Ecosystem::Go => "go",
            Ecosystem::Native => "native",
            Ecosystem::Pub => "pub",
            Ecosystem::CocoaPods => "cocoapods",
            Ecosystem::Swift => "swift",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Pip => "Python",
            Ecosystem::Npm => "JavaScript",
            Ecosystem::RubyGems => "Ruby",
            Ecosystem::Composer => "PHP",
            Ecosystem::Maven => "Java/Kotlin",
            Ecosystem::Cargo => "Rust",
            Ecosystem::NuGet => ".NET",
            Ecosystem::Go => "Go",
            Ecosystem::Native => "C/C++",
            Ecosystem::Pub => "Dart",
            Ecosystem::CocoaPods => "CocoaPods",
            Ecosystem::Swift => "Swift",
        }
    }

    /// Name of the matching `SecurityAdvisoryEcosystem` in the GitHub advisory
    /// database, if that database covers this ecosystem.
    pub fn advisory_ecosystem(&self) -> Option<&'static str> {
        match self {
            Ecosystem::Pip => Some("PIP"),
            Ecosystem::Npm => Some("NPM"),
            Ecosystem::RubyGems => Some("RUBYGEMS"),
            Ecosystem::Composer => Some("COMPOSER"),
            Ecosystem::Maven => Some("MAVEN"),
            Ecosystem::Cargo => Some("RUST"),
            Ecosystem::NuGet => Some("NUGET"),
            Ecosystem::Go => Some("GO"),
            Ecosystem::Pub => Some("PUB"),
            Ecosystem::Swift => Some("SWIFT"),
            Ecosystem::Native | Ecosystem::CocoaPods => None,
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ecosystem::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown ecosystem: {}", s))
    }
}

/// Constraint operator attached to a declared version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "^")]
    Caret,
    #[serde(rename = "~")]
    Tilde,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::None => "",
            Operator::Eq => "==",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Caret => "^",
            Operator::Tilde => "~",
        }
    }

    /// Maps a constraint symbol as written in a manifest onto the record
    /// operator set. Ecosystem spellings fold into the closest member:
    /// `===` and `=` are equality, Python `~=` and Ruby/CocoaPods `~>` are
    /// tilde. Symbols with no counterpart (`!=`) return `None`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "" => Some(Operator::None),
            "==" | "===" | "=" => Some(Operator::Eq),
            ">=" => Some(Operator::Ge),
            "<=" => Some(Operator::Le),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            "^" => Some(Operator::Caret),
            "~" | "~=" | "~>" => Some(Operator::Tilde),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dependency extracted from a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub operator: Operator,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub source_file: String,
}

impl DependencyRecord {
    pub fn new(
        name: impl Into<String>,
        operator: Operator,
        version: impl Into<String>,
        ecosystem: Ecosystem,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            operator,
            version: version.into(),
            ecosystem,
            source_file: source_file.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols_round_trip() {
        for op in [
            Operator::None,
            Operator::Eq,
            Operator::Ge,
            Operator::Le,
            Operator::Gt,
            Operator::Lt,
            Operator::Caret,
            Operator::Tilde,
        ] {
            assert_eq!(Operator::from_symbol(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_operator_ecosystem_spellings() {
        assert_eq!(Operator::from_symbol("~>"), Some(Operator::Tilde));
        assert_eq!(Operator::from_symbol("~="), Some(Operator::Tilde));
        assert_eq!(Operator::from_symbol("==="), Some(Operator::Eq));
        assert_eq!(Operator::from_symbol("!="), None);
    }

    #[test]
    fn test_ecosystem_from_str() {
        assert_eq!("cargo".parse::<Ecosystem>(), Ok(Ecosystem::Cargo));
        assert_eq!("NPM".parse::<Ecosystem>(), Ok(Ecosystem::Npm));
        assert!("cobol".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_advisory_ecosystem_mapping() {
        assert_eq!(Ecosystem::Cargo.advisory_ecosystem(), Some("RUST"));
        assert_eq!(Ecosystem::Pip.advisory_ecosystem(), Some("PIP"));
        assert_eq!(Ecosystem::Native.advisory_ecosystem(), None);
        assert_eq!(Ecosystem::CocoaPods.advisory_ecosystem(), None);
    }
}
