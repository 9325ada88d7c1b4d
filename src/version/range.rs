use super::Version;
use crate::error::RangeError;

type CompareFn = fn(&Version, &Version) -> bool;

fn eq(subject: &Version, reference: &Version) -> bool {
    subject == reference
}

fn gt(subject: &Version, reference: &Version) -> bool {
    subject > reference
}

fn ge(subject: &Version, reference: &Version) -> bool {
    subject >= reference
}

fn lt(subject: &Version, reference: &Version) -> bool {
    subject < reference
}

fn le(subject: &Version, reference: &Version) -> bool {
    subject <= reference
}

/// `ref <= v < (major+1).0.0`
fn caret(subject: &Version, reference: &Version) -> bool {
    subject >= reference && *subject < reference.next_major()
}

/// `ref <= v < major.(minor+1).0`
fn tilde(subject: &Version, reference: &Version) -> bool {
    subject >= reference && *subject < reference.next_minor()
}

/// Operator symbols in match order: a symbol must come before any shorter
/// symbol it starts with.
static OPERATORS: [(&str, CompareFn); 8] = [
    (">=", ge),
    ("<=", le),
    ("==", eq),
    ("^", caret),
    ("~", tilde),
    (">", gt),
    ("<", lt),
    ("=", eq),
];

/// A clause without an operator means "this version or later".
const IMPLICIT: CompareFn = ge;

fn lookup(clause: &str) -> (&'static str, CompareFn) {
    OPERATORS
        .iter()
        .find(|(symbol, _)| clause.starts_with(symbol))
        .map(|(symbol, compare)| (*symbol, *compare))
        .unwrap_or(("", IMPLICIT))
}

fn is_operator(token: &str) -> bool {
    OPERATORS.iter().any(|(symbol, _)| *symbol == token)
}

/// One `operator + reference version` constraint.
#[derive(Debug, Clone)]
pub struct Clause {
    symbol: &'static str,
    compare: CompareFn,
    reference: Version,
}

impl Clause {
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn reference(&self) -> &Version {
        &self.reference
    }

    pub fn is_satisfied_by(&self, subject: &Version) -> bool {
        (self.compare)(subject, &self.reference)
    }
}

/// A conjunction of clauses such as `>=1.0.0 <2.0.0`.
///
/// Clauses are separated by whitespace or commas, so GitHub's
/// `>= 1.0.0, < 2.0.0` reads the same as `>=1.0.0 <2.0.0`.
#[derive(Debug, Clone)]
pub struct RangeExpression {
    source: String,
    clauses: Vec<Clause>,
}

impl RangeExpression {
    pub fn parse(range: &str) -> Result<Self, RangeError> {
        let mut tokens = range
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());
        let mut clauses = Vec::new();

        while let Some(token) = tokens.next() {
            let text = if is_operator(token) {
                match tokens.next() {
                    Some(version) => format!("{}{}", token, version),
                    None => {
                        return Err(RangeError::DanglingOperator {
                            range: range.to_string(),
                            operator: token.to_string(),
                        })
                    }
                }
            } else {
                token.to_string()
            };

            let (symbol, compare) = lookup(&text);
            let reference =
                Version::parse(&text[symbol.len()..]).map_err(|source| RangeError::Clause {
                    range: range.to_string(),
                    clause: text.clone(),
                    source,
                })?;

            clauses.push(Clause {
                symbol,
                compare,
                reference,
            });
        }

        Ok(Self {
            source: range.to_string(),
            clauses,
        })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// An expression without clauses matches nothing.
    pub fn is_satisfied_by(&self, subject: &Version) -> bool {
        !self.clauses.is_empty() && self.clauses.iter().all(|c| c.is_satisfied_by(subject))
    }
}

impl std::fmt::Display for RangeExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Evaluates `range` against `subject`, reporting why evaluation was not
/// possible instead of guessing.
pub fn evaluate(subject: &str, range: &str) -> Result<bool, RangeError> {
    let expression = RangeExpression::parse(range)?;
    let version = Version::parse(subject).map_err(RangeError::Subject)?;
    Ok(expression.is_satisfied_by(&version))
}

/// Returns true when `subject` lies inside `range`. Unparseable input never
/// matches.
pub fn matches(subject: &str, range: &str) -> bool {
    match evaluate(subject, range) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!("range not evaluated: {}", e);
            false
        }
    }
}
