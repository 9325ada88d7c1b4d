use super::sink::VulnerabilityRow;
use crate::extractor::ManifestFormat;
use crate::model::{DependencyRecord, Severity};
use crate::pipeline::ManifestSummary;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Constraint")]
    constraint: String,
    #[tabled(rename = "Ecosystem")]
    ecosystem: String,
    #[tabled(rename = "Source")]
    source: String,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Advisory")]
    advisory: String,
}

#[derive(Tabled)]
struct FormatRow {
    #[tabled(rename = "Identifier")]
    id: String,
    #[tabled(rename = "Ecosystem")]
    ecosystem: String,
    #[tabled(rename = "Advisory DB")]
    advisory: String,
}

#[derive(Tabled)]
struct FileSummaryRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Dependencies")]
    count: usize,
}

pub fn print_records(records: &[DependencyRecord]) {
    if records.is_empty() {
        println!("No dependencies found.");
        return;
    }

    println!("Found {} dependencies:", records.len());
    println!();

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            name: truncate(&r.name, 50),
            constraint: format_constraint(r),
            ecosystem: r.ecosystem.display_name().to_string(),
            source: r.source_file.clone(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Findings sorted most severe first.
pub fn print_findings(findings: &[VulnerabilityRow]) {
    if findings.is_empty() {
        println!("No applicable advisories found.");
        return;
    }

    let mut sorted: Vec<&VulnerabilityRow> = findings.iter().collect();
    sorted.sort_by_key(|f| std::cmp::Reverse(Severity::from_label(&f.severity)));

    println!("Found {} applicable advisories:", findings.len());
    println!();

    let rows: Vec<FindingRow> = sorted
        .into_iter()
        .map(|f| FindingRow {
            severity: format_severity(Severity::from_label(&f.severity)),
            package: truncate(&f.name, 40),
            version: f.version.clone(),
            source: format!("{} ({})", f.source_file, f.repo),
            advisory: f.advisory.clone(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

pub fn print_formats(formats: &[ManifestFormat]) {
    let rows: Vec<FormatRow> = formats
        .iter()
        .map(|f| FormatRow {
            id: f.id.to_string(),
            ecosystem: f.ecosystem.display_name().to_string(),
            advisory: f.ecosystem.advisory_ecosystem().unwrap_or("-").to_string(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Per-file record counts after a repository or directory scan.
pub fn print_file_summary(files: &[ManifestSummary]) {
    if files.is_empty() {
        println!("No manifests found.");
        return;
    }

    let rows: Vec<FileSummaryRow> = files
        .iter()
        .map(|f| FileSummaryRow {
            file: f.path.clone(),
            format: f.manifest_id.to_string(),
            count: f.dependencies,
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn format_constraint(record: &DependencyRecord) -> String {
    match (record.operator.as_str(), record.version.as_str()) {
        (_, "") => "-".to_string(),
        (op, version) => format!("{}{}", op, version),
    }
}

pub(crate) fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Unknown => "UNKNOWN".to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ecosystem, Operator};

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ünïcödé-package-name", 8), "ünïcö...");
    }

    #[test]
    fn test_format_constraint() {
        let record = |name: &str, operator, version: &str, ecosystem, source: &str| {
            DependencyRecord::new(name, operator, version, ecosystem, source)
        };
        let pinned = record("a", Operator::Eq, "1.0", Ecosystem::Pip, "requirements.txt");
        let bare = record("b", Operator::None, "", Ecosystem::Pip, "requirements.txt");
        let raw = record("c", Operator::None, "latest", Ecosystem::Npm, "package.json");
        assert_eq!(format_constraint(&pinned), "==1.0");
        assert_eq!(format_constraint(&bare), "-");
        assert_eq!(format_constraint(&raw), "latest");
    }
}
