use serde::Serialize;

use crate::config::AppConfig;
use crate::fields::{classify, FieldKind};

pub const SECTION_MARKER_PREFIX: &str = "SECTION-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    General,
    Definitives,
    Personal,
    Payroll,
    SalaryBreakup,
    CareerProgression,
    PerformanceReviews,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::General,
        Section::Definitives,
        Section::Personal,
        Section::Payroll,
        Section::SalaryBreakup,
        Section::CareerProgression,
        Section::PerformanceReviews,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Definitives => "definitives",
            Self::Personal => "personal",
            Self::Payroll => "payroll",
            Self::SalaryBreakup => "salary",
            Self::CareerProgression => "career",
            Self::PerformanceReviews => "reviews",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::General => "General Details",
            Self::Definitives => "Definitives",
            Self::Personal => "Personal Details",
            Self::Payroll => "Payroll",
            Self::SalaryBreakup => "Salary Breakup",
            Self::CareerProgression => "Career Progression",
            Self::PerformanceReviews => "Performance Reviews",
        }
    }

    pub fn start_marker(self) -> &'static str {
        match self {
            Self::General => "SECTION- GENERAL DETAILS",
            Self::Definitives => "SECTION- DEFINITIVES",
            Self::Personal => "SECTION- PERSONAL DETAILS",
            Self::Payroll => "SECTION- PAYROLL",
            Self::SalaryBreakup => "SECTION- SALARY BREAK UP",
            Self::CareerProgression => "SECTION- LCT",
            Self::PerformanceReviews => "SECTION- PR",
        }
    }

    pub fn end_marker(self) -> Option<&'static str> {
        match self {
            Self::General => Some("SECTION- DEFINITIVES"),
            Self::Definitives => Some("SECTION- PERSONAL DETAILS"),
            Self::Personal => Some("SECTION- PAYROLL"),
            Self::Payroll => Some("SECTION- SALARY BREAK UP"),
            Self::SalaryBreakup => Some("SECTION- LCT"),
            Self::CareerProgression => Some("SECTION- PR"),
            Self::PerformanceReviews => None,
        }
    }

    /// Editable on the edit page; the rest render read-only there.
    pub fn editable(self) -> bool {
        matches!(self, Self::General | Self::Definitives | Self::Personal)
    }
}

/// Columns strictly after `start_marker` and before `end_marker`.
///
/// A missing start marker means "from the first column", a missing end marker
/// means "to the last column". Never panics; an inverted pair yields nothing.
pub fn slice<'a>(
    columns: &'a [String],
    start_marker: &str,
    end_marker: Option<&str>,
) -> &'a [String] {
    let start = columns
        .iter()
        .position(|c| c == start_marker)
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = end_marker
        .and_then(|m| columns.iter().position(|c| c == m))
        .unwrap_or(columns.len());
    if start >= end {
        return &[];
    }
    &columns[start..end]
}

pub fn is_section_marker(column: &str) -> bool {
    column.starts_with(SECTION_MARKER_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub struct ResolvedSection {
    pub section: Section,
    pub fields: Vec<FieldSpec>,
}

/// Declared section -> ordered field list, fixed when the store is opened.
#[derive(Debug, Clone)]
pub struct SectionLayout {
    pub columns: Vec<String>,
    sections: Vec<ResolvedSection>,
}

impl SectionLayout {
    pub fn resolve(columns: Vec<String>, cfg: &AppConfig) -> Self {
        let mut sections = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let names: Vec<String> = match cfg.section_override(section.key()) {
                Some(declared) => declared
                    .iter()
                    .filter(|name| {
                        let known = columns.contains(name);
                        if !known {
                            tracing::warn!(
                                section = section.key(),
                                column = name.as_str(),
                                "declared field is not in the table; skipped"
                            );
                        }
                        known
                    })
                    .cloned()
                    .collect(),
                None => {
                    if !columns.iter().any(|c| c == section.start_marker()) {
                        tracing::warn!(
                            section = section.key(),
                            marker = section.start_marker(),
                            "section start marker missing; slicing from the first column"
                        );
                    }
                    slice(&columns, section.start_marker(), section.end_marker()).to_vec()
                }
            };
            let fields = names
                .into_iter()
                .filter(|n| !is_section_marker(n))
                .map(|name| {
                    let kind = match cfg.field_kinds.get(&name) {
                        Some(k) => {
                            tracing::debug!(
                                column = %name,
                                kind = k.as_str(),
                                "field kind declared"
                            );
                            *k
                        }
                        None => classify(&name),
                    };
                    FieldSpec { name, kind }
                })
                .collect();
            sections.push(ResolvedSection { section, fields });
        }
        Self { columns, sections }
    }

    pub fn section(&self, section: Section) -> &ResolvedSection {
        // `resolve` fills every entry of Section::ALL in declaration order.
        &self.sections[section as usize]
    }

    pub fn sections(&self) -> &[ResolvedSection] {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slice_returns_columns_strictly_between_markers() {
        let c = cols(&["id", "S1", "a", "b", "S2", "c", "S3"]);
        assert_eq!(slice(&c, "S1", Some("S2")), &c[2..4]);
        assert_eq!(slice(&c, "S2", Some("S3")), &c[5..6]);
        assert_eq!(slice(&c, "S3", None), &[] as &[String]);
    }

    #[test]
    fn slice_degrades_when_markers_are_absent() {
        let c = cols(&["id", "S1", "a", "S2", "b"]);
        assert_eq!(slice(&c, "missing", Some("S2")), &c[0..3]);
        assert_eq!(slice(&c, "S1", Some("missing")), &c[2..5]);
        assert_eq!(slice(&c, "S2", None), &c[4..5]);
        assert_eq!(slice(&c, "x", None), &c[..]);
        assert!(slice(&[], "S1", Some("S2")).is_empty());
    }

    #[test]
    fn slice_with_inverted_markers_is_empty() {
        let c = cols(&["S2", "a", "S1", "b"]);
        assert!(slice(&c, "S1", Some("S2")).is_empty());
    }

    #[test]
    fn resolve_assigns_fields_and_kinds() {
        let c = cols(&[
            "Employee UID# (EUID#)",
            "SECTION- GENERAL DETAILS",
            "Employee Full Name",
            "DIVISION",
            "SECTION- DEFINITIVES",
            "DOB",
            "SECTION- PERSONAL DETAILS",
            "Married (Y / N choice radio)",
            "SECTION- PAYROLL",
            "Bank",
            "SECTION- SALARY BREAK UP",
            "Basic AMOUNT",
            "SECTION- LCT",
            "Promotion",
            "SECTION- PR",
            "Review#1 Score",
        ]);
        let layout = SectionLayout::resolve(c, &AppConfig::default());
        let general = layout.section(Section::General);
        assert_eq!(general.fields.len(), 2);
        assert_eq!(general.fields[1].kind, FieldKind::DivisionChoice);
        assert_eq!(
            layout.section(Section::Personal).fields[0].kind,
            FieldKind::BooleanChoice
        );
        assert_eq!(
            layout.section(Section::PerformanceReviews).fields[0].name,
            "Review#1 Score"
        );
        assert_eq!(layout.sections().len(), 7);
    }

    #[test]
    fn declared_overrides_replace_slicing() {
        let cfg = AppConfig::from_toml(
            r#"
            [[sections]]
            key = "general"
            fields = ["Nickname", "Ghost column"]

            [field_kinds]
            "Nickname" = "numeric"
            "#,
        )
        .expect("config");
        let c = cols(&["SECTION- GENERAL DETAILS", "Name", "Nickname", "SECTION- DEFINITIVES"]);
        let layout = SectionLayout::resolve(c, &cfg);
        let general = layout.section(Section::General);
        assert_eq!(
            general.fields,
            vec![FieldSpec {
                name: "Nickname".to_string(),
                kind: FieldKind::Numeric
            }]
        );
    }

    #[test]
    fn editable_sections_are_the_first_three() {
        let editable: Vec<_> = Section::ALL.iter().filter(|s| s.editable()).collect();
        assert_eq!(editable.len(), 3);
        assert!(!Section::Payroll.editable());
    }
}
