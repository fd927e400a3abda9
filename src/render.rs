use rusqlite::types::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::db::EmployeeRecord;
use crate::fields::{FieldKind, YES_NO_OPTIONS};
use crate::layout::{FieldSpec, Section, SectionLayout};
use crate::values::{
    clean_amount, date_default, display_value, format_date, format_number, is_blank,
    number_default, parse_date, NUMBER_DISPLAY_DECIMALS, NUMBER_STEP,
};

pub const REVIEW_PREFIX: &str = "Review#";
const AMOUNT_SUFFIX: &str = " AMOUNT";

pub const SALARY_COLUMNS: &[&str] = &[
    "Basic AMOUNT",
    "House Rent Allowance (HRA) AMOUNT",
    "Conveyance Allowance AMOUNT",
    "Medical Allowance AMOUNT",
    "Special Allowance AMOUNT",
    "Performance Award AMOUNT",
    "Bonus AMOUNT",
];

/// Columns a renderer must treat specially.
#[derive(Debug, Clone)]
pub struct ReservedColumns {
    pub id: String,
    pub pin: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub label: String,
    pub value: String,
}

/// Label/value pairs in field order. Skips the photo (shown separately) and the PIN.
pub fn render_readonly(
    record: &EmployeeRecord,
    fields: &[FieldSpec],
    reserved: &ReservedColumns,
) -> Vec<FieldView> {
    fields
        .iter()
        .filter(|f| record.contains(&f.name))
        .filter(|f| f.name != reserved.photo && f.name != reserved.pin)
        .map(|f| FieldView {
            label: f.name.clone(),
            value: display_value(record.get(&f.name)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewGroup {
    pub review: String,
    /// Two fields per row; the last row may hold one.
    pub rows: Vec<Vec<FieldView>>,
}

/// Distinct `Review#N` prefixes (token before the first space) with their member columns.
pub fn review_prefixes(columns: &[String]) -> Vec<(String, Vec<String>)> {
    let mut groups: BTreeMap<(u64, String), Vec<String>> = BTreeMap::new();
    for col in columns.iter().filter(|c| c.starts_with(REVIEW_PREFIX)) {
        let prefix = col.split_whitespace().next().unwrap_or(col).to_string();
        let number = prefix[REVIEW_PREFIX.len()..].parse::<u64>().unwrap_or(u64::MAX);
        groups.entry((number, prefix)).or_default().push(col.clone());
    }
    groups
        .into_iter()
        .map(|((_, prefix), members)| (prefix, members))
        .collect()
}

pub fn group_reviews(record: &EmployeeRecord, fields: &[FieldSpec]) -> Vec<ReviewGroup> {
    let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
    review_prefixes(&names)
        .into_iter()
        .map(|(review, members)| ReviewGroup {
            review,
            rows: members
                .chunks(2)
                .map(|pair| {
                    pair.iter()
                        .map(|c| FieldView {
                            label: c.clone(),
                            value: display_value(record.get(c)),
                        })
                        .collect()
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryComponent {
    pub component: String,
    pub amount: f64,
    /// Bar length relative to the largest component, 0..=1.
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBreakup {
    pub components: Vec<SalaryComponent>,
    pub total: f64,
}

pub fn salary_label(column: &str) -> String {
    column.replace(AMOUNT_SUFFIX, "")
}

pub fn salary_breakup(record: &EmployeeRecord) -> SalaryBreakup {
    let amounts: Vec<(String, f64)> = SALARY_COLUMNS
        .iter()
        .map(|c| (salary_label(c), clean_amount(record.get(c))))
        .collect();
    let max = amounts.iter().map(|(_, a)| *a).fold(0.0_f64, f64::max);
    let total: f64 = amounts.iter().map(|(_, a)| *a).sum();
    SalaryBreakup {
        components: amounts
            .into_iter()
            .map(|(component, amount)| SalaryComponent {
                component,
                amount,
                ratio: if max > 0.0 { amount / max } else { 0.0 },
            })
            .collect(),
        total,
    }
}

/// Inputs shared by every editable section of one form.
#[derive(Debug, Clone)]
pub struct EditContext {
    pub reserved: ReservedColumns,
    pub division_options: Vec<String>,
}

/// Stored divisions, with the configured default always offered first.
pub fn division_options(stored: Vec<String>, default_option: &str) -> Vec<String> {
    let mut options = stored;
    if !options.iter().any(|o| o == default_option) {
        options.insert(0, default_option.to_string());
    }
    options
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<NumberInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberInput {
    pub min: f64,
    pub step: f64,
    pub decimals: usize,
}

fn editable_fields<'a>(
    fields: &'a [FieldSpec],
    reserved: &'a ReservedColumns,
) -> impl Iterator<Item = &'a FieldSpec> + 'a {
    fields
        .iter()
        .filter(move |f| f.name != reserved.id && f.name != reserved.pin)
}

/// Widget descriptors with defaults taken from the existing row.
pub fn render_editable(
    fields: &[FieldSpec],
    record: &EmployeeRecord,
    ctx: &EditContext,
) -> Vec<FormField> {
    editable_fields(fields, &ctx.reserved)
        .map(|f| {
            let existing = record.get(&f.name);
            let mut field = FormField {
                name: f.name.clone(),
                kind: f.kind,
                default: serde_json::Value::Null,
                options: None,
                allow_new: false,
                current_file: None,
                number: None,
                warning: None,
            };
            match f.kind {
                FieldKind::DivisionChoice => {
                    field.default = serde_json::json!(division_default(existing, ctx));
                    field.options = Some(ctx.division_options.clone());
                    field.allow_new = true;
                }
                FieldKind::Date => {
                    let (d, parsed) = date_default(existing);
                    if !parsed && !is_blank(existing) {
                        field.warning = Some(format!(
                            "stored date {:?} could not be read; defaulting to today",
                            display_value(existing)
                        ));
                    }
                    field.default = serde_json::json!(format_date(d));
                }
                FieldKind::BooleanChoice => {
                    field.default = serde_json::json!(yes_no_default(existing));
                    field.options = Some(YES_NO_OPTIONS.iter().map(|s| s.to_string()).collect());
                }
                FieldKind::File => {
                    if !is_blank(existing) {
                        field.current_file = Some(display_value(existing));
                    }
                }
                FieldKind::Numeric => {
                    field.default = serde_json::json!(format_number(number_default(existing)));
                    field.number = Some(NumberInput {
                        min: 0.0,
                        step: NUMBER_STEP,
                        decimals: NUMBER_DISPLAY_DECIMALS,
                    });
                }
                FieldKind::EnumeratedText | FieldKind::FreeText => {
                    field.default = serde_json::json!(display_value(existing));
                }
            }
            field
        })
        .collect()
}

fn division_default(existing: &Value, ctx: &EditContext) -> String {
    let current = display_value(existing);
    if ctx.division_options.contains(&current) {
        current
    } else {
        ctx.division_options.first().cloned().unwrap_or_default()
    }
}

fn yes_no_default(existing: &Value) -> &'static str {
    let current = display_value(existing);
    YES_NO_OPTIONS
        .iter()
        .find(|o| **o == current)
        .copied()
        .unwrap_or(YES_NO_OPTIONS[0])
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content: Option<Vec<u8>>,
}

/// What the user entered on the edit page, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    pub values: HashMap<String, serde_json::Value>,
    pub new_division: Option<String>,
    pub uploads: HashMap<String, Upload>,
}

fn submitted_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn submitted_number(v: &serde_json::Value) -> Option<f64> {
    let n = match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n >= 0.0).then_some(n)
}

/// One value per section field, following the field's kind rules.
///
/// A file field with neither an upload nor a stored reference yields no entry.
pub fn collect_section(
    fields: &[FieldSpec],
    record: &EmployeeRecord,
    ctx: &EditContext,
    submission: &FormSubmission,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for f in editable_fields(fields, &ctx.reserved) {
        let existing = record.get(&f.name);
        let submitted = submission.values.get(&f.name);
        let value = match f.kind {
            FieldKind::DivisionChoice => {
                let new_value = submission
                    .new_division
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                let chosen = match new_value {
                    Some(v) => v.to_string(),
                    None => match submitted.and_then(submitted_text) {
                        Some(v) if ctx.division_options.contains(&v) => v,
                        Some(v) => {
                            tracing::warn!(
                                column = %f.name,
                                value = %v,
                                "division not among options; keeping default"
                            );
                            division_default(existing, ctx)
                        }
                        None => division_default(existing, ctx),
                    },
                };
                Value::Text(chosen)
            }
            FieldKind::Date => {
                let parsed = submitted
                    .and_then(submitted_text)
                    .and_then(|s| parse_date(&s));
                let d = match parsed {
                    Some(d) => d,
                    None => {
                        if submitted.is_some() {
                            tracing::warn!(
                                column = %f.name,
                                "submitted date unreadable; using default"
                            );
                        }
                        date_default(existing).0
                    }
                };
                Value::Text(format_date(d))
            }
            FieldKind::BooleanChoice => {
                let chosen = submitted
                    .and_then(submitted_text)
                    .filter(|s| YES_NO_OPTIONS.contains(&s.as_str()))
                    .unwrap_or_else(|| yes_no_default(existing).to_string());
                Value::Text(chosen)
            }
            FieldKind::File => match submission.uploads.get(&f.name) {
                Some(upload) => Value::Text(upload.name.clone()),
                None if !is_blank(existing) => existing.clone(),
                None => continue,
            },
            FieldKind::Numeric => {
                let n = submitted
                    .and_then(submitted_number)
                    .unwrap_or_else(|| number_default(existing));
                Value::Real(n)
            }
            FieldKind::EnumeratedText | FieldKind::FreeText => Value::Text(
                submitted
                    .and_then(submitted_text)
                    .unwrap_or_else(|| display_value(existing)),
            ),
        };
        out.insert(f.name.clone(), value);
    }
    out
}

/// Drops uploads aimed at anything but a file field of an editable section.
/// Returns the dropped column names, sorted.
pub fn retain_file_uploads(layout: &SectionLayout, submission: &mut FormSubmission) -> Vec<String> {
    let is_file_field = |column: &str| {
        Section::ALL.iter().filter(|s| s.editable()).any(|s| {
            layout
                .section(*s)
                .fields
                .iter()
                .any(|f| f.name == column && f.kind == FieldKind::File)
        })
    };
    let mut dropped: Vec<String> = submission
        .uploads
        .keys()
        .filter(|c| !is_file_field(c))
        .cloned()
        .collect();
    dropped.sort();
    for column in &dropped {
        submission.uploads.remove(column);
    }
    dropped
}

/// Every editable section's mapping merged into one update.
pub fn collect_all(
    layout: &SectionLayout,
    record: &EmployeeRecord,
    ctx: &EditContext,
    submission: &FormSubmission,
) -> BTreeMap<String, Value> {
    let mut combined = BTreeMap::new();
    for section in Section::ALL.iter().filter(|s| s.editable()) {
        let fields = &layout.section(*section).fields;
        combined.extend(collect_section(fields, record, ctx, submission));
    }
    combined
}
