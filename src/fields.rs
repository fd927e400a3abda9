use serde::{Deserialize, Serialize};

pub const DIVISION_COLUMN: &str = "DIVISION";
pub const DATE_COLUMNS: &[&str] = &["Date of Joining", "DOB"];
pub const YES_NO_OPTIONS: [&str; 2] = ["Y", "N"];

const YES_NO_MARKER: &str = "Y / N choice radio";
const FILE_MARKERS: &[&str] = &["document upload / display", "photo upload / picture display"];
const NUMBER_MARKER: &str = "number input field";
const ENUM_MARKERS: &[&str] = &["drop down", "enum"];

/// Input/display kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    DivisionChoice,
    Date,
    BooleanChoice,
    File,
    Numeric,
    /// No option set is enforced yet; edits behave like free text.
    EnumeratedText,
    FreeText,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DivisionChoice => "division-choice",
            Self::Date => "date",
            Self::BooleanChoice => "boolean-choice",
            Self::File => "file",
            Self::Numeric => "numeric",
            Self::EnumeratedText => "enumerated-text",
            Self::FreeText => "free-text",
        }
    }
}

/// Case-sensitive; first matching rule wins.
pub fn classify(column: &str) -> FieldKind {
    if column == DIVISION_COLUMN {
        return FieldKind::DivisionChoice;
    }
    if DATE_COLUMNS.contains(&column) {
        return FieldKind::Date;
    }
    if column.contains(YES_NO_MARKER) {
        return FieldKind::BooleanChoice;
    }
    if FILE_MARKERS.iter().any(|m| column.contains(m)) {
        return FieldKind::File;
    }
    if column.contains(NUMBER_MARKER) {
        return FieldKind::Numeric;
    }
    if ENUM_MARKERS.iter().any(|m| column.contains(m)) {
        return FieldKind::EnumeratedText;
    }
    FieldKind::FreeText
}
