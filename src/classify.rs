//! Filename-based document recognition.
//!
//! Uploaded files are tagged by keyword rules over the lower-cased filename.
//! The rule list is a fixed priority order: the first matching rule wins, so
//! "factura-contract.pdf" is an invoice.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::TypeTag;

/// How a rule's keywords combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    /// Any keyword present.
    AnyOf(&'static [&'static str]),
    /// Every keyword present.
    AllOf(&'static [&'static str]),
}

impl KeywordMatch {
    fn matches(&self, lower: &str) -> bool {
        match self {
            Self::AnyOf(words) => words.iter().any(|w| lower.contains(w)),
            Self::AllOf(words) => words.iter().all(|w| lower.contains(w)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub keywords: KeywordMatch,
    pub tag: TypeTag,
}

/// Recognition rules in priority order.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["factur", "invoice"]),
        tag: TypeTag::Invoice,
    },
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["contract"]),
        tag: TypeTag::Contract,
    },
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["aviz"]),
        tag: TypeTag::DeliveryNote,
    },
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["cec", "check"]),
        tag: TypeTag::Check,
    },
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["bon", "receipt"]),
        tag: TypeTag::Receipt,
    },
    ClassificationRule {
        keywords: KeywordMatch::AllOf(&["raport", "casa"]),
        tag: TypeTag::CashReport,
    },
    ClassificationRule {
        keywords: KeywordMatch::AnyOf(&["extras", "statement"]),
        tag: TypeTag::BankStatement,
    },
    ClassificationRule {
        keywords: KeywordMatch::AllOf(&["proces", "verbal"]),
        tag: TypeTag::OfficialReport,
    },
];

/// Tag a document by its filename. Never fails: no match is `TypeTag::Unknown`.
pub fn classify(filename: &str) -> TypeTag {
    let lower = filename.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.keywords.matches(&lower))
        .map(|rule| rule.tag)
        .unwrap_or(TypeTag::Unknown)
}

/// Broad file kind, derived from the extension. Drives the row icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
    Spreadsheet,
    Text,
    Code,
    Other,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Self {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Self::Other,
        };
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => Self::Image,
            "csv" | "xlsx" | "xls" => Self::Spreadsheet,
            "txt" | "doc" | "docx" => Self::Text,
            "json" => Self::Code,
            _ => Self::Other,
        }
    }

    /// Material Symbols icon name for this kind.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pdf => "picture_as_pdf",
            Self::Image => "image",
            Self::Spreadsheet => "summarize",
            Self::Text => "article",
            Self::Code => "code",
            Self::Other => "draft",
        }
    }
}

/// Strip path components and separators, cap the length.
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.trim().is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
