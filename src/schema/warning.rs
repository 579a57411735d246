use serde::{Deserialize, Serialize};

/// Which pacing rule produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PainOverload,
    ShortMisunderstanding,
    EarlyRedemption,
    MissingClimax,
    Custom,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PainOverload => "pain-overload",
            Self::ShortMisunderstanding => "short-misunderstanding",
            Self::EarlyRedemption => "early-redemption",
            Self::MissingClimax => "missing-climax",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A pacing defect found in a chapter sequence. Not a program error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmWarning {
    /// Stable key, e.g. `pain-overload-3`.
    pub id: String,
    pub kind: WarningKind,
    pub message: String,
    /// 1-based chapter the warning points at, if any.
    pub chapter_index: Option<usize>,
    pub severity: Severity,
}
