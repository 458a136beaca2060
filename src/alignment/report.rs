use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::types::{AlignmentResult, Decision, Span};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// What happened to one input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOutcome {
    Aligned(Decision),
    /// No reference document matched the record id.
    NoReference,
    /// The input line could not be parsed as `id|text`.
    Malformed,
}

impl RecordOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aligned(decision) => decision.as_str(),
            Self::NoReference => "NO_REFERENCE",
            Self::Malformed => "MALFORMED",
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Aligned(decision) if decision.is_accepted())
    }
}

impl Serialize for RecordOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    /// Record id, or `line:<n>` for a malformed line.
    pub id: String,
    pub outcome: RecordOutcome,
    pub score: f64,
    pub original: String,
    pub final_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_span: Option<Span>,
    /// Why the record never reached the aligner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DecisionRecord {
    pub fn aligned(id: &str, original: &str, result: &AlignmentResult) -> Self {
        Self {
            id: id.to_string(),
            outcome: RecordOutcome::Aligned(result.decision),
            score: result.score,
            original: original.to_string(),
            final_text: result.final_text(original).to_string(),
            consumed_span: result.consumed_span,
            reason: None,
        }
    }

    pub fn unaligned(id: &str, original: &str, outcome: RecordOutcome) -> Self {
        Self {
            id: id.to_string(),
            outcome,
            score: 0.0,
            original: original.to_string(),
            final_text: original.to_string(),
            consumed_span: None,
            reason: None,
        }
    }

    /// Unparseable input line, kept verbatim with the parse failure.
    pub fn malformed(id: &str, raw_line: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::unaligned(id, raw_line, RecordOutcome::Malformed)
        }
    }

    /// `id|DECISION|score|ORIGINAL: ...|FINAL: ...`, plus `|REASON: ...` for skipped lines.
    pub fn log_line(&self) -> String {
        let mut line = format!(
            "{}|{}|{:.3}|ORIGINAL: {}|FINAL: {}",
            self.id,
            self.outcome.as_str(),
            self.score,
            self.original,
            self.final_text
        );
        if let Some(reason) = &self.reason {
            line.push_str("|REASON: ");
            line.push_str(reason);
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    /// Records whose final text differs from the original.
    pub corrected: usize,
    pub counts: BTreeMap<&'static str, usize>,
    /// Mean score over records that reached the aligner.
    pub mean_score: f64,
}

impl BatchSummary {
    pub fn from_records(records: &[DecisionRecord]) -> Self {
        let mut counts = BTreeMap::new();
        let mut accepted = 0;
        let mut corrected = 0;
        let mut score_sum = 0.0;
        let mut scored = 0usize;
        for record in records {
            *counts.entry(record.outcome.as_str()).or_insert(0) += 1;
            if record.outcome.is_accepted() {
                accepted += 1;
            }
            if record.final_text != record.original {
                corrected += 1;
            }
            if matches!(record.outcome, RecordOutcome::Aligned(_)) {
                score_sum += record.score;
                scored += 1;
            }
        }
        Self {
            total: records.len(),
            accepted,
            corrected,
            counts,
            mean_score: if scored == 0 {
                0.0
            } else {
                score_sum / scored as f64
            },
        }
    }

    /// Header block of the text decision log.
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("TOTAL: {}", self.total),
            format!("ACCEPTED: {}", self.accepted),
            format!("CORRECTED: {}", self.corrected),
            format!("MEAN_SCORE: {:.3}", self.mean_score),
        ];
        lines.extend(
            self.counts
                .iter()
                .map(|(outcome, count)| format!("{outcome}: {count}")),
        );
        lines
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub prompts_path: String,
    pub references_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub summary: BatchSummary,
    pub records: Vec<DecisionRecord>,
}

pub fn build_report(meta: Meta, records: Vec<DecisionRecord>) -> Report {
    Report {
        schema_version: REPORT_SCHEMA_VERSION,
        meta,
        summary: BatchSummary::from_records(&records),
        records,
    }
}
