use crate::alignment::report::{BatchSummary, DecisionRecord, RecordOutcome};
use crate::alignment::span_tracker::UsedSpanTracker;
use crate::error::AlignmentError;
use crate::pipeline::records::PromptRecord;
use crate::pipeline::runtime::PromptAligner;
use crate::pipeline::traits::{ReferenceStore, Transcriber};

/// Corrected records plus one decision per input line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    /// Well-formed records in input order, text replaced when the alignment was accepted.
    pub records: Vec<PromptRecord>,
    pub decisions: Vec<DecisionRecord>,
}

impl BatchOutput {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_records(&self.decisions)
    }

    /// Summary header, a blank line, then one line per decision.
    pub fn decision_log(&self) -> String {
        let mut out = self.summary().header_lines().join("\n");
        out.push_str("\n\n");
        for decision in &self.decisions {
            out.push_str(&decision.log_line());
            out.push('\n');
        }
        out
    }
}

/// Sequential driver: one [`UsedSpanTracker`] for the current reference
/// document, reset whenever a record belongs to another document.
pub struct BatchDriver<'a> {
    aligner: &'a PromptAligner,
    references: &'a dyn ReferenceStore,
}

struct DocumentState {
    key: String,
    tracker: UsedSpanTracker,
}

impl<'a> BatchDriver<'a> {
    pub fn new(aligner: &'a PromptAligner, references: &'a dyn ReferenceStore) -> Self {
        Self {
            aligner,
            references,
        }
    }

    pub fn run<I>(&self, records: I) -> BatchOutput
    where
        I: IntoIterator<Item = Result<PromptRecord, AlignmentError>>,
    {
        self.run_with_progress(records, |_| {})
    }

    /// Like [`BatchDriver::run`], calling `on_decision` after every input line.
    pub fn run_with_progress<I, F>(&self, records: I, mut on_decision: F) -> BatchOutput
    where
        I: IntoIterator<Item = Result<PromptRecord, AlignmentError>>,
        F: FnMut(&DecisionRecord),
    {
        let mut output = BatchOutput::default();
        let mut document: Option<DocumentState> = None;

        for parsed in records {
            let decision = match parsed {
                Ok(record) => {
                    let (decision, corrected) = self.process(record, &mut document);
                    output.records.push(corrected);
                    decision
                }
                Err(err) => {
                    tracing::warn!(error = %err, "batch: skipping malformed record");
                    match err {
                        AlignmentError::MalformedRecord { line, reason, raw } => {
                            DecisionRecord::malformed(&format!("line:{line}"), &raw, reason)
                        }
                        other => DecisionRecord::malformed("line:?", "", other.to_string()),
                    }
                }
            };
            on_decision(&decision);
            output.decisions.push(decision);
        }
        output
    }

    fn process(
        &self,
        record: PromptRecord,
        document: &mut Option<DocumentState>,
    ) -> (DecisionRecord, PromptRecord) {
        let Some(reference) = self.references.lookup(&record.id) else {
            tracing::info!(id = %record.id, "batch: no reference document");
            let decision =
                DecisionRecord::unaligned(&record.id, &record.text, RecordOutcome::NoReference);
            return (decision, record);
        };

        if document.as_ref().is_some_and(|d| d.key != reference.key) {
            *document = None;
        }
        let state = document.get_or_insert_with(|| {
            tracing::debug!(document = reference.key, "batch: switching reference document");
            DocumentState {
                key: reference.key.to_string(),
                tracker: UsedSpanTracker::new(),
            }
        });

        let result = self
            .aligner
            .align(&record.text, reference.text, state.tracker.spans());
        if result.accepted && result.score >= self.aligner.high_confidence_threshold() {
            if let Some(span) = result.consumed_span {
                state.tracker.record(span);
            }
        }
        tracing::info!(
            id = %record.id,
            decision = result.decision.as_str(),
            score = format!("{:.3}", result.score),
            claimed_spans = state.tracker.len(),
            "batch: record aligned"
        );

        let decision = DecisionRecord::aligned(&record.id, &record.text, &result);
        let corrected = PromptRecord::new(record.id, decision.final_text.clone());
        (decision, corrected)
    }
}

/// An audio clip waiting for transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub id: String,
    pub audio: Vec<u8>,
}

/// Transcribes clips into prompt records. A failed or empty transcription
/// yields a record with empty text so every clip stays accounted for.
pub fn transcribe_clips<T>(transcriber: &T, clips: &[AudioClip]) -> Vec<PromptRecord>
where
    T: Transcriber + ?Sized,
{
    clips
        .iter()
        .map(|clip| {
            let text = match transcriber.transcribe(&clip.audio) {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(id = %clip.id, error = %err, "transcription failed");
                    String::new()
                }
            };
            if text.is_empty() {
                tracing::warn!(id = %clip.id, "transcription produced no text");
            }
            PromptRecord::new(clip.id.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlignerConfig;
    use crate::pipeline::builder::PromptAlignerBuilder;
    use crate::pipeline::defaults::HallucinationFilter;
    use crate::pipeline::records::{parse_records, InMemoryReferenceStore};
    use crate::types::Decision;

    const DOC_A: &str = "11111111111111111";
    const DOC_B: &str = "22222222222222222";

    fn aligner() -> PromptAligner {
        PromptAlignerBuilder::new(AlignerConfig::default())
            .build()
            .expect("default config is valid")
    }

    fn store() -> InMemoryReferenceStore {
        let mut store = InMemoryReferenceStore::new();
        store.insert(DOC_A, "hôm qua trời mưa rất to");
        store.insert(DOC_B, "hôm qua trời mưa rất to");
        store
    }

    fn outcomes(output: &BatchOutput) -> Vec<&'static str> {
        output
            .decisions
            .iter()
            .map(|d| d.outcome.as_str())
            .collect()
    }

    #[test]
    fn claimed_span_is_not_reused_within_document() {
        let aligner = aligner();
        let store = store();
        let input = format!(
            "tin_{DOC_A}_0.wav|hôm qua trời mua rất to\ntin_{DOC_A}_1.wav|hôm qua trời mua rất to\n"
        );
        let output = BatchDriver::new(&aligner, &store).run(parse_records(&input));
        assert_eq!(outcomes(&output), ["ASSEMBLED_MATCH", "SPAN_CLAIMED"]);
        assert_eq!(output.records[0].text, "hôm qua trời mưa rất to");
        assert_eq!(output.records[1].text, "hôm qua trời mua rất to");
    }

    #[test]
    fn tracker_resets_on_document_change() {
        let aligner = aligner();
        let store = store();
        let input = format!(
            "tin_{DOC_A}_0.wav|hôm qua trời mua rất to\ntin_{DOC_B}_0.wav|hôm qua trời mua rất to\n"
        );
        let output = BatchDriver::new(&aligner, &store).run(parse_records(&input));
        assert_eq!(outcomes(&output), ["ASSEMBLED_MATCH", "ASSEMBLED_MATCH"]);
    }

    #[test]
    fn low_confidence_match_does_not_claim_span() {
        let aligner = aligner();
        let mut store = InMemoryReferenceStore::new();
        store.insert(DOC_A, "sáng nay chúng tôi cùng đi học tại trường");
        let input = format!(
            "tin_{DOC_A}_0.wav|hôm nay chúng tôi đi học\ntin_{DOC_A}_1.wav|hôm nay chúng tôi đi học\n"
        );
        let output = BatchDriver::new(&aligner, &store).run(parse_records(&input));
        // Scores around 0.77: accepted, below the 0.85 claim bar.
        assert_eq!(outcomes(&output), ["ASSEMBLED_MATCH", "ASSEMBLED_MATCH"]);
        assert_eq!(output.decisions[0].consumed_span, output.decisions[1].consumed_span);
    }

    #[test]
    fn missing_reference_and_malformed_lines_are_logged() {
        let aligner = aligner();
        let store = store();
        let input = format!("khong_co_bai_0.wav|xin chào\nkhông có dấu tách\ntin_{DOC_A}_0.wav|\n");
        let mut seen = 0;
        let output =
            BatchDriver::new(&aligner, &store).run_with_progress(parse_records(&input), |_| seen += 1);
        assert_eq!(seen, 3);
        assert_eq!(outcomes(&output), ["NO_REFERENCE", "MALFORMED", "EMPTY_INPUT"]);
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].text, "xin chào");
        assert_eq!(output.decisions[1].id, "line:2");

        let log = output.decision_log();
        assert!(log.starts_with("TOTAL: 3\n"));
        assert!(log.contains("khong_co_bai_0.wav|NO_REFERENCE|0.000|ORIGINAL: xin chào|FINAL: xin chào"));
        assert!(log.contains(
            "line:2|MALFORMED|0.000|ORIGINAL: không có dấu tách|FINAL: không có dấu tách|REASON: missing '|' separator"
        ));
        assert_eq!(output.decisions[1].reason.as_deref(), Some("missing '|' separator"));
    }

    #[test]
    fn summary_matches_decisions() {
        let aligner = aligner();
        let store = store();
        let input = format!(
            "tin_{DOC_A}_0.wav|hôm qua trời mưa rất to\ntin_{DOC_A}_1.wav|hôm qua trời mua rất to\n"
        );
        let output = BatchDriver::new(&aligner, &store).run(parse_records(&input));
        let summary = output.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.accepted, 1);
        assert_eq!(
            output.decisions[0].outcome,
            RecordOutcome::Aligned(Decision::ExactMatch)
        );
        assert_eq!(summary.counts.get("SPAN_CLAIMED"), Some(&1));
    }

    struct ScriptedTranscriber;

    impl Transcriber for ScriptedTranscriber {
        fn transcribe(&self, audio: &[u8]) -> Result<String, AlignmentError> {
            match audio.first() {
                Some(0) => Ok(" hôm qua trời mưa ".to_string()),
                Some(1) => Ok("nhớ đăng ký kênh".to_string()),
                _ => Err(AlignmentError::runtime("transcribe", "decoder crashed")),
            }
        }
    }

    #[test]
    fn transcribe_clips_keeps_every_clip() {
        let clips = vec![
            AudioClip {
                id: "a.wav".to_string(),
                audio: vec![0],
            },
            AudioClip {
                id: "b.wav".to_string(),
                audio: vec![1],
            },
            AudioClip {
                id: "c.wav".to_string(),
                audio: vec![],
            },
        ];
        let records = transcribe_clips(&HallucinationFilter::new(ScriptedTranscriber), &clips);
        assert_eq!(
            records,
            [
                PromptRecord::new("a.wav", "hôm qua trời mưa"),
                PromptRecord::new("b.wav", ""),
                PromptRecord::new("c.wav", ""),
            ]
        );
    }
}
