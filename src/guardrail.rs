//! Rule-based guardrail decision engine and confidence aggregation.
//!
//! The decision is an ordered chain of predicate → outcome pairs evaluated
//! short-circuit: the first rule that fires wins and later rules are never
//! consulted. The order encodes a severity hierarchy — safety over
//! evidence over hallucination over the softer confidence signals — and
//! must not be reordered: a borderline answer would receive a different
//! message.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::evaluator::{
    AnswerEvaluation, Citation, ConfidenceLabel, HallucinationCheck, SafetyCheck, SemanticScore,
};

/// Hallucination scores below this hard-block the answer outright.
pub const SEVERE_HALLUCINATION_THRESHOLD: f32 = 0.25;

/// Fixed refusal text substituted for a blocked answer.
pub const REFUSAL_MESSAGE: &str =
    "I can't share that answer because it did not pass safety and grounding checks.";

/// Fixed banner prepended to an answer that is allowed with a warning.
pub const WARNING_BANNER: &str =
    "Note: this answer may be incomplete or weakly supported by the indexed documents.\n\n";

/// The final allow/warn/block verdict for one answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuardrailDecision {
    /// `false` when the answer was blocked and replaced with a refusal.
    pub allowed: bool,
    /// Which rule fired, or `None` for a clean allow.
    pub reason: Option<String>,
    /// The text actually shown to the caller: the refusal, the
    /// banner-prefixed answer, or the answer verbatim.
    pub final_answer: String,
}

/// Aggregate numeric confidence, informational only — it does not change
/// the guardrail verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceReport {
    /// Score in `[0, 100]`.
    pub score: u8,
    /// Bucketed level derived from the score.
    pub level: ConfidenceLevel,
}

/// Levels of the aggregate confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// The answer was blocked as unsafe.
    Blocked,
    /// The answer is most likely ungrounded.
    VeryLow,
    /// Score below 55.
    Low,
    /// Score in `[55, 80)`.
    Medium,
    /// Score of 80 or above.
    High,
}

/// Every signal the rule chain consults.
struct Signals<'a> {
    evaluation: &'a AnswerEvaluation,
    hallucination: &'a HallucinationCheck,
    semantic: &'a SemanticScore,
    safety: &'a SafetyCheck,
    citations: &'a [Citation],
}

enum Outcome {
    Block(String),
    Warn(String),
}

type Rule = fn(&Signals<'_>) -> Option<Outcome>;

/// The severity hierarchy, most severe first.
const RULES: &[Rule] = &[
    unsafe_content,
    no_evidence,
    severe_hallucination,
    possible_hallucination,
    low_semantic_confidence,
    low_keyword_overlap,
    weak_citations,
];

fn unsafe_content(signals: &Signals<'_>) -> Option<Outcome> {
    if signals.safety.safe {
        return None;
    }
    let category = signals.safety.category.as_deref().unwrap_or("unknown");
    Some(Outcome::Block(format!("unsafe_content:{category}")))
}

fn no_evidence(signals: &Signals<'_>) -> Option<Outcome> {
    (signals.evaluation.overlap_score == 0)
        .then(|| Outcome::Block("no_evidence_in_context".to_string()))
}

fn severe_hallucination(signals: &Signals<'_>) -> Option<Outcome> {
    (signals.hallucination.score < SEVERE_HALLUCINATION_THRESHOLD)
        .then(|| Outcome::Block("severe_hallucination".to_string()))
}

fn possible_hallucination(signals: &Signals<'_>) -> Option<Outcome> {
    signals.hallucination.hallucinated.then(|| Outcome::Warn("possible_hallucination".to_string()))
}

fn low_semantic_confidence(signals: &Signals<'_>) -> Option<Outcome> {
    (signals.semantic.confidence == ConfidenceLabel::Low)
        .then(|| Outcome::Warn("low_semantic_confidence".to_string()))
}

fn low_keyword_overlap(signals: &Signals<'_>) -> Option<Outcome> {
    (signals.evaluation.confidence == ConfidenceLabel::Low)
        .then(|| Outcome::Warn("low_keyword_overlap".to_string()))
}

fn weak_citations(signals: &Signals<'_>) -> Option<Outcome> {
    (unsupported_citations(signals.citations) > 1)
        .then(|| Outcome::Warn("weak_citations".to_string()))
}

fn unsupported_citations(citations: &[Citation]) -> usize {
    citations.iter().filter(|c| c.source_doc_id.is_none()).count()
}

/// Run the rule chain over the signals and produce the final verdict.
///
/// Blocked answers are replaced with [`REFUSAL_MESSAGE`]; warned answers
/// get [`WARNING_BANNER`] prepended; a clean allow passes `answer`
/// through verbatim with no reason.
pub fn guardrail_decision(
    answer: &str,
    evaluation: &AnswerEvaluation,
    hallucination: &HallucinationCheck,
    semantic: &SemanticScore,
    safety: &SafetyCheck,
    citations: &[Citation],
) -> GuardrailDecision {
    let signals = Signals { evaluation, hallucination, semantic, safety, citations };

    for rule in RULES {
        match rule(&signals) {
            Some(Outcome::Block(reason)) => {
                info!(reason = %reason, "guardrail blocked answer");
                return GuardrailDecision {
                    allowed: false,
                    reason: Some(reason),
                    final_answer: REFUSAL_MESSAGE.to_string(),
                };
            }
            Some(Outcome::Warn(reason)) => {
                info!(reason = %reason, "guardrail allowed answer with warning");
                return GuardrailDecision {
                    allowed: true,
                    reason: Some(reason),
                    final_answer: format!("{WARNING_BANNER}{answer}"),
                };
            }
            None => {}
        }
    }

    GuardrailDecision { allowed: true, reason: None, final_answer: answer.to_string() }
}

/// Aggregate the signals into a single informational confidence score.
///
/// Starts at 100 and deducts per weak signal; unsafe content and severe
/// hallucination short-circuit to fixed floor values.
pub fn compute_confidence(
    evaluation: &AnswerEvaluation,
    semantic: &SemanticScore,
    hallucination: &HallucinationCheck,
    citations: &[Citation],
    safety: &SafetyCheck,
) -> ConfidenceReport {
    if !safety.safe {
        return ConfidenceReport { score: 0, level: ConfidenceLevel::Blocked };
    }
    if hallucination.score < SEVERE_HALLUCINATION_THRESHOLD {
        return ConfidenceReport { score: 15, level: ConfidenceLevel::VeryLow };
    }

    let mut score: i32 = 100;

    match semantic.confidence {
        ConfidenceLabel::Low => score -= 25,
        ConfidenceLabel::Medium => score -= 10,
        ConfidenceLabel::High => {}
    }

    match evaluation.confidence {
        ConfidenceLabel::Low => score -= 20,
        ConfidenceLabel::Medium => score -= 10,
        ConfidenceLabel::High => {}
    }

    if unsupported_citations(citations) > 1 {
        score -= 15;
    }

    let score = score.clamp(0, 100) as u8;
    let level = if score >= 80 {
        ConfidenceLevel::High
    } else if score >= 55 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    ConfidenceReport { score, level }
}
