//! Guardrail rule precedence, outcome shaping, and confidence
//! aggregation.

use ragward::guardrail::{REFUSAL_MESSAGE, WARNING_BANNER};
use ragward::{
    compute_confidence, guardrail_decision, AnswerEvaluation, Citation, ConfidenceLabel,
    ConfidenceLevel, HallucinationCheck, SafetyCheck, SemanticScore,
};

const ANSWER: &str = "Returns are accepted within 30 days.";

fn evaluation(overlap_score: usize, confidence: ConfidenceLabel) -> AnswerEvaluation {
    AnswerEvaluation { overlap_score, source_count: 3, confidence }
}

fn semantic(average: f32, confidence: ConfidenceLabel) -> SemanticScore {
    SemanticScore { chunk_scores: vec![average], average, max: average, min: average, confidence }
}

fn hallucination(score: f32) -> HallucinationCheck {
    HallucinationCheck { score, hallucinated: score < 0.55 }
}

fn safe() -> SafetyCheck {
    SafetyCheck { safe: true, category: None, score: 0.1 }
}

fn unsafe_(category: &str) -> SafetyCheck {
    SafetyCheck { safe: false, category: Some(category.to_string()), score: 0.9 }
}

fn cited(n: usize) -> Vec<Citation> {
    (0..n)
        .map(|i| Citation {
            sentence: format!("sentence {i}"),
            source_doc_id: Some("doc".to_string()),
            score: 0.8,
        })
        .collect()
}

fn uncited(n: usize) -> Vec<Citation> {
    (0..n)
        .map(|i| Citation { sentence: format!("sentence {i}"), source_doc_id: None, score: 0.1 })
        .collect()
}

fn healthy_signals() -> (AnswerEvaluation, HallucinationCheck, SemanticScore, SafetyCheck, Vec<Citation>)
{
    (
        evaluation(12, ConfidenceLabel::High),
        hallucination(0.8),
        semantic(0.85, ConfidenceLabel::High),
        safe(),
        cited(2),
    )
}

#[test]
fn safety_trumps_every_other_signal() {
    // All other signals at their best: the unsafe verdict still wins.
    let (eval, halluc, sem, _, citations) = healthy_signals();
    let decision =
        guardrail_decision(ANSWER, &eval, &halluc, &sem, &unsafe_("violence"), &citations);

    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("unsafe_content:violence"));
    assert_eq!(decision.final_answer, REFUSAL_MESSAGE);
}

#[test]
fn zero_overlap_blocks_regardless_of_semantic_signals() {
    let decision = guardrail_decision(
        ANSWER,
        &evaluation(0, ConfidenceLabel::Low),
        &hallucination(0.9),
        &semantic(0.95, ConfidenceLabel::High),
        &safe(),
        &cited(2),
    );

    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("no_evidence_in_context"));
    assert_eq!(decision.final_answer, REFUSAL_MESSAGE);
}

#[test]
fn severe_hallucination_blocks_before_the_warning_tier() {
    let (eval, _, sem, safety, citations) = healthy_signals();
    let decision = guardrail_decision(ANSWER, &eval, &hallucination(0.1), &sem, &safety, &citations);

    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("severe_hallucination"));
}

#[test]
fn possible_hallucination_warns_with_banner() {
    let (eval, _, sem, safety, citations) = healthy_signals();
    let decision = guardrail_decision(ANSWER, &eval, &hallucination(0.4), &sem, &safety, &citations);

    assert!(decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("possible_hallucination"));
    assert_eq!(decision.final_answer, format!("{WARNING_BANNER}{ANSWER}"));
}

#[test]
fn low_semantic_confidence_warns() {
    let (eval, halluc, _, safety, citations) = healthy_signals();
    let decision = guardrail_decision(
        ANSWER,
        &eval,
        &halluc,
        &semantic(0.2, ConfidenceLabel::Low),
        &safety,
        &citations,
    );

    assert!(decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("low_semantic_confidence"));
}

#[test]
fn low_keyword_overlap_warns() {
    let (_, halluc, sem, safety, citations) = healthy_signals();
    let decision = guardrail_decision(
        ANSWER,
        &evaluation(2, ConfidenceLabel::Low),
        &halluc,
        &sem,
        &safety,
        &citations,
    );

    assert!(decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("low_keyword_overlap"));
}

#[test]
fn more_than_one_uncited_sentence_warns() {
    let (eval, halluc, sem, safety, _) = healthy_signals();
    let decision = guardrail_decision(ANSWER, &eval, &halluc, &sem, &safety, &uncited(2));

    assert!(decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("weak_citations"));
}

#[test]
fn one_uncited_sentence_is_tolerated() {
    let (eval, halluc, sem, safety, _) = healthy_signals();
    let mut citations = cited(2);
    citations.extend(uncited(1));
    let decision = guardrail_decision(ANSWER, &eval, &halluc, &sem, &safety, &citations);

    assert!(decision.allowed);
    assert_eq!(decision.reason, None);
    assert_eq!(decision.final_answer, ANSWER);
}

#[test]
fn clean_signals_pass_the_answer_through_verbatim() {
    let (eval, halluc, sem, safety, citations) = healthy_signals();
    let decision = guardrail_decision(ANSWER, &eval, &halluc, &sem, &safety, &citations);

    assert!(decision.allowed);
    assert_eq!(decision.reason, None);
    assert_eq!(decision.final_answer, ANSWER);
}

// ── Confidence aggregation ─────────────────────────────────────────

#[test]
fn unsafe_content_floors_confidence_at_zero() {
    let (eval, halluc, sem, _, citations) = healthy_signals();
    let report = compute_confidence(&eval, &sem, &halluc, &citations, &unsafe_("hate"));
    assert_eq!(report.score, 0);
    assert_eq!(report.level, ConfidenceLevel::Blocked);
}

#[test]
fn severe_hallucination_floors_confidence_at_fifteen() {
    let (eval, _, sem, safety, citations) = healthy_signals();
    let report = compute_confidence(&eval, &sem, &hallucination(0.1), &citations, &safety);
    assert_eq!(report.score, 15);
    assert_eq!(report.level, ConfidenceLevel::VeryLow);
}

#[test]
fn clean_signals_score_one_hundred() {
    let (eval, halluc, sem, safety, citations) = healthy_signals();
    let report = compute_confidence(&eval, &sem, &halluc, &citations, &safety);
    assert_eq!(report.score, 100);
    assert_eq!(report.level, ConfidenceLevel::High);
}

#[test]
fn deductions_accumulate_across_signals() {
    let report = compute_confidence(
        &evaluation(5, ConfidenceLabel::Medium),
        &semantic(0.3, ConfidenceLabel::Low),
        &hallucination(0.6),
        &uncited(2),
        &safe(),
    );
    // 100 - 25 (semantic low) - 10 (lexical medium) - 15 (weak citations)
    assert_eq!(report.score, 50);
    assert_eq!(report.level, ConfidenceLevel::Low);
}

#[test]
fn improving_any_signal_never_lowers_confidence() {
    let labels =
        [ConfidenceLabel::Low, ConfidenceLabel::Medium, ConfidenceLabel::High];

    // Semantic confidence monotonicity, everything else held fixed.
    let mut previous = 0;
    for label in labels {
        let report = compute_confidence(
            &evaluation(5, ConfidenceLabel::Medium),
            &semantic(0.5, label),
            &hallucination(0.6),
            &cited(2),
            &safe(),
        );
        assert!(report.score >= previous);
        previous = report.score;
    }

    // Lexical confidence monotonicity.
    let mut previous = 0;
    for label in labels {
        let report = compute_confidence(
            &evaluation(5, label),
            &semantic(0.5, ConfidenceLabel::Medium),
            &hallucination(0.6),
            &cited(2),
            &safe(),
        );
        assert!(report.score >= previous);
        previous = report.score;
    }

    // Fixing citations never lowers the score.
    let weak = compute_confidence(
        &evaluation(5, ConfidenceLabel::High),
        &semantic(0.8, ConfidenceLabel::High),
        &hallucination(0.8),
        &uncited(3),
        &safe(),
    );
    let strong = compute_confidence(
        &evaluation(5, ConfidenceLabel::High),
        &semantic(0.8, ConfidenceLabel::High),
        &hallucination(0.8),
        &cited(3),
        &safe(),
    );
    assert!(strong.score >= weak.score);

    // Crossing out of severe hallucination never lowers the score.
    let severe = compute_confidence(
        &evaluation(5, ConfidenceLabel::High),
        &semantic(0.8, ConfidenceLabel::High),
        &hallucination(0.1),
        &cited(3),
        &safe(),
    );
    let grounded = compute_confidence(
        &evaluation(5, ConfidenceLabel::High),
        &semantic(0.8, ConfidenceLabel::High),
        &hallucination(0.8),
        &cited(3),
        &safe(),
    );
    assert!(grounded.score >= severe.score);
}
