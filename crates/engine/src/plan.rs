//! Two-level weighted session composition.
//!
//! Questions are drawn without replacement, biased first by per-type
//! weight and then by per-question weight, which front-loads the heavy
//! types and items probabilistically while keeping same-type questions
//! from clustering the way a plain sort-by-weight would.

use std::collections::HashMap;

use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuestionId, QuestionKind};

const DEFAULT_WEIGHT: f64 = 1.0;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Weight configuration for the sampler.
///
/// Per-kind weights steer the first-level draw; a kind left unspecified
/// weighs 1 and a kind weighted 0 is never emitted. Per-question weights
/// steer the second-level draw within the chosen kind only, so a heavy
/// question cannot pull probability mass away from another kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerConfig {
    kind_weights: HashMap<QuestionKind, f64>,
    question_weights: HashMap<QuestionId, f64>,
}

impl SamplerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the weight of one question kind. Negative values clamp to 0.
    #[must_use]
    pub fn with_kind_weight(mut self, kind: QuestionKind, weight: f64) -> Self {
        self.set_kind_weight(kind, weight);
        self
    }

    /// Override the weight of one question. Negative values clamp to 0.
    #[must_use]
    pub fn with_question_weight(mut self, id: QuestionId, weight: f64) -> Self {
        self.set_question_weight(id, weight);
        self
    }

    pub fn set_kind_weight(&mut self, kind: QuestionKind, weight: f64) {
        self.kind_weights.insert(kind, sanitize(weight));
    }

    pub fn set_question_weight(&mut self, id: QuestionId, weight: f64) {
        self.question_weights.insert(id, sanitize(weight));
    }

    /// Replace all per-question weights (e.g. freshly derived from
    /// tracking data), keeping the kind weights untouched.
    pub fn replace_question_weights(&mut self, weights: HashMap<QuestionId, f64>) {
        self.question_weights = weights
            .into_iter()
            .map(|(id, weight)| (id, sanitize(weight)))
            .collect();
    }

    #[must_use]
    pub fn kind_weight(&self, kind: QuestionKind) -> f64 {
        self.kind_weights.get(&kind).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    #[must_use]
    pub fn question_weight(&self, id: &QuestionId) -> f64 {
        self.question_weights
            .get(id)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { DEFAULT_WEIGHT }
}

//
// ─── PLAN ──────────────────────────────────────────────────────────────────────
//

/// Result of a session draw: the fixed question sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── SAMPLER ───────────────────────────────────────────────────────────────────
//

/// Draws a session sequence from a question pool.
#[derive(Debug, Clone, Default)]
pub struct SessionSampler {
    config: SamplerConfig,
}

impl SessionSampler {
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw the whole pool without replacement, then truncate to `cap`.
    ///
    /// The pool is partitioned by kind and each partition is uniformly
    /// shuffled up front, so within-kind order carries no bias. Each round
    /// picks a kind proportionally to its weight over the still-non-empty
    /// partitions, then an item proportionally to its weight within that
    /// kind. Kinds weighted 0 are never emitted; if only zero-weight
    /// partitions remain, the draw stops there and the sequence comes out
    /// shorter than the pool.
    #[must_use]
    pub fn draw(&self, pool: &[Question], cap: Option<usize>) -> SessionPlan {
        let mut rng = rng();
        let mut partitions: Vec<(QuestionKind, Vec<Question>)> = QuestionKind::ALL
            .iter()
            .map(|kind| (*kind, Vec::new()))
            .collect();
        for question in pool {
            let slot = partitions
                .iter_mut()
                .find(|(kind, _)| *kind == question.kind())
                .expect("every kind has a partition");
            slot.1.push(question.clone());
        }
        for (_, questions) in &mut partitions {
            questions.shuffle(&mut rng);
        }

        let mut sequence = Vec::with_capacity(pool.len());
        loop {
            let total: f64 = partitions
                .iter()
                .filter(|(_, questions)| !questions.is_empty())
                .map(|(kind, _)| self.config.kind_weight(*kind))
                .sum();
            if total <= 0.0 {
                break;
            }

            let Some(partition) = self.pick_partition(&partitions, total, &mut rng) else {
                break;
            };
            let index = self.pick_question(&partitions[partition].1, &mut rng);
            sequence.push(partitions[partition].1.remove(index));
        }

        if let Some(cap) = cap {
            sequence.truncate(cap);
        }
        SessionPlan {
            questions: sequence,
        }
    }

    /// First-level draw: walk partitions in fixed kind order, subtracting
    /// weights from a uniform roll in [0, total).
    fn pick_partition(
        &self,
        partitions: &[(QuestionKind, Vec<Question>)],
        total: f64,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let mut roll = rng.random_range(0.0..total);
        for (index, (kind, questions)) in partitions.iter().enumerate() {
            if questions.is_empty() {
                continue;
            }
            let weight = self.config.kind_weight(*kind);
            if roll < weight {
                return Some(index);
            }
            roll -= weight;
        }
        // float residue can walk past the end; fall back to the last
        // partition that is actually drawable
        partitions
            .iter()
            .rposition(|(kind, questions)| {
                !questions.is_empty() && self.config.kind_weight(*kind) > 0.0
            })
    }

    /// Second-level draw among the remaining questions of one kind.
    fn pick_question(&self, questions: &[Question], rng: &mut impl Rng) -> usize {
        let total: f64 = questions
            .iter()
            .map(|question| self.config.question_weight(question.id()))
            .sum();
        if total <= 0.0 {
            // all-zero item weights inside a drawable kind: the partition
            // is already shuffled, so the front item is an unbiased pick
            return 0;
        }
        let mut roll = rng.random_range(0.0..total);
        for (index, question) in questions.iter().enumerate() {
            let weight = self.config.question_weight(question.id());
            if roll < weight {
                return index;
            }
            roll -= weight;
        }
        questions.len() - 1
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
