//! # Quiz Scoring
//!
//! Multiple-choice question banks for apprentice revision, random practice
//! papers drawn from a bank, answer recording and scoring against a pass mark.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::quiz::{QuestionBank, QuizAttempt};
//!
//! let bank = QuestionBank::from_json(r#"[
//!     { "id": 1, "question": "C1 means?", "options": ["Danger present", "Improvement"],
//!       "correct_answer": 0, "explanation": "Immediate action required" }
//! ]"#).unwrap();
//!
//! let mut attempt = QuizAttempt::new();
//! attempt.answer(&bank, 1, 0).unwrap();
//! let score = attempt.score(&bank, None);
//! assert_eq!(score.percent, 100.0);
//! assert!(score.passed);
//! ```

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// Default pass mark (%)
pub const DEFAULT_PASS_MARK: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    #[serde(alias = "correctAnswer")]
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// A set of questions, serialized as a plain JSON array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Parse and validate a JSON array of questions
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let bank: QuestionBank = serde_json::from_str(json).map_err(CalcError::serialization)?;
        bank.validate()?;
        debug!(questions = bank.questions.len(), "question bank loaded");
        Ok(bank)
    }

    /// Reject empty banks, questions with fewer than two options, answers
    /// outside the options and duplicate ids.
    pub fn validate(&self) -> CalcResult<()> {
        if self.questions.is_empty() {
            return Err(CalcError::missing_field("questions"));
        }
        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id) {
                return Err(CalcError::invalid_input("id", q.id.to_string(), "Duplicate question id"));
            }
            if q.options.len() < 2 {
                return Err(CalcError::invalid_input(
                    format!("questions[{}].options", q.id),
                    q.options.len().to_string(),
                    "A question needs at least two options",
                ));
            }
            if q.correct_answer >= q.options.len() {
                return Err(CalcError::invalid_input(
                    format!("questions[{}].correct_answer", q.id),
                    q.correct_answer.to_string(),
                    format!("Answer index must be below {}", q.options.len()),
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Draw `count` distinct questions at random. A count above the bank size
    /// returns the whole bank, shuffled.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> CalcResult<QuestionBank> {
        if count == 0 {
            return Err(CalcError::invalid_input("count", "0", "A paper needs at least one question"));
        }
        let questions: Vec<Question> = self.questions.choose_multiple(rng, count).cloned().collect();
        debug!(requested = count, drawn = questions.len(), "practice paper drawn");
        Ok(QuestionBank { questions })
    }

    /// Questions in a category (case-insensitive)
    pub fn by_category(&self, category: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(category)))
            .collect()
    }
}

/// Answers given so far, keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub answers: BTreeMap<u32, usize>,
}

impl QuizAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the chosen option for a question
    pub fn answer(&mut self, bank: &QuestionBank, question_id: u32, choice: usize) -> CalcResult<()> {
        let q = bank.get(question_id).ok_or_else(|| {
            CalcError::invalid_input("question_id", question_id.to_string(), "Question is not in the bank")
        })?;
        if choice >= q.options.len() {
            return Err(CalcError::invalid_input(
                "choice",
                choice.to_string(),
                format!("Question {} has {} options", question_id, q.options.len()),
            ));
        }
        self.answers.insert(question_id, choice);
        Ok(())
    }

    /// Score against the bank. Unanswered questions count as wrong.
    pub fn score(&self, bank: &QuestionBank, pass_mark: Option<f64>) -> QuizScore {
        let pass_mark = pass_mark.unwrap_or(DEFAULT_PASS_MARK);
        let total = bank.len();
        let answered = bank.questions.iter().filter(|q| self.answers.contains_key(&q.id)).count();
        let correct = bank
            .questions
            .iter()
            .filter(|q| self.answers.get(&q.id) == Some(&q.correct_answer))
            .count();
        let percent = if total > 0 { correct as f64 / total as f64 * 100.0 } else { 0.0 };
        QuizScore {
            correct,
            answered,
            total,
            percent,
            pass_mark,
            passed: percent >= pass_mark,
        }
    }

    /// Per-question feedback in bank order
    pub fn review(&self, bank: &QuestionBank) -> Vec<QuestionReview> {
        bank.questions
            .iter()
            .map(|q| {
                let chosen = self.answers.get(&q.id).copied();
                QuestionReview {
                    id: q.id,
                    question: q.question.clone(),
                    chosen,
                    correct_answer: q.correct_answer,
                    is_correct: chosen == Some(q.correct_answer),
                    explanation: q.explanation.clone(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    pub percent: f64,
    pub pass_mark: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub id: u32,
    pub question: String,
    pub chosen: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub explanation: String,
}
