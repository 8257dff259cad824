use std::fmt::Write as _;

use anyhow::Result;
use calc_core::quiz::{QuestionBank, QuestionReview, QuizAttempt, QuizScore};
use calc_core::{CalcError, CalcResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use super::{pass_fail, Report};
use crate::cli::QuizArgs;

#[derive(Debug, Serialize)]
struct QuizReport {
    score: QuizScore,
    review: Vec<QuestionReview>,
}

/// `"1=0, 2=3"` into (question id, option index) pairs
fn parse_answers(answers: &str) -> CalcResult<Vec<(u32, usize)>> {
    answers
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> CalcResult<(u32, usize)> {
            let invalid = || CalcError::invalid_input("answers", pair, "Expected id=option, e.g. 3=1");
            let (id, choice) = pair.split_once('=').ok_or_else(invalid)?;
            let id: u32 = id.trim().parse().map_err(|_| invalid())?;
            let choice: usize = choice.trim().parse().map_err(|_| invalid())?;
            Ok((id, choice))
        })
        .collect()
}

pub fn run_quiz(args: &QuizArgs) -> Result<Report> {
    let json = std::fs::read_to_string(&args.bank)
        .map_err(|e| CalcError::file_error("read", args.bank.display().to_string(), e.to_string()))?;
    let bank = QuestionBank::from_json(&json)?;
    let bank = match (args.count, args.seed) {
        (Some(count), Some(seed)) => bank.sample(count, &mut ChaCha8Rng::seed_from_u64(seed))?,
        (Some(count), None) => bank.sample(count, &mut rand::thread_rng())?,
        (None, _) => bank,
    };
    info!(questions = bank.len(), seed = ?args.seed, "quiz paper ready");

    let mut attempt = QuizAttempt::new();
    for (id, choice) in parse_answers(&args.answers)? {
        attempt.answer(&bank, id, choice)?;
    }
    let score = attempt.score(&bank, args.pass_mark);
    let review = attempt.review(&bank);

    let mut text = String::new();
    for r in &review {
        let mark = match r.chosen {
            None => "-",
            Some(_) if r.is_correct => "ok",
            Some(_) => "x",
        };
        writeln!(text, "  [{:>2}] {:>3}. {}", mark, r.id, r.question)?;
        if r.chosen.is_some() && !r.is_correct {
            if let Some(question) = bank.get(r.id) {
                writeln!(text, "          answer: {}", question.options[r.correct_answer])?;
            }
            if !r.explanation.is_empty() {
                writeln!(text, "          {}", r.explanation)?;
            }
        }
    }
    write!(
        text,
        "Score {}/{} ({:.0} %, {} answered), pass mark {:.0} %: {}",
        score.correct,
        score.total,
        score.percent,
        score.answered,
        score.pass_mark,
        pass_fail(score.passed)
    )?;
    Report::new(&QuizReport { score, review }, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const BANK: &str = r#"[
        {"id": 1, "question": "Maximum voltage drop for lighting?", "options": ["3 %", "5 %", "10 %"],
         "correctAnswer": 0, "explanation": "Appendix 4 allows 3 % for lighting."},
        {"id": 2, "question": "Which code means danger present?", "options": ["C1", "C2", "C3", "FI"],
         "correctAnswer": 0, "explanation": "C1 requires immediate remedial action."}
    ]"#;

    fn bank_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("bank.json");
        std::fs::write(&path, BANK).unwrap();
        path
    }

    #[test]
    fn test_parse_answers() {
        assert_eq!(parse_answers(" 1=0, 2=3 ").unwrap(), vec![(1, 0), (2, 3)]);
        assert!(parse_answers("").unwrap().is_empty());
        assert_eq!(parse_answers("1:0").unwrap_err().error_code(), "INVALID_INPUT");
        assert!(parse_answers("1=x").is_err());
    }

    #[test]
    fn test_half_marks_fails() {
        let dir = TempDir::new().unwrap();
        let args = QuizArgs {
            bank: bank_file(&dir),
            answers: "1=0,2=1".to_string(),
            pass_mark: None,
            count: None,
            seed: None,
        };
        let report = run_quiz(&args).unwrap();
        assert_eq!(report.json["score"]["correct"], 1);
        assert_eq!(report.json["score"]["passed"], false);
        assert!(report.text.contains("answer: C1"));
    }

    #[test]
    fn test_seeded_paper() {
        let dir = TempDir::new().unwrap();
        let args = QuizArgs {
            bank: bank_file(&dir),
            answers: String::new(),
            pass_mark: None,
            count: Some(1),
            seed: Some(42),
        };
        let first = run_quiz(&args).unwrap();
        let second = run_quiz(&args).unwrap();
        assert_eq!(first.json["score"]["total"], 1);
        assert_eq!(first.json["review"][0]["id"], second.json["review"][0]["id"]);

        // Answering a question left out of the paper is rejected
        let drawn = first.json["review"][0]["id"].as_u64().unwrap();
        let other = if drawn == 1 { 2 } else { 1 };
        let err = run_quiz(&QuizArgs {
            answers: format!("{}=0", other),
            ..args
        })
        .unwrap_err();
        assert_eq!(err.downcast_ref::<CalcError>().unwrap().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_missing_bank() {
        let args = QuizArgs {
            bank: PathBuf::from("/nonexistent/bank.json"),
            answers: String::new(),
            pass_mark: Some(50.0),
            count: None,
            seed: None,
        };
        let err = run_quiz(&args).unwrap_err();
        assert_eq!(err.downcast_ref::<CalcError>().unwrap().error_code(), "FILE_ERROR");
    }
}
