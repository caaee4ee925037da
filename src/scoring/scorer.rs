// src/scoring/scorer.rs

use crate::{
    models::{
        question::QuestionKind,
        quiz::Quiz,
        result::{NewQuizResult, SubmittedAnswer, UserAnswer},
    },
    scoring::evaluator::is_correct,
};

/// Outcome of grading one attempt, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub answers: Vec<UserAnswer>,
}

impl Scorecard {
    pub fn into_new_result(self, quiz: &Quiz) -> NewQuizResult {
        NewQuizResult {
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            score: self.score,
            total_questions: self.total_questions,
            percentage: self.percentage,
            answers: self.answers,
        }
    }
}

/// Grades `answers` against the quiz questions by position.
/// Positions without an answer count as absent.
pub fn score_quiz(quiz: &Quiz, answers: &[SubmittedAnswer]) -> Scorecard {
    let mut score = 0;
    let mut breakdown = Vec::with_capacity(quiz.questions.len());

    for (i, question) in quiz.questions.iter().enumerate() {
        let kind = QuestionKind::effective(question.kind, quiz.kind);
        let submitted = answers.get(i).cloned().unwrap_or_default();
        let correct = is_correct(kind, question, &submitted);

        if correct {
            score += 1;
        }

        breakdown.push(UserAnswer {
            question_id: question.id,
            question: question.question.clone(),
            user_answer: submitted,
            correct_answer: question.correct_answer.clone(),
            correct_answers: question.correct_answers.clone(),
            is_correct: correct,
        });
    }

    let total_questions = quiz.questions.len() as i64;

    Scorecard {
        score,
        total_questions,
        percentage: percentage(score, total_questions),
        answers: breakdown,
    }
}

/// Rounded share of correct answers, 0 for an empty quiz.
pub fn percentage(score: i64, total_questions: i64) -> i64 {
    if total_questions == 0 {
        return 0;
    }
    ((score as f64 / total_questions as f64) * 100.0).round() as i64
}
