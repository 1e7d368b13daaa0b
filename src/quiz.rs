use thiserror::Error;

use crate::models::QuizQuestion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,
    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },
    #[error("question {index} needs at least two options")]
    TooFewOptions { index: usize },
    #[error("question {index} marks option {option} correct but has {available} options")]
    AnswerKeyOutOfRange {
        index: usize,
        option: usize,
        available: usize,
    },
    #[error("expected {expected} answers, got {got}")]
    AnswerCount { expected: usize, got: usize },
    #[error("answer {index} picks option {option} but only {available} exist")]
    AnswerOutOfRange {
        index: usize,
        option: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

/// Rejects quizzes learners could not answer.
pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::Empty);
    }
    for (index, question) in questions.iter().enumerate() {
        if question.prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt { index });
        }
        if question.options.len() < 2 {
            return Err(QuizError::TooFewOptions { index });
        }
        if question.correct_option >= question.options.len() {
            return Err(QuizError::AnswerKeyOutOfRange {
                index,
                option: question.correct_option,
                available: question.options.len(),
            });
        }
    }
    Ok(())
}

/// Scores a full set of answers. Partial submissions are rejected, not scored.
pub fn grade(questions: &[QuizQuestion], answers: &[usize]) -> Result<QuizScore, QuizError> {
    if answers.len() != questions.len() {
        return Err(QuizError::AnswerCount {
            expected: questions.len(),
            got: answers.len(),
        });
    }

    let mut correct = 0;
    for (index, (question, &answer)) in questions.iter().zip(answers).enumerate() {
        if answer >= question.options.len() {
            return Err(QuizError::AnswerOutOfRange {
                index,
                option: answer,
                available: question.options.len(),
            });
        }
        if answer == question.correct_option {
            correct += 1;
        }
    }

    Ok(QuizScore {
        correct,
        total: questions.len(),
    })
}
