use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Quiz, QuizAttempt, QuizOption, QuizQuestion};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuizOptionView {
    id: Uuid,
    option_text: String,
    /// Only present for the course owner and admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuizQuestionView {
    id: Uuid,
    question_text: String,
    options: Vec<QuizOptionView>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuizView {
    id: Uuid,
    course_id: Uuid,
    lesson_id: Option<Uuid>,
    title: String,
    pass_percentage: i32,
    questions: Vec<QuizQuestionView>,
}

impl QuizView {
    pub fn new(
        quiz: &Quiz,
        questions: Vec<(QuizQuestion, Vec<QuizOption>)>,
        reveal_answers: bool,
    ) -> Self {
        let questions = questions
            .into_iter()
            .map(|(question, options)| QuizQuestionView {
                id: question.id(),
                question_text: question.question_text().to_string(),
                options: options
                    .into_iter()
                    .map(|option| QuizOptionView {
                        id: option.id(),
                        option_text: option.option_text().to_string(),
                        is_correct: reveal_answers.then(|| option.is_correct()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: quiz.id(),
            course_id: quiz.course_id(),
            lesson_id: quiz.lesson_id(),
            title: quiz.title().to_string(),
            pass_percentage: quiz.pass_percentage(),
            questions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct QuizAnswer {
    pub question_id: Uuid,
    pub option_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct QuizSubmitBody {
    pub answers: Vec<QuizAnswer>,
}

impl QuizSubmitBody {
    /// One selection per question, the first one wins.
    pub fn selections(&self) -> HashMap<Uuid, Uuid> {
        let mut selected = HashMap::with_capacity(self.answers.len());
        for answer in &self.answers {
            selected.entry(answer.question_id).or_insert(answer.option_id);
        }
        selected
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuizResultResponse {
    attempt_id: Uuid,
    score: i32,
    total: i32,
    passed: bool,
    points_awarded: i32,
}

impl QuizResultResponse {
    pub fn new(attempt: &QuizAttempt, points_awarded: i32) -> Self {
        Self {
            attempt_id: attempt.id(),
            score: attempt.score(),
            total: attempt.total(),
            passed: attempt.passed(),
            points_awarded,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_answer_per_question_wins() {
        let question = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let body = QuizSubmitBody {
            answers: vec![
                QuizAnswer {
                    question_id: question,
                    option_id: first,
                },
                QuizAnswer {
                    question_id: question,
                    option_id: second,
                },
            ],
        };
        let selected = body.selections();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[&question], first);
    }
}
