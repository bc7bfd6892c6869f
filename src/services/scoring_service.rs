use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::entry::AnswerRecord;
use crate::models::question::Question;

#[derive(Debug, Clone)]
pub struct ScoreCard {
    pub answers: Vec<AnswerRecord>,
    pub correct_count: i32,
    pub scorable_count: i32,
}

impl ScoreCard {
    /// Aggregate score over scorable questions only, as a percentage
    /// rounded to two decimal places. Builds with no scorable question
    /// score zero.
    pub fn percentage(&self) -> Decimal {
        if self.scorable_count == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.correct_count) / Decimal::from(self.scorable_count)
            * Decimal::from(100))
        .round_dp(2)
    }
}

pub struct ScoringService;

impl ScoringService {
    /// Grades a validated answer set against the build's questions.
    ///
    /// Questions without a correct-answer marker are recorded but excluded
    /// from both sides of the aggregate. Multi-choice questions require
    /// exact set equality with the marker. Unanswered questions count
    /// against the score of a scorable question but are not recorded.
    pub fn score(questions: &[Question], answers: &HashMap<Uuid, Vec<i16>>) -> ScoreCard {
        let mut records = Vec::new();
        let mut correct_count = 0;
        let mut scorable_count = 0;

        for q in questions {
            let scorable = q.is_scorable();
            if scorable {
                scorable_count += 1;
            }

            let Some(selected) = answers.get(&q.id) else {
                continue;
            };

            let correct = q.correct_options.as_ref().filter(|c| !c.is_empty()).map(
                |marker| {
                    let mut want: Vec<i16> = marker.clone();
                    let mut got: Vec<i16> = selected.clone();
                    want.sort_unstable();
                    want.dedup();
                    got.sort_unstable();
                    got.dedup();
                    want == got
                },
            );

            if correct == Some(true) {
                correct_count += 1;
            }

            let selected_labels = selected
                .iter()
                .filter_map(|&i| q.options.get(i as usize).cloned())
                .collect();

            records.push(AnswerRecord {
                question_id: q.id,
                question_text: q.text.clone(),
                selected: selected.clone(),
                selected_labels,
                correct,
                note: q.note.clone(),
            });
        }

        ScoreCard {
            answers: records,
            correct_count,
            scorable_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{InputType, Question};

    fn question(text: &str, options: &[&str], correct: Option<Vec<i16>>) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: text.into(),
            input_type: if correct.as_ref().is_some_and(|c| c.len() > 1) {
                InputType::MultiChoice
            } else {
                InputType::SingleChoice
            },
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_options: correct,
            media_url: None,
            note: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn mixed_quiz_survey_scores_marked_questions_only() {
        let q1 = question("2+2?", &["3", "4", "5"], Some(vec![1]));
        let q2 = question("How did we do?", &["Great", "Fine"], None);
        let answers = HashMap::from([(q1.id, vec![1]), (q2.id, vec![0])]);

        let card = ScoringService::score(&[q1, q2], &answers);

        assert_eq!(card.correct_count, 1);
        assert_eq!(card.scorable_count, 1);
        assert_eq!(card.percentage(), Decimal::from(100));
        assert_eq!(card.answers.len(), 2);
        assert_eq!(card.answers[0].correct, Some(true));
        assert_eq!(card.answers[1].correct, None);
    }

    #[test]
    fn unmarked_question_never_enters_the_aggregate() {
        let q = question("Feedback?", &["Yes", "No"], None);
        let answers = HashMap::from([(q.id, vec![0])]);

        let card = ScoringService::score(&[q], &answers);

        assert_eq!(card.scorable_count, 0);
        assert_eq!(card.correct_count, 0);
        assert_eq!(card.percentage(), Decimal::ZERO);
    }

    #[test]
    fn multi_choice_requires_exact_set_equality() {
        let q = question("Pick all primes", &["2", "3", "4", "5"], Some(vec![0, 1, 3]));
        let id = q.id;

        let exact = HashMap::from([(id, vec![3, 0, 1])]);
        assert_eq!(ScoringService::score(&[q.clone()], &exact).correct_count, 1);

        let subset = HashMap::from([(id, vec![0, 1])]);
        assert_eq!(ScoringService::score(&[q.clone()], &subset).correct_count, 0);

        let superset = HashMap::from([(id, vec![0, 1, 2, 3])]);
        assert_eq!(ScoringService::score(&[q], &superset).correct_count, 0);
    }

    #[test]
    fn unanswered_scorable_question_counts_against_the_score() {
        let q1 = question("A?", &["x", "y"], Some(vec![0]));
        let q2 = question("B?", &["x", "y"], Some(vec![1]));
        let answers = HashMap::from([(q1.id, vec![0])]);

        let card = ScoringService::score(&[q1, q2], &answers);

        assert_eq!(card.correct_count, 1);
        assert_eq!(card.scorable_count, 2);
        assert_eq!(card.percentage(), Decimal::from(50));
        // only the answered question is recorded
        assert_eq!(card.answers.len(), 1);
    }

    #[test]
    fn selected_labels_are_copied_from_the_option_list() {
        let q = question("Color?", &["Red", "Green", "Blue"], Some(vec![2]));
        let answers = HashMap::from([(q.id, vec![2])]);

        let card = ScoringService::score(&[q], &answers);

        assert_eq!(card.answers[0].selected_labels, vec!["Blue".to_string()]);
    }

    #[test]
    fn rescoring_stored_answers_is_idempotent() {
        let q1 = question("2+2?", &["3", "4"], Some(vec![1]));
        let q2 = question("3*3?", &["6", "9"], Some(vec![1]));
        let q3 = question("Opinion?", &["A", "B"], None);
        let questions = vec![q1.clone(), q2.clone(), q3.clone()];
        let answers = HashMap::from([
            (q1.id, vec![1]),
            (q2.id, vec![0]),
            (q3.id, vec![1]),
        ]);

        let first = ScoringService::score(&questions, &answers);

        // rebuild the answer map from the stored records, as an auditor would
        let replayed: HashMap<Uuid, Vec<i16>> = first
            .answers
            .iter()
            .map(|a| (a.question_id, a.selected.clone()))
            .collect();
        let second = ScoringService::score(&questions, &replayed);

        assert_eq!(first.correct_count, second.correct_count);
        assert_eq!(first.scorable_count, second.scorable_count);
        assert_eq!(first.percentage(), second.percentage());
    }
}
