use std::collections::HashMap;

use uuid::Uuid;

use crate::dto::public_dto::SubmitFormRequest;
use crate::models::build::Build;
use crate::models::entry::{Entry, NewEntry, Submitter};
use crate::models::form_token::TokenStatus;
use crate::models::question::{InputType, Question};
use crate::services::render_service::{order_questions, resolve_questions};
use crate::services::scoring_service::ScoringService;
use crate::store::{AppendError, BuildStore, EntryStore, QuestionStore, StoreError, TokenStore};

/// Why a submission was rejected. Recoverable kinds are logged with their
/// specific variant but surfaced to the submitter behind one generic
/// message; see the public route handler.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("unknown build {0}")]
    UnknownBuild(Uuid),

    #[error("guest submissions are not allowed for this build")]
    GuestNotAllowed,

    #[error("form token was already consumed")]
    ReplayedSubmission,

    #[error("answers missing for {0:?}")]
    IncompleteSubmission(Vec<Uuid>),

    #[error("invalid answer for question {0}")]
    InvalidAnswer(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl SubmissionError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SubmissionError::UnknownBuild(_) | SubmissionError::Storage(_)
        )
    }

    /// Stable machine name of the variant, for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::UnknownBuild(_) => "unknown_build",
            SubmissionError::GuestNotAllowed => "guest_not_allowed",
            SubmissionError::ReplayedSubmission => "replayed_submission",
            SubmissionError::IncompleteSubmission(_) => "incomplete_submission",
            SubmissionError::InvalidAnswer(_) => "invalid_answer",
            SubmissionError::Storage(_) => "storage_failure",
        }
    }
}

#[derive(Clone)]
pub struct SubmissionProcessor<B, Q, E, T> {
    builds: B,
    questions: Q,
    entries: E,
    tokens: T,
}

impl<B, Q, E, T> SubmissionProcessor<B, Q, E, T>
where
    B: BuildStore,
    Q: QuestionStore,
    E: EntryStore,
    T: TokenStore,
{
    pub fn new(builds: B, questions: Q, entries: E, tokens: T) -> Self {
        Self {
            builds,
            questions,
            entries,
            tokens,
        }
    }

    /// Validates, scores and persists one submission. Exactly one entry is
    /// written on success. Every failure path leaves storage untouched:
    /// the form token is only consumed in the same transaction that
    /// commits the entry.
    pub async fn submit(
        &self,
        build_id: Uuid,
        req: SubmitFormRequest,
        submitter: Submitter,
    ) -> Result<Entry, SubmissionError> {
        let build = self
            .builds
            .get(build_id)
            .await
            .map_err(SubmissionError::Storage)?
            .filter(|b| b.is_active)
            .ok_or(SubmissionError::UnknownBuild(build_id))?;

        if submitter.is_guest() && !build.guest_allowed {
            return Err(SubmissionError::GuestNotAllowed);
        }

        // Read-only probe so a replay is reported before the other checks;
        // the authoritative check-and-invalidate happens inside append().
        match self.tokens.status(&req.form_token, build.id).await? {
            TokenStatus::Active => {}
            TokenStatus::Consumed | TokenStatus::Unknown => {
                return Err(SubmissionError::ReplayedSubmission)
            }
        }

        let questions = resolve_questions(&self.questions, &build).await?;
        let questions = order_questions(questions, &build, build.order_by, build.sort_order);
        let answers = collect_answers(&build, &questions, &req);

        if build.required {
            let missing = missing_answers(&questions, &answers);
            if !missing.is_empty() {
                return Err(SubmissionError::IncompleteSubmission(missing));
            }
        }

        check_bounds(&questions, &answers)?;

        let card = ScoringService::score(&questions, &answers);
        let percentage = card.percentage();
        let passed = (card.scorable_count > 0).then(|| {
            build
                .pass_mark
                .map(|mark| percentage >= mark)
                .unwrap_or(true)
        });

        let (user_id, guest_name, guest_email) = match submitter {
            Submitter::User(id) => (Some(id), None, None),
            Submitter::Guest { name, email } => (None, name, email),
        };

        let entry = self
            .entries
            .append(NewEntry {
                build_id: build.id,
                build_title: build.title.clone(),
                user_id,
                guest_name,
                guest_email,
                answers: card.answers,
                correct_count: card.correct_count,
                scorable_count: card.scorable_count,
                percentage,
                passed,
                form_token: req.form_token,
            })
            .await
            .map_err(|e| match e {
                AppendError::Replayed => SubmissionError::ReplayedSubmission,
                AppendError::Store(e) => SubmissionError::Storage(e),
            })?;

        tracing::info!(
            build_id = %build.id,
            entry_id = %entry.id,
            correct = entry.correct_count,
            scorable = entry.scorable_count,
            "submission accepted"
        );

        Ok(entry)
    }
}

/// Keeps answers that belong to the build's resolved questions and carry a
/// selection. Empty selections count as unanswered; answers for foreign
/// question ids are dropped (a well-behaved client never sends them).
fn collect_answers(
    build: &Build,
    questions: &[Question],
    req: &SubmitFormRequest,
) -> HashMap<Uuid, Vec<i16>> {
    let mut map = HashMap::new();
    for answer in &req.answers {
        if answer.selected.is_empty() {
            continue;
        }
        if !questions.iter().any(|q| q.id == answer.question_id) {
            tracing::debug!(
                build_id = %build.id,
                question_id = %answer.question_id,
                "dropping answer for a question not in this build"
            );
            continue;
        }
        map.insert(answer.question_id, answer.selected.clone());
    }
    map
}

fn missing_answers(questions: &[Question], answers: &HashMap<Uuid, Vec<i16>>) -> Vec<Uuid> {
    questions
        .iter()
        .filter(|q| !answers.contains_key(&q.id))
        .map(|q| q.id)
        .collect()
}

fn check_bounds(
    questions: &[Question],
    answers: &HashMap<Uuid, Vec<i16>>,
) -> Result<(), SubmissionError> {
    for q in questions {
        let Some(selected) = answers.get(&q.id) else {
            continue;
        };
        let len = q.options.len() as i16;
        if selected.iter().any(|&i| i < 0 || i >= len) {
            return Err(SubmissionError::InvalidAnswer(q.id));
        }
        if q.input_type == InputType::SingleChoice && selected.len() > 1 {
            return Err(SubmissionError::InvalidAnswer(q.id));
        }
    }
    Ok(())
}
