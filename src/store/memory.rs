use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::models::build::{Build, BuildPatch, NewBuild};
use crate::models::entry::{Entry, NewEntry, ENTRY_STATUS_COMPLETE};
use crate::models::form_token::{FormToken, TokenStatus};
use crate::models::question::{NewQuestion, Question, QuestionPatch};
use crate::utils::token::new_form_token;

use super::{AppendError, BuildStore, EntryStore, QuestionStore, StoreError, TokenStore};

#[derive(Default)]
struct State {
    questions: HashMap<Uuid, Question>,
    builds: HashMap<Uuid, Build>,
    tokens: HashMap<String, FormToken>,
    entries: Vec<Entry>,
}

/// In-memory backend implementing all four stores behind one mutex, so the
/// consume-token-and-append-entry pair is atomic exactly like the
/// transactional Postgres path. Used by the service test suites.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store mutex poisoned")
    }

    /// Test hook: overwrite a question in place, simulating a later edit.
    pub fn replace_question(&self, question: Question) {
        self.lock().questions.insert(question.id, question);
    }
}

impl QuestionStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        Ok(self.lock().questions.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Question>, StoreError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.questions.get(id).cloned())
            .collect())
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            text: question.text,
            input_type: question.input_type,
            options: question.options,
            correct_options: question.correct_options,
            media_url: question.media_url,
            note: question.note,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.lock().questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update(&self, id: Uuid, patch: QuestionPatch) -> Result<Option<Question>, StoreError> {
        let mut state = self.lock();
        let Some(existing) = state.questions.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = patch.text {
            existing.text = text;
        }
        if let Some(input_type) = patch.input_type {
            existing.input_type = input_type;
        }
        if let Some(options) = patch.options {
            existing.options = options;
        }
        if let Some(correct_options) = patch.correct_options {
            existing.correct_options = correct_options;
        }
        if let Some(media_url) = patch.media_url {
            existing.media_url = media_url;
        }
        if let Some(note) = patch.note {
            existing.note = note;
        }
        existing.updated_at = Some(Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().questions.remove(&id).is_some())
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Question>, i64), StoreError> {
        let state = self.lock();
        let mut all: Vec<_> = state.questions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        let offset = ((page - 1) * per_page).max(0) as usize;
        let page_items = all.into_iter().skip(offset).take(per_page as usize).collect();
        Ok((page_items, total))
    }
}

impl BuildStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Build>, StoreError> {
        Ok(self.lock().builds.get(&id).cloned())
    }

    async fn insert(&self, build: NewBuild) -> Result<Build, StoreError> {
        let now = Utc::now();
        let build = Build {
            id: Uuid::new_v4(),
            title: build.title,
            kind: build.kind,
            question_ids: build.question_ids,
            layout: build.layout,
            per_page: build.per_page,
            sort_order: build.sort_order,
            order_by: build.order_by,
            required: build.required,
            guest_allowed: build.guest_allowed,
            ajax_enabled: build.ajax_enabled,
            pass_mark: build.pass_mark,
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.lock().builds.insert(build.id, build.clone());
        Ok(build)
    }

    async fn update(&self, id: Uuid, patch: BuildPatch) -> Result<Option<Build>, StoreError> {
        let mut state = self.lock();
        let Some(existing) = state.builds.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            existing.title = title;
        }
        if let Some(kind) = patch.kind {
            existing.kind = kind;
        }
        if let Some(question_ids) = patch.question_ids {
            existing.question_ids = question_ids;
        }
        if let Some(layout) = patch.layout {
            existing.layout = layout;
        }
        if let Some(per_page) = patch.per_page {
            existing.per_page = per_page;
        }
        if let Some(sort_order) = patch.sort_order {
            existing.sort_order = sort_order;
        }
        if let Some(order_by) = patch.order_by {
            existing.order_by = order_by;
        }
        if let Some(required) = patch.required {
            existing.required = required;
        }
        if let Some(guest_allowed) = patch.guest_allowed {
            existing.guest_allowed = guest_allowed;
        }
        if let Some(ajax_enabled) = patch.ajax_enabled {
            existing.ajax_enabled = ajax_enabled;
        }
        if let Some(pass_mark) = patch.pass_mark {
            existing.pass_mark = pass_mark;
        }
        if let Some(is_active) = patch.is_active {
            existing.is_active = is_active;
        }
        existing.updated_at = Some(Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.tokens.retain(|_, t| t.build_id != id);
        Ok(state.builds.remove(&id).is_some())
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Build>, i64), StoreError> {
        let state = self.lock();
        let mut all: Vec<_> = state.builds.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        let offset = ((page - 1) * per_page).max(0) as usize;
        let page_items = all.into_iter().skip(offset).take(per_page as usize).collect();
        Ok((page_items, total))
    }
}

impl TokenStore for MemoryStore {
    async fn issue(&self, build_id: Uuid) -> Result<FormToken, StoreError> {
        let token = FormToken {
            token: new_form_token(),
            build_id,
            issued_at: Utc::now(),
            consumed_at: None,
        };
        self.lock().tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn status(&self, token: &str, build_id: Uuid) -> Result<TokenStatus, StoreError> {
        let state = self.lock();
        Ok(match state.tokens.get(token) {
            Some(t) if t.build_id == build_id && t.consumed_at.is_none() => TokenStatus::Active,
            Some(t) if t.build_id == build_id => TokenStatus::Consumed,
            _ => TokenStatus::Unknown,
        })
    }
}

impl EntryStore for MemoryStore {
    async fn append(&self, entry: NewEntry) -> Result<Entry, AppendError> {
        let mut state = self.lock();

        match state.tokens.get_mut(&entry.form_token) {
            Some(t) if t.build_id == entry.build_id && t.consumed_at.is_none() => {
                t.consumed_at = Some(Utc::now());
            }
            _ => return Err(AppendError::Replayed),
        }

        let entry = Entry {
            id: Uuid::new_v4(),
            build_id: entry.build_id,
            build_title: entry.build_title,
            user_id: entry.user_id,
            guest_name: entry.guest_name,
            guest_email: entry.guest_email,
            answers: entry.answers,
            correct_count: entry.correct_count,
            scorable_count: entry.scorable_count,
            percentage: entry.percentage,
            passed: entry.passed,
            status: ENTRY_STATUS_COMPLETE.to_string(),
            form_token: entry.form_token,
            created_at: Utc::now(),
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Entry>, StoreError> {
        Ok(self.lock().entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_build(
        &self,
        build_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Entry>, i64), StoreError> {
        let state = self.lock();
        let mut matching: Vec<_> = state
            .entries
            .iter()
            .filter(|e| e.build_id == build_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let offset = ((page - 1) * per_page).max(0) as usize;
        let page_items = matching
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Ok((page_items, total))
    }
}
