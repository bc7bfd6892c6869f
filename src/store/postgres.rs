use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::build::{Build, BuildPatch, NewBuild};
use crate::models::entry::{AnswerRecord, Entry, NewEntry, ENTRY_STATUS_COMPLETE};
use crate::models::form_token::{FormToken, TokenStatus};
use crate::models::question::{NewQuestion, Question, QuestionPatch};
use crate::utils::token::new_form_token;

use super::{AppendError, BuildStore, EntryStore, QuestionStore, StoreError, TokenStore};

#[derive(Debug, sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    text: String,
    input_type: String,
    options: Vec<String>,
    correct_options: Option<Vec<i16>>,
    media_url: Option<String>,
    note: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            text: row.text,
            input_type: row.input_type.parse().map_err(StoreError::Corrupt)?,
            options: row.options,
            correct_options: row.correct_options,
            media_url: row.media_url,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BuildRow {
    id: Uuid,
    title: String,
    kind: String,
    question_ids: Vec<Uuid>,
    layout: String,
    per_page: Option<i16>,
    sort_order: String,
    order_by: String,
    required: bool,
    guest_allowed: bool,
    ajax_enabled: bool,
    pass_mark: Option<Decimal>,
    is_active: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<BuildRow> for Build {
    type Error = StoreError;

    fn try_from(row: BuildRow) -> Result<Self, Self::Error> {
        Ok(Build {
            id: row.id,
            title: row.title,
            kind: row.kind.parse().map_err(StoreError::Corrupt)?,
            question_ids: row.question_ids,
            layout: row.layout.parse().map_err(StoreError::Corrupt)?,
            per_page: row.per_page,
            sort_order: row.sort_order.parse().map_err(StoreError::Corrupt)?,
            order_by: row.order_by.parse().map_err(StoreError::Corrupt)?,
            required: row.required,
            guest_allowed: row.guest_allowed,
            ajax_enabled: row.ajax_enabled,
            pass_mark: row.pass_mark,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    build_id: Uuid,
    build_title: String,
    user_id: Option<Uuid>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    answers: Json<Vec<AnswerRecord>>,
    correct_count: i32,
    scorable_count: i32,
    percentage: Decimal,
    passed: Option<bool>,
    status: String,
    form_token: String,
    created_at: DateTime<Utc>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            build_id: row.build_id,
            build_title: row.build_title,
            user_id: row.user_id,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            answers: row.answers.0,
            correct_count: row.correct_count,
            scorable_count: row.scorable_count,
            percentage: row.percentage,
            passed: row.passed,
            status: row.status,
            form_token: row.form_token,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl QuestionStore for PgQuestionStore {
    async fn get(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(r#"SELECT * FROM questions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Question::try_from).transpose()
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE id = ANY($1)"#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions (text, input_type, options, correct_options, media_url, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(question.text)
        .bind(question.input_type.to_string())
        .bind(question.options)
        .bind(question.correct_options)
        .bind(question.media_url)
        .bind(question.note)
        .fetch_one(&self.pool)
        .await?;
        Question::try_from(row)
    }

    async fn update(&self, id: Uuid, patch: QuestionPatch) -> Result<Option<Question>, StoreError> {
        let Some(mut existing) = self.get(id).await? else {
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

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            UPDATE questions
            SET text = $1, input_type = $2, options = $3, correct_options = $4,
                media_url = $5, note = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(existing.text)
        .bind(existing.input_type.to_string())
        .bind(existing.options)
        .bind(existing.correct_options)
        .bind(existing.media_url)
        .bind(existing.note)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Question::try_from(row).map(Some)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // No cascade: builds keep their reference and skip it at render time.
        let result = sqlx::query(r#"DELETE FROM questions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Question>, i64), StoreError> {
        let offset = (page - 1) * per_page;
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions ORDER BY created_at DESC LIMIT $1 OFFSET $2"#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM questions"#)
            .fetch_one(&self.pool)
            .await?;
        let questions = rows
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((questions, total))
    }
}

#[derive(Clone)]
pub struct PgBuildStore {
    pool: PgPool,
}

impl PgBuildStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BuildStore for PgBuildStore {
    async fn get(&self, id: Uuid) -> Result<Option<Build>, StoreError> {
        let row = sqlx::query_as::<_, BuildRow>(r#"SELECT * FROM builds WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Build::try_from).transpose()
    }

    async fn insert(&self, build: NewBuild) -> Result<Build, StoreError> {
        let row = sqlx::query_as::<_, BuildRow>(
            r#"
            INSERT INTO builds (
                title, kind, question_ids, layout, per_page, sort_order, order_by,
                required, guest_allowed, ajax_enabled, pass_mark
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(build.title)
        .bind(build.kind.to_string())
        .bind(build.question_ids)
        .bind(build.layout.to_string())
        .bind(build.per_page)
        .bind(build.sort_order.to_string())
        .bind(build.order_by.to_string())
        .bind(build.required)
        .bind(build.guest_allowed)
        .bind(build.ajax_enabled)
        .bind(build.pass_mark)
        .fetch_one(&self.pool)
        .await?;
        Build::try_from(row)
    }

    async fn update(&self, id: Uuid, patch: BuildPatch) -> Result<Option<Build>, StoreError> {
        let Some(mut existing) = self.get(id).await? else {
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

        let row = sqlx::query_as::<_, BuildRow>(
            r#"
            UPDATE builds
            SET title = $1, kind = $2, question_ids = $3, layout = $4, per_page = $5,
                sort_order = $6, order_by = $7, required = $8, guest_allowed = $9,
                ajax_enabled = $10, pass_mark = $11, is_active = $12, updated_at = NOW()
            WHERE id = $13
            RETURNING *
            "#,
        )
        .bind(existing.title)
        .bind(existing.kind.to_string())
        .bind(existing.question_ids)
        .bind(existing.layout.to_string())
        .bind(existing.per_page)
        .bind(existing.sort_order.to_string())
        .bind(existing.order_by.to_string())
        .bind(existing.required)
        .bind(existing.guest_allowed)
        .bind(existing.ajax_enabled)
        .bind(existing.pass_mark)
        .bind(existing.is_active)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Build::try_from(row).map(Some)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM builds WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Build>, i64), StoreError> {
        let offset = (page - 1) * per_page;
        let rows = sqlx::query_as::<_, BuildRow>(
            r#"SELECT * FROM builds ORDER BY created_at DESC LIMIT $1 OFFSET $2"#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM builds"#)
            .fetch_one(&self.pool)
            .await?;
        let builds = rows
            .into_iter()
            .map(Build::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((builds, total))
    }
}

#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TokenStore for PgTokenStore {
    async fn issue(&self, build_id: Uuid) -> Result<FormToken, StoreError> {
        let token = new_form_token();
        let row = sqlx::query_as::<_, FormTokenRow>(
            r#"
            INSERT INTO form_tokens (token, build_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(build_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn status(&self, token: &str, build_id: Uuid) -> Result<TokenStatus, StoreError> {
        let row = sqlx::query_as::<_, FormTokenRow>(
            r#"SELECT * FROM form_tokens WHERE token = $1 AND build_id = $2"#,
        )
        .bind(token)
        .bind(build_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(match row {
            None => TokenStatus::Unknown,
            Some(t) if t.consumed_at.is_some() => TokenStatus::Consumed,
            Some(_) => TokenStatus::Active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FormTokenRow {
    token: String,
    build_id: Uuid,
    issued_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl From<FormTokenRow> for FormToken {
    fn from(row: FormTokenRow) -> Self {
        FormToken {
            token: row.token,
            build_id: row.build_id,
            issued_at: row.issued_at,
            consumed_at: row.consumed_at,
        }
    }
}

#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EntryStore for PgEntryStore {
    async fn append(&self, entry: NewEntry) -> Result<Entry, AppendError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        // Check-and-invalidate in a single statement; a concurrent submit
        // with the same token loses this race and sees zero rows.
        let consumed = sqlx::query(
            r#"
            UPDATE form_tokens SET consumed_at = NOW()
            WHERE token = $1 AND build_id = $2 AND consumed_at IS NULL
            "#,
        )
        .bind(&entry.form_token)
        .bind(entry.build_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        if consumed.rows_affected() == 0 {
            return Err(AppendError::Replayed);
        }

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO entries (
                build_id, build_title, user_id, guest_name, guest_email, answers,
                correct_count, scorable_count, percentage, passed, status, form_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(entry.build_id)
        .bind(entry.build_title)
        .bind(entry.user_id)
        .bind(entry.guest_name)
        .bind(entry.guest_email)
        .bind(Json(&entry.answers))
        .bind(entry.correct_count)
        .bind(entry.scorable_count)
        .bind(entry.percentage)
        .bind(entry.passed)
        .bind(ENTRY_STATUS_COMPLETE)
        .bind(&entry.form_token)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Entry>, StoreError> {
        let row = sqlx::query_as::<_, EntryRow>(r#"SELECT * FROM entries WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Entry::from))
    }

    async fn list_by_build(
        &self,
        build_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Entry>, i64), StoreError> {
        let offset = (page - 1) * per_page;
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT * FROM entries
            WHERE build_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(build_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM entries WHERE build_id = $1"#)
                .bind(build_id)
                .fetch_one(&self.pool)
                .await?;
        Ok((rows.into_iter().map(Entry::from).collect(), total))
    }
}
