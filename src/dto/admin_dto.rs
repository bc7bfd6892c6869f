use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::build::{Build, BuildKind, BuildPatch, Layout, NewBuild, OrderBy, SortOrder};
use crate::models::question::{InputType, NewQuestion, QuestionPatch};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    pub input_type: InputType,
    #[validate(length(min = 1))]
    pub options: Vec<String>,
    pub correct_options: Option<Vec<i16>>,
    #[validate(url)]
    pub media_url: Option<String>,
    pub note: Option<String>,
}

impl CreateQuestionPayload {
    /// Cross-field checks the derive can't express: marker indices must
    /// point into the option list, and a single-choice marker is one index.
    pub fn check_marker(&self) -> Result<(), String> {
        let Some(marker) = &self.correct_options else {
            return Ok(());
        };
        if self.input_type == InputType::SingleChoice && marker.len() > 1 {
            return Err("single-choice question cannot have more than one correct option".into());
        }
        let len = self.options.len() as i16;
        if marker.iter().any(|&i| i < 0 || i >= len) {
            return Err("correct option index out of range".into());
        }
        Ok(())
    }
}

impl From<CreateQuestionPayload> for NewQuestion {
    fn from(p: CreateQuestionPayload) -> Self {
        NewQuestion {
            text: p.text,
            input_type: p.input_type,
            options: p.options,
            correct_options: p.correct_options,
            media_url: p.media_url,
            note: p.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    #[validate(length(min = 1, max = 2000))]
    pub text: Option<String>,
    pub input_type: Option<InputType>,
    #[validate(length(min = 1))]
    pub options: Option<Vec<String>>,
    /// `Some(None)` clears the marker, turning a quiz question into a
    /// survey question.
    #[serde(default, with = "double_option")]
    pub correct_options: Option<Option<Vec<i16>>>,
    #[serde(default, with = "double_option")]
    pub media_url: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub note: Option<Option<String>>,
}

impl From<UpdateQuestionPayload> for QuestionPatch {
    fn from(p: UpdateQuestionPayload) -> Self {
        QuestionPatch {
            text: p.text,
            input_type: p.input_type,
            options: p.options,
            correct_options: p.correct_options,
            media_url: p.media_url,
            note: p.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBuildPayload {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub kind: BuildKind,
    pub question_ids: Vec<Uuid>,
    pub layout: Layout,
    #[validate(range(min = 1))]
    pub per_page: Option<i16>,
    pub sort_order: Option<SortOrder>,
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub guest_allowed: bool,
    #[serde(default)]
    pub ajax_enabled: bool,
    pub pass_mark: Option<Decimal>,
}

impl CreateBuildPayload {
    /// Multi-page builds must say how many questions go on a page.
    pub fn check_pagination(&self) -> Result<(), String> {
        if self.layout == Layout::MultiPage && self.per_page.is_none() {
            return Err("per_page is required for multi_page layout".into());
        }
        Ok(())
    }
}

impl From<CreateBuildPayload> for NewBuild {
    fn from(p: CreateBuildPayload) -> Self {
        NewBuild {
            title: p.title,
            kind: p.kind,
            question_ids: p.question_ids,
            layout: p.layout,
            per_page: p.per_page,
            sort_order: p.sort_order.unwrap_or(SortOrder::Asc),
            order_by: p.order_by.unwrap_or(OrderBy::BuildOrder),
            required: p.required,
            guest_allowed: p.guest_allowed,
            ajax_enabled: p.ajax_enabled,
            pass_mark: p.pass_mark,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateBuildPayload {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub kind: Option<BuildKind>,
    pub question_ids: Option<Vec<Uuid>>,
    pub layout: Option<Layout>,
    #[serde(default, with = "double_option")]
    pub per_page: Option<Option<i16>>,
    pub sort_order: Option<SortOrder>,
    pub order_by: Option<OrderBy>,
    pub required: Option<bool>,
    pub guest_allowed: Option<bool>,
    pub ajax_enabled: Option<bool>,
    #[serde(default, with = "double_option")]
    pub pass_mark: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

impl UpdateBuildPayload {
    pub fn check_pagination(&self, current: &Build) -> Result<(), String> {
        let layout = self.layout.unwrap_or(current.layout);
        let per_page = match &self.per_page {
            Some(v) => *v,
            None => current.per_page,
        };
        if layout == Layout::MultiPage && per_page.is_none() {
            return Err("per_page is required for multi_page layout".into());
        }
        if per_page.is_some_and(|p| p < 1) {
            return Err("per_page must be at least 1".into());
        }
        Ok(())
    }
}

impl From<UpdateBuildPayload> for BuildPatch {
    fn from(p: UpdateBuildPayload) -> Self {
        BuildPatch {
            title: p.title,
            kind: p.kind,
            question_ids: p.question_ids,
            layout: p.layout,
            per_page: p.per_page,
            sort_order: p.sort_order,
            order_by: p.order_by,
            required: p.required,
            guest_allowed: p.guest_allowed,
            ajax_enabled: p.ajax_enabled,
            pass_mark: p.pass_mark,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Distinguishes an absent field from an explicit `null` in PATCH bodies.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }

    pub fn serialize<S, T>(value: &Option<Option<T>>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(ser),
            None => ser.serialize_none(),
        }
    }
}
