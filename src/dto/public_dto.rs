use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::build::{BuildKind, Layout, OrderBy, SortOrder};
use crate::models::question::InputType;

/// Typed render-request configuration, parsed from query parameters.
/// Everything here overrides the build's stored configuration for this
/// render only; absent fields fall back to the build.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RenderOptions {
    pub show_title: bool,
    #[validate(range(min = 1))]
    pub per_page: Option<i16>,
    pub order: Option<SortOrder>,
    pub order_by: Option<OrderBy>,
    pub required: Option<bool>,
    pub guest: Option<bool>,
    pub ajax: Option<bool>,
    #[validate(length(max = 64))]
    pub class: Option<String>,
}

/// Everything the presentation layer needs to draw one form instance.
/// Correct-answer markers are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderModel {
    pub build_id: Uuid,
    pub title: Option<String>,
    pub kind: BuildKind,
    pub layout: Layout,
    pub per_page: Option<i16>,
    pub page_count: Option<i64>,
    pub required: bool,
    pub guest_allowed: bool,
    pub ajax_enabled: bool,
    pub questions: Vec<RenderQuestion>,
    pub form_token: String,
    pub extra_class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderQuestion {
    pub id: Uuid,
    pub text: String,
    pub input_type: InputType,
    pub options: Vec<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswer {
    pub question_id: Uuid,
    pub selected: Vec<i16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuestInfo {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitFormRequest {
    #[validate(length(min = 8, max = 128))]
    pub form_token: String,
    pub answers: Vec<SubmitAnswer>,
    pub guest: Option<GuestInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFormResponse {
    pub entry_id: Uuid,
    pub status: String,
    pub correct_count: i32,
    pub scorable_count: i32,
    pub percentage: Decimal,
    pub passed: Option<bool>,
    pub message: String,
    /// Populated for non-AJAX builds: where the client should navigate next.
    pub redirect_url: Option<String>,
}
