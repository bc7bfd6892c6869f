use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub id: Uuid,
    pub title: String,
    pub kind: BuildKind,
    /// Question references in presentation order. References to deleted
    /// questions are tolerated and skipped at render/submit time.
    pub question_ids: Vec<Uuid>,
    pub layout: Layout,
    pub per_page: Option<i16>,
    pub sort_order: SortOrder,
    pub order_by: OrderBy,
    pub required: bool,
    pub guest_allowed: bool,
    pub ajax_enabled: bool,
    /// Percentage threshold a quiz submission must reach to pass.
    pub pass_mark: Option<Decimal>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    Quiz,
    Feedback,
    Survey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    SinglePage,
    MultiPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// The order the build lists its question references in.
    BuildOrder,
    CreatedAt,
    Title,
}

macro_rules! impl_str_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $text)),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(concat!("unknown ", stringify!($ty), ": {}"), other)),
                }
            }
        }
    };
}

impl_str_enum!(BuildKind { Quiz => "quiz", Feedback => "feedback", Survey => "survey" });
impl_str_enum!(Layout { SinglePage => "single_page", MultiPage => "multi_page" });
impl_str_enum!(SortOrder { Asc => "asc", Desc => "desc" });
impl_str_enum!(OrderBy { BuildOrder => "build_order", CreatedAt => "created_at", Title => "title" });

#[derive(Debug, Clone)]
pub struct NewBuild {
    pub title: String,
    pub kind: BuildKind,
    pub question_ids: Vec<Uuid>,
    pub layout: Layout,
    pub per_page: Option<i16>,
    pub sort_order: SortOrder,
    pub order_by: OrderBy,
    pub required: bool,
    pub guest_allowed: bool,
    pub ajax_enabled: bool,
    pub pass_mark: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildPatch {
    pub title: Option<String>,
    pub kind: Option<BuildKind>,
    pub question_ids: Option<Vec<Uuid>>,
    pub layout: Option<Layout>,
    pub per_page: Option<Option<i16>>,
    pub sort_order: Option<SortOrder>,
    pub order_by: Option<OrderBy>,
    pub required: Option<bool>,
    pub guest_allowed: Option<bool>,
    pub ajax_enabled: Option<bool>,
    pub pass_mark: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}
