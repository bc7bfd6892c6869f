use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub input_type: InputType,
    pub options: Vec<String>,
    /// Indices into `options`. Present for quiz questions, absent for
    /// feedback/survey questions, which are stored but never scored.
    pub correct_options: Option<Vec<i16>>,
    pub media_url: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn is_scorable(&self) -> bool {
        self.correct_options.as_ref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    SingleChoice,
    MultiChoice,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::SingleChoice => write!(f, "single_choice"),
            InputType::MultiChoice => write!(f, "multi_choice"),
        }
    }
}

impl std::str::FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_choice" => Ok(InputType::SingleChoice),
            "multi_choice" => Ok(InputType::MultiChoice),
            other => Err(format!("unknown input type: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub input_type: InputType,
    pub options: Vec<String>,
    pub correct_options: Option<Vec<i16>>,
    pub media_url: Option<String>,
    pub note: Option<String>,
}

/// Field-level patch for updates. The double `Option` distinguishes
/// "leave unchanged" from "set to null".
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub input_type: Option<InputType>,
    pub options: Option<Vec<String>>,
    pub correct_options: Option<Option<Vec<i16>>>,
    pub media_url: Option<Option<String>>,
    pub note: Option<Option<String>>,
}
