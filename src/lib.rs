#![allow(async_fn_in_trait)]

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::message_service::{DefaultMessages, MessageProvider};
use crate::services::render_service::FormRenderer;
use crate::services::submission_service::SubmissionProcessor;
use crate::store::{PgBuildStore, PgEntryStore, PgQuestionStore, PgTokenStore};

pub type Renderer = FormRenderer<PgBuildStore, PgQuestionStore, PgTokenStore>;
pub type Processor = SubmissionProcessor<PgBuildStore, PgQuestionStore, PgEntryStore, PgTokenStore>;

/// All dependencies, wired once at startup and injected into handlers.
/// There is no ambient global state besides the config.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub questions: PgQuestionStore,
    pub builds: PgBuildStore,
    pub entries: PgEntryStore,
    pub renderer: Renderer,
    pub processor: Processor,
    pub messages: Arc<dyn MessageProvider>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self::with_messages(pool, Arc::new(DefaultMessages))
    }

    pub fn with_messages(pool: PgPool, messages: Arc<dyn MessageProvider>) -> Self {
        let questions = PgQuestionStore::new(pool.clone());
        let builds = PgBuildStore::new(pool.clone());
        let entries = PgEntryStore::new(pool.clone());
        let tokens = PgTokenStore::new(pool.clone());

        let renderer = FormRenderer::new(builds.clone(), questions.clone(), tokens.clone());
        let processor = SubmissionProcessor::new(
            builds.clone(),
            questions.clone(),
            entries.clone(),
            tokens,
        );

        Self {
            pool,
            questions,
            builds,
            entries,
            renderer,
            processor,
            messages,
        }
    }
}
