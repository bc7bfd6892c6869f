use uuid::Uuid;

use crate::dto::public_dto::{RenderModel, RenderOptions, RenderQuestion};
use crate::models::build::{Build, OrderBy, SortOrder};
use crate::models::question::Question;
use crate::store::{BuildStore, QuestionStore, StoreError, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("build not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes the presentation-agnostic model for one form instance and
/// issues the single-use token that binds that instance to at most one
/// accepted submission.
#[derive(Clone)]
pub struct FormRenderer<B, Q, T> {
    builds: B,
    questions: Q,
    tokens: T,
}

impl<B, Q, T> FormRenderer<B, Q, T>
where
    B: BuildStore,
    Q: QuestionStore,
    T: TokenStore,
{
    pub fn new(builds: B, questions: Q, tokens: T) -> Self {
        Self {
            builds,
            questions,
            tokens,
        }
    }

    pub async fn render(
        &self,
        build_id: Uuid,
        opts: &RenderOptions,
    ) -> Result<RenderModel, RenderError> {
        let build = self
            .builds
            .get(build_id)
            .await?
            .filter(|b| b.is_active)
            .ok_or(RenderError::NotFound)?;

        let questions = resolve_questions(&self.questions, &build).await?;
        let order_by = opts.order_by.unwrap_or(build.order_by);
        let order = opts.order.unwrap_or(build.sort_order);
        let questions = order_questions(questions, &build, order_by, order);

        let token = self.tokens.issue(build.id).await?;

        let per_page = opts.per_page.or(build.per_page);
        let page_count = match build.layout {
            crate::models::build::Layout::MultiPage => per_page
                .filter(|&p| p > 0)
                .map(|p| (questions.len() as i64 + p as i64 - 1) / p as i64),
            crate::models::build::Layout::SinglePage => None,
        };

        Ok(RenderModel {
            build_id: build.id,
            title: opts.show_title.then(|| build.title.clone()),
            kind: build.kind,
            layout: build.layout,
            per_page,
            page_count,
            required: opts.required.unwrap_or(build.required),
            guest_allowed: opts.guest.unwrap_or(build.guest_allowed),
            ajax_enabled: opts.ajax.unwrap_or(build.ajax_enabled),
            questions: questions
                .into_iter()
                .map(|q| RenderQuestion {
                    id: q.id,
                    text: q.text,
                    input_type: q.input_type,
                    options: q.options,
                    media_url: q.media_url,
                })
                .collect(),
            form_token: token.token,
            extra_class: opts.class.clone(),
        })
    }
}

/// Resolves a build's question references, skipping the ones that no
/// longer exist. Stale references are tolerated but logged so operators
/// can spot decaying builds.
pub(crate) async fn resolve_questions<Q: QuestionStore>(
    store: &Q,
    build: &Build,
) -> Result<Vec<Question>, StoreError> {
    let found = store.get_many(&build.question_ids).await?;
    if found.len() < build.question_ids.len() {
        let missing: Vec<Uuid> = build
            .question_ids
            .iter()
            .filter(|id| !found.iter().any(|q| q.id == **id))
            .copied()
            .collect();
        tracing::warn!(
            build_id = %build.id,
            ?missing,
            "build references questions that do not exist; skipping them"
        );
    }
    Ok(found)
}

pub(crate) fn order_questions(
    mut questions: Vec<Question>,
    build: &Build,
    order_by: OrderBy,
    order: SortOrder,
) -> Vec<Question> {
    match order_by {
        OrderBy::BuildOrder => {
            let position = |q: &Question| {
                build
                    .question_ids
                    .iter()
                    .position(|id| *id == q.id)
                    .unwrap_or(usize::MAX)
            };
            questions.sort_by_key(position);
        }
        OrderBy::CreatedAt => questions.sort_by_key(|q| q.created_at),
        OrderBy::Title => questions.sort_by(|a, b| a.text.to_lowercase().cmp(&b.text.to_lowercase())),
    }
    if order == SortOrder::Desc {
        questions.reverse();
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::build::{BuildKind, Layout, NewBuild};
    use crate::models::question::{InputType, NewQuestion};
    use crate::store::MemoryStore;

    fn new_question(text: &str) -> NewQuestion {
        NewQuestion {
            text: text.into(),
            input_type: InputType::SingleChoice,
            options: vec!["Yes".into(), "No".into()],
            correct_options: None,
            media_url: None,
            note: None,
        }
    }

    fn new_build(question_ids: Vec<Uuid>) -> NewBuild {
        NewBuild {
            title: "Customer survey".into(),
            kind: BuildKind::Survey,
            question_ids,
            layout: Layout::SinglePage,
            per_page: None,
            sort_order: SortOrder::Asc,
            order_by: OrderBy::BuildOrder,
            required: false,
            guest_allowed: true,
            ajax_enabled: false,
            pass_mark: None,
        }
    }

    fn renderer(store: &MemoryStore) -> FormRenderer<MemoryStore, MemoryStore, MemoryStore> {
        FormRenderer::new(store.clone(), store.clone(), store.clone())
    }

    #[test]
    fn unknown_build_renders_not_found() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let result = renderer(&store)
                .render(Uuid::new_v4(), &RenderOptions::default())
                .await;
            assert!(matches!(result, Err(RenderError::NotFound)));
        });
    }

    #[test]
    fn stale_question_references_are_skipped() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let q1 = QuestionStore::insert(&store, new_question("Q1")).await.unwrap();
            let gone = Uuid::new_v4();
            let build = BuildStore::insert(&store, new_build(vec![q1.id, gone]))
                .await
                .unwrap();

            let model = renderer(&store)
                .render(build.id, &RenderOptions::default())
                .await
                .unwrap();

            assert_eq!(model.questions.len(), 1);
            assert_eq!(model.questions[0].id, q1.id);
        });
    }

    #[test]
    fn questions_follow_the_build_order_directive() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let a = QuestionStore::insert(&store, new_question("Banana")).await.unwrap();
            let b = QuestionStore::insert(&store, new_question("Apple")).await.unwrap();
            let c = QuestionStore::insert(&store, new_question("Cherry")).await.unwrap();
            let build = BuildStore::insert(&store, new_build(vec![c.id, a.id, b.id]))
                .await
                .unwrap();

            let model = renderer(&store)
                .render(build.id, &RenderOptions::default())
                .await
                .unwrap();
            let ids: Vec<Uuid> = model.questions.iter().map(|q| q.id).collect();
            assert_eq!(ids, vec![c.id, a.id, b.id]);

            // render-time override: alphabetical, descending
            let opts = RenderOptions {
                order_by: Some(OrderBy::Title),
                order: Some(SortOrder::Desc),
                ..Default::default()
            };
            let model = renderer(&store).render(build.id, &opts).await.unwrap();
            let texts: Vec<&str> = model.questions.iter().map(|q| q.text.as_str()).collect();
            assert_eq!(texts, vec!["Cherry", "Banana", "Apple"]);
        });
    }

    #[test]
    fn each_render_issues_a_fresh_token() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let q = QuestionStore::insert(&store, new_question("Q")).await.unwrap();
            let build = BuildStore::insert(&store, new_build(vec![q.id]))
                .await
                .unwrap();

            let r = renderer(&store);
            let first = r.render(build.id, &RenderOptions::default()).await.unwrap();
            let second = r.render(build.id, &RenderOptions::default()).await.unwrap();

            assert_ne!(first.form_token, second.form_token);
            assert!(!first.form_token.is_empty());
        });
    }

    #[test]
    fn multi_page_model_reports_page_count() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let mut ids = Vec::new();
            for i in 0..5 {
                ids.push(QuestionStore::insert(&store, new_question(&format!("Q{i}"))).await.unwrap().id);
            }
            let mut build = new_build(ids);
            build.layout = Layout::MultiPage;
            build.per_page = Some(2);
            let build = BuildStore::insert(&store, build).await.unwrap();

            let model = renderer(&store)
                .render(build.id, &RenderOptions::default())
                .await
                .unwrap();
            assert_eq!(model.page_count, Some(3));

            // per-render override shrinks the page size
            let opts = RenderOptions {
                per_page: Some(5),
                ..Default::default()
            };
            let model = renderer(&store).render(build.id, &opts).await.unwrap();
            assert_eq!(model.page_count, Some(1));
        });
    }

    #[test]
    fn title_is_withheld_unless_requested() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let q = QuestionStore::insert(&store, new_question("Q")).await.unwrap();
            let build = BuildStore::insert(&store, new_build(vec![q.id]))
                .await
                .unwrap();

            let r = renderer(&store);
            let model = r.render(build.id, &RenderOptions::default()).await.unwrap();
            assert_eq!(model.title, None);

            let opts = RenderOptions {
                show_title: true,
                ..Default::default()
            };
            let model = r.render(build.id, &opts).await.unwrap();
            assert_eq!(model.title.as_deref(), Some("Customer survey"));
        });
    }
}
