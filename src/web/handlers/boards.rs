//! Board, topic and post pages.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::board::{Board, BoardService, NewTopic, PostView, Topic};
use crate::web::csrf::{CsrfForm, CsrfToken};
use crate::web::error::WebResult;
use crate::web::forms::{Form, FormView, NewTopicForm, PostReplyForm};
use crate::web::middleware::{CurrentUser, LoginRequired};
use crate::web::render::Page;
use crate::web::state::AppState;

/// Number of latest posts shown under the reply form.
pub const REPLY_RECENT_POSTS: i64 = 10;

/// `?page=N` query.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A post together with its 1-based position in the topic.
#[derive(Debug, Serialize)]
struct PostItem<'a> {
    position: i64,
    #[serde(flatten)]
    post: &'a PostView,
}

fn topic_url(board_id: i64, topic_id: i64) -> String {
    format!("/boards/{board_id}/topics/{topic_id}/")
}

/// GET / - All boards with their statistics.
pub async fn home(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    let boards = BoardService::new(&state.db).list_boards().await?;

    Page::new(&state, "boards/home.html", &current, &csrf)?
        .title("home.title")
        .insert("boards", &boards)?
        .render()
}

/// GET /boards/:id/ - One page of a board's topics.
pub async fn board_topics(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    Path(board_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    let service = BoardService::new(&state.db);
    let board = service.get_board(board_id).await?;
    let (topics, page) = service
        .list_topics(board.id, query.page.as_deref(), state.topics_per_page())
        .await?;

    Page::new(&state, "boards/topics.html", &current, &csrf)?
        .title_text(board.name.clone())
        .insert("board", &board)?
        .insert("topics", &topics)?
        .pagination(&page)?
        .render()
}

fn new_topic_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    board: &Board,
    form: &FormView,
) -> WebResult<Html<String>> {
    Page::new(state, "boards/new_topic.html", current, csrf)?
        .title("topic.new_title")
        .insert("board", board)?
        .form(form)?
        .render()
}

/// GET /boards/:id/new/ - Empty new-topic form.
pub async fn new_topic_form(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    Path(board_id): Path<i64>,
) -> WebResult<Html<String>> {
    let board = BoardService::new(&state.db).get_board(board_id).await?;
    let current = CurrentUser::from(login);

    new_topic_page(
        &state,
        &current,
        &csrf,
        &board,
        &FormView::unbound::<NewTopicForm>(),
    )
}

/// POST /boards/:id/new/ - Create a topic with its first post.
pub async fn new_topic(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    Path(board_id): Path<i64>,
    CsrfForm(form): CsrfForm<NewTopicForm>,
) -> WebResult<Response> {
    let service = BoardService::new(&state.db);
    let board = service.get_board(board_id).await?;

    let errors = form.clean();
    if !errors.is_empty() {
        let current = CurrentUser::from(login);
        let view = FormView::bound(&form, &errors);
        return Ok(new_topic_page(&state, &current, &csrf, &board, &view)?.into_response());
    }

    let topic = service
        .create_topic(&NewTopic::new(
            board.id,
            form.subject.trim(),
            form.message.trim(),
            login.user.id,
        ))
        .await?;

    Ok(Redirect::to(&topic_url(board.id, topic.id)).into_response())
}

/// GET /boards/:board_id/topics/:topic_id/ - One page of a topic's posts.
pub async fn topic_posts(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    Path((board_id, topic_id)): Path<(i64, i64)>,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    let service = BoardService::new(&state.db);
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board.id, topic_id).await?;
    let (posts, page) = service
        .view_topic(&topic, query.page.as_deref(), state.posts_per_page())
        .await?;

    let items: Vec<PostItem> = posts
        .iter()
        .zip(page.start_index()..)
        .map(|(post, position)| PostItem { position, post })
        .collect();

    Page::new(&state, "boards/topic_posts.html", &current, &csrf)?
        .title_text(topic.subject.clone())
        .insert("board", &board)?
        .insert("topic", &topic)?
        .insert("posts", &items)?
        .pagination(&page)?
        .render()
}

async fn reply_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    board: &Board,
    topic: &Topic,
    form: &FormView,
) -> WebResult<Html<String>> {
    let recent = BoardService::new(&state.db)
        .recent_posts(topic.id, REPLY_RECENT_POSTS)
        .await?;

    Page::new(state, "boards/reply_topic.html", current, csrf)?
        .title("reply.title")
        .insert("board", board)?
        .insert("topic", topic)?
        .insert("posts", &recent)?
        .form(form)?
        .render()
}

/// GET /boards/:board_id/topics/:topic_id/reply/ - Reply form with the latest posts.
pub async fn reply_form(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    Path((board_id, topic_id)): Path<(i64, i64)>,
) -> WebResult<Html<String>> {
    let service = BoardService::new(&state.db);
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board.id, topic_id).await?;
    let current = CurrentUser::from(login);

    reply_page(
        &state,
        &current,
        &csrf,
        &board,
        &topic,
        &FormView::unbound::<PostReplyForm>(),
    )
    .await
}

/// POST /boards/:board_id/topics/:topic_id/reply/ - Add a reply.
///
/// Redirects to the page holding the new post, anchored at its position.
pub async fn reply_topic(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    Path((board_id, topic_id)): Path<(i64, i64)>,
    CsrfForm(form): CsrfForm<PostReplyForm>,
) -> WebResult<Response> {
    let service = BoardService::new(&state.db);
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board.id, topic_id).await?;

    let errors = form.clean();
    if !errors.is_empty() {
        let current = CurrentUser::from(login);
        let view = FormView::bound(&form, &errors);
        let page = reply_page(&state, &current, &csrf, &board, &topic, &view).await?;
        return Ok(page.into_response());
    }

    let (_, location) = service
        .reply(
            &board,
            &topic,
            form.message.trim(),
            login.user.id,
            state.posts_per_page(),
        )
        .await?;

    let target = format!(
        "{}?page={}#{}",
        topic_url(board.id, topic.id),
        location.page,
        location.position
    );
    Ok(Redirect::to(&target).into_response())
}
