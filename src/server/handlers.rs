use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::AppState;
use crate::api;
use crate::auth;
use crate::calendar::parse_date;
use crate::store::{StoreError, TaskStore};
use crate::task::{Completion, SearchQuery, Task, TaskError, complete_task, list_limit, prepare_task};

/// JSON error body `{"error": "..."}` with a status code.
pub(super) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadId | StoreError::NotFound | StoreError::BadDate => Self::bad_request(err.to_string()),
            StoreError::Poisoned | StoreError::Sqlite(_) => {
                warn!("storage failure: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("rejected request body: {rejection}");
        Self::bad_request("bad json")
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub(super) struct IdParams {
    #[serde(default)]
    id: String,
}

impl IdParams {
    fn required(&self) -> ApiResult<String> {
        let id = self.id.trim();
        if id.is_empty() { Err(ApiError::bad_request("id required")) } else { Ok(id.to_string()) }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct NextDateParams {
    #[serde(default)]
    now: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    repeat: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListParams {
    #[serde(default)]
    search: String,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SigninRequest {
    #[serde(default)]
    password: String,
}

/// Gate for task endpoints: with a password configured, require a valid
/// `token` cookie.
pub(super) async fn require_token(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let Some(password) = state.password.as_deref() else {
        return next.run(request).await;
    };

    let now = Utc::now();
    let authorized = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(auth::token_from_cookie_header)
        .any(|token| auth::verify_token(token, password, now));

    if authorized {
        next.run(request).await
    } else {
        debug!("unauthenticated request to {}", request.uri().path());
        (StatusCode::UNAUTHORIZED, "authentication required").into_response()
    }
}

/// `POST /api/signin`
pub(super) async fn signin(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let configured = state.password.as_deref().unwrap_or_default();
    if !auth::check_password(&request.password, configured) {
        warn!("rejected sign-in attempt");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "wrong password"));
    }
    let token = auth::issue_token(configured, Utc::now())
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token error"))?;
    info!("signed in");
    Ok(Json(json!({ "token": token })))
}

/// `GET /api/nextdate?now=&date=&repeat=`, answered in plain text.
pub(super) async fn next_date(State(state): State<Arc<AppState>>, Query(params): Query<NextDateParams>) -> Response {
    let now = match params.now.trim() {
        "" => state.today(),
        raw => match parse_date(raw) {
            Some(date) => date,
            None => return (StatusCode::BAD_REQUEST, "bad now").into_response(),
        },
    };
    if params.date.trim().is_empty() || params.repeat.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "date/repeat required").into_response();
    }

    match api::next_date(now, &params.date, &params.repeat) {
        Ok(next) => format!("{next}\n").into_response(),
        Err(err) => {
            debug!("nextdate {:?} {:?}: {err}", params.date, params.repeat);
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
    }
}

/// Run `work` against the store on the blocking pool.
///
/// SQLite calls hold a `std::sync::Mutex` for the whole statement, so they
/// stay off the async worker threads.
async fn with_store<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn TaskStore) -> ApiResult<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || work(store.as_ref())).await.map_err(|err| {
        warn!("store task failed: {err}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    })?
}

/// `POST /api/task`
pub(super) async fn add_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Task>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(task) = body?;
    let task = prepare_task(task, state.today())?;
    let date = task.date.clone();
    let id = with_store(&state, move |store| Ok(store.add(&task)?)).await?;
    info!("added task {id} on {date}");
    Ok(Json(json!({ "id": id })))
}

/// `GET /api/task?id=`
pub(super) async fn get_task(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdParams>,
) -> ApiResult<Json<Task>> {
    let id = params.required()?;
    let task = with_store(&state, move |store| Ok(store.get(&id)?)).await?;
    Ok(Json(task))
}

/// `PUT /api/task`
pub(super) async fn edit_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Task>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(mut task) = body?;
    task.id = task.id.trim().to_string();
    if task.id.is_empty() {
        return Err(ApiError::bad_request("id required"));
    }
    let task = prepare_task(task, state.today())?;
    let id = task.id.clone();
    with_store(&state, move |store| Ok(store.update(&task)?)).await?;
    info!("updated task {id}");
    Ok(Json(json!({})))
}

/// `DELETE /api/task?id=`
pub(super) async fn delete_task(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdParams>,
) -> ApiResult<Json<Value>> {
    let id = params.required()?;
    let target = id.clone();
    with_store(&state, move |store| Ok(store.delete(&target)?)).await?;
    info!("deleted task {id}");
    Ok(Json(json!({})))
}

/// `POST /api/task/done?id=`: delete a one-off task, reschedule a repeating one.
pub(super) async fn task_done(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdParams>,
) -> ApiResult<Json<Value>> {
    let id = params.required()?;
    let target = id.clone();
    let completion = with_store(&state, move |store| {
        let task = store.get(&target)?;
        let completion = complete_task(&task)?;
        match &completion {
            Completion::Delete => store.delete(&target)?,
            Completion::Reschedule(date) => store.set_date(&target, date)?,
        }
        Ok(completion)
    })
    .await?;

    match completion {
        Completion::Delete => info!("completed task {id}, deleted"),
        Completion::Reschedule(date) => info!("completed task {id}, next on {date}"),
    }
    Ok(Json(json!({})))
}

/// `GET /api/tasks?search=&limit=`
pub(super) async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let query = SearchQuery::parse(&params.search);
    let limit = list_limit(params.limit.as_deref());
    let tasks = with_store(&state, move |store| Ok(store.list(&query, limit)?)).await?;
    debug!("listed {} task(s)", tasks.len());
    Ok(Json(json!({ "tasks": tasks })))
}
