//! HTTP adapter around [`QuestEngine`]. Each session gets its own engine, and
//! every request for a session runs under that entry's write guard, so
//! submissions to one session never interleave.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::quest::{Progress, QuestEngine, QuestError, QuestState, QuestSubmission};
use crate::terminal::OutputLine;

impl IntoResponse for QuestError {
    fn into_response(self) -> Response {
        let status = match self {
            QuestError::UnknownQuest(_) | QuestError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

struct SessionEntry {
    engine: QuestEngine,
    last_active: Instant,
}

impl SessionEntry {
    fn new(engine: QuestEngine) -> Self {
        Self {
            engine,
            last_active: Instant::now(),
        }
    }
}

/// Live sessions keyed by id. Clients that vanish without a DELETE leave
/// their entry behind until [`SessionStore::sweep_idle`] evicts it, so a
/// server should run [`spawn_idle_sweeper`] alongside the router.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, quest_id: Option<&str>) -> Result<Uuid, QuestError> {
        let engine = QuestEngine::start(quest_id)?;
        let id = Uuid::new_v4();
        self.sessions.insert(id, SessionEntry::new(engine));
        Ok(id)
    }

    /// Runs `f` with exclusive access to one session's engine and marks the
    /// session active.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut QuestEngine) -> R,
    ) -> Result<R, QuestError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| QuestError::SessionNotFound(id.to_string()))?;
        let entry = entry.value_mut();
        entry.last_active = Instant::now();
        Ok(f(&mut entry.engine))
    }

    /// Drops every session untouched for at least `max_idle`. Returns how many
    /// were evicted.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_active.elapsed() < max_idle);
        before.saturating_sub(self.sessions.len())
    }

    pub fn remove(&self, id: Uuid) -> Result<(), QuestError> {
        self.sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| QuestError::SessionNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSession {
    #[serde(default)]
    pub quest_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitCommand {
    pub line: String,
}

#[derive(Debug, Serialize)]
pub struct StepView {
    pub id: String,
    pub number: usize,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub quest_id: String,
    pub quest_title: String,
    pub welcome_message: String,
    pub state: QuestState,
    pub step: Option<StepView>,
    pub progress: Progress,
    pub prompt: String,
    pub output: Vec<OutputLine>,
}

impl SessionView {
    fn of(session_id: Uuid, engine: &QuestEngine) -> Self {
        let step = engine.current_step().map(|step| StepView {
            id: step.id.clone(),
            number: step.number,
            title: step.title.clone(),
            description: step.description.clone(),
        });
        let session = engine.session();
        Self {
            session_id,
            quest_id: engine.quest().map(|quest| quest.id.clone()).unwrap_or_default(),
            quest_title: engine.current_quest_title().to_string(),
            welcome_message: engine
                .quest()
                .map(|quest| quest.welcome_message.clone())
                .unwrap_or_default(),
            state: engine.state(),
            step,
            progress: engine.progress(),
            prompt: session.map(|s| s.prompt().to_string()).unwrap_or_default(),
            output: session.map(|s| s.output().to_vec()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    #[serde(flatten)]
    pub submission: QuestSubmission,
    pub progress: Progress,
    pub prompt: String,
}

/// Evicts idle sessions in the background every half `max_idle` (at least
/// once a second).
pub fn spawn_idle_sweeper(state: AppState, max_idle: Duration) -> tokio::task::JoinHandle<()> {
    let period = (max_idle / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = state.sessions.sweep_idle(max_idle);
            if evicted > 0 {
                info!(evicted, remaining = state.sessions.len(), "idle sessions evicted");
            }
        }
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/commands", post(submit_command))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// POST /api/sessions - start a quest in a fresh session. The body is
/// optional; without one the first mission starts.
async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSession>>,
) -> Result<(StatusCode, Json<SessionView>), QuestError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let id = state.sessions.create(body.quest_id.as_deref())?;
    info!(session = %id, "session created");
    let view = state
        .sessions
        .with_session(id, |engine| SessionView::of(id, engine))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, QuestError> {
    let view = state
        .sessions
        .with_session(id, |engine| SessionView::of(id, engine))?;
    Ok(Json(view))
}

/// POST /api/sessions/{id}/commands - run one line and validate it.
async fn submit_command(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitCommand>,
) -> Result<Json<CommandResponse>, QuestError> {
    let response = state.sessions.with_session(id, |engine| {
        let submission = engine.submit_command(&body.line);
        CommandResponse {
            submission,
            progress: engine.progress(),
            prompt: engine
                .session()
                .map(|s| s.prompt().to_string())
                .unwrap_or_default(),
        }
    })?;
    Ok(Json(response))
}

/// POST /api/sessions/{id}/reset
async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, QuestError> {
    let view = state.sessions.with_session(id, |engine| {
        engine.reset_quest();
        SessionView::of(id, engine)
    })?;
    info!(session = %id, "session reset");
    Ok(Json(view))
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, QuestError> {
    state.sessions.remove(id)?;
    info!(session = %id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/sessions", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::default());
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_create_session() {
        let state = AppState::default();
        let app = router(state.clone());

        let (status, body) = send(&app, Method::POST, "/api/sessions", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["quest_id"], "first-mission");
        assert_eq!(body["state"], "in_progress");
        assert_eq!(body["step"]["title"], "Establish Connection");
        assert_eq!(body["progress"], json!({ "completed": 0, "total": 11, "percentage": 0 }));
        assert_eq!(body["prompt"], "user@hackbox:~$");
        assert_eq!(body["output"][0]["kind"], "success");
        assert!(body["welcome_message"]
            .as_str()
            .unwrap()
            .starts_with("Mission briefing:"));
        assert_eq!(body["output"][2]["content"], body["welcome_message"]);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_create_session_without_body() {
        let state = AppState::default();
        let app = router(state.clone());

        let (status, body) = send(&app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["quest_id"], "first-mission");
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_create_unknown_quest() {
        let app = router(AppState::default());
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/sessions",
            Some(json!({ "quest_id": "moon-base" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown quest: moon-base");
    }

    #[tokio::test]
    async fn test_submit_commands() {
        let app = router(AppState::default());
        let id = create(&app).await;
        let uri = format!("/api/sessions/{id}/commands");

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "line": "ssh" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step_completed"], true);
        assert_eq!(body["quest_completed"], false);
        assert_eq!(body["command_result"]["success"], true);
        assert_eq!(body["progress"]["percentage"], 9);

        let (_, body) = send(&app, Method::POST, &uri, Some(json!({ "line": "cd nowhere" }))).await;
        assert_eq!(body["step_completed"], false);
        assert_eq!(body["command_result"]["success"], false);
        assert_eq!(
            body["command_result"]["output"],
            "cd: nowhere: No such file or directory"
        );
        assert_eq!(body["validation"]["message"], "Use the ls command to list files");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let app = router(AppState::default());
        let first = create(&app).await;
        let second = create(&app).await;

        send(
            &app,
            Method::POST,
            &format!("/api/sessions/{first}/commands"),
            Some(json!({ "line": "cd /" })),
        )
        .await;

        let (_, one) = send(&app, Method::GET, &format!("/api/sessions/{first}"), None).await;
        let (_, two) = send(&app, Method::GET, &format!("/api/sessions/{second}"), None).await;
        assert_eq!(one["prompt"], "user@hackbox:/$");
        assert_eq!(two["prompt"], "user@hackbox:~$");
    }

    #[tokio::test]
    async fn test_reset_session() {
        let app = router(AppState::default());
        let id = create(&app).await;
        let commands = format!("/api/sessions/{id}/commands");
        send(&app, Method::POST, &commands, Some(json!({ "line": "ssh" }))).await;

        let (status, body) = send(&app, Method::POST, &format!("/api/sessions/{id}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["completed"], 0);
        assert_eq!(body["output"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = AppState::default();
        let app = router(state.clone());
        let id = create(&app).await;
        let uri = format!("/api/sessions/{id}");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty());

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("session not found: {id}"));

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_sweep_idle() {
        let store = SessionStore::new();
        let id = store.create(None).unwrap();

        assert_eq!(store.sweep_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 1);
        store.with_session(id, |engine| engine.submit_command("ssh")).unwrap();
        assert_eq!(store.sweep_idle(Duration::from_secs(3600)), 0);

        assert_eq!(store.sweep_idle(Duration::ZERO), 1);
        assert!(store.is_empty());
        assert!(store.with_session(id, |_| ()).is_err());
    }

    #[tokio::test]
    async fn test_idle_sweeper_evicts_abandoned_sessions() {
        let state = AppState::default();
        state.sessions.create(None).unwrap();

        // the first tick fires at once
        let sweeper = spawn_idle_sweeper(state.clone(), Duration::ZERO);
        for _ in 0..100 {
            if state.sessions.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(state.sessions.is_empty());
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_unknown_session_id() {
        let app = router(AppState::default());
        let uri = format!("/api/sessions/{}/commands", Uuid::new_v4());
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "line": "ls" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
