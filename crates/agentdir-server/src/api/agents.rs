// ABOUTME: Agent CRUD API handlers: public listing plus session-guarded create, update, and delete.
// ABOUTME: Validates request bodies into Agents and runs each store call on the blocking pool.

use std::sync::Arc;

use agentdir_core::{Agent, AgentInput, IdPolicy, SUGGESTED_CATEGORIES};
use agentdir_store::{AgentStore, StoreError};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::app_state::SharedState;
use crate::error::ApiError;

/// Query parameters for DELETE /agents.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

fn read_body(body: Result<Json<AgentInput>, JsonRejection>) -> Result<AgentInput, ApiError> {
    body.map(|Json(input)| input)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Ensure the schema, then run `op` against the store on the blocking pool.
/// The store lock is held until `op` returns.
async fn with_store<T, F>(state: &SharedState, failed: &'static str, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AgentStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store).lock_owned().await;
    tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
        store.ensure_schema()?;
        op(&store)
    })
    .await
    .map_err(ApiError::from_join(failed))?
    .map_err(ApiError::from_store(failed))
}

/// GET /agents - List every agent, most recently updated first.
pub async fn list_agents(State(state): State<SharedState>) -> Result<Json<Vec<Agent>>, ApiError> {
    let agents = with_store(&state, "Failed to fetch agents", |store| store.list_all()).await?;

    Ok(Json(agents))
}

/// POST /agents - Create an agent, generating an id when none was given.
pub async fn create_agent(
    State(state): State<SharedState>,
    body: Result<Json<AgentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    const FAILED: &str = "Failed to create agent";

    let agent = read_body(body)?.validate(IdPolicy::Generate)?;

    let row = agent.clone();
    with_store(&state, FAILED, move |store| store.create(&row)).await?;

    tracing::info!(id = %agent.id, name = %agent.name, "created agent");
    Ok((StatusCode::CREATED, Json(agent)))
}

/// PUT /agents - Replace every field of an existing agent. Updating an id
/// that does not exist succeeds without changing anything.
pub async fn update_agent(
    State(state): State<SharedState>,
    body: Result<Json<AgentInput>, JsonRejection>,
) -> Result<Json<Agent>, ApiError> {
    const FAILED: &str = "Failed to update agent";

    let agent = read_body(body)?.validate(IdPolicy::Require)?;

    let row = agent.clone();
    let changed = with_store(&state, FAILED, move |store| store.update(&row)).await?;

    if changed == 0 {
        tracing::debug!(id = %agent.id, "update matched no agent");
    } else {
        tracing::info!(id = %agent.id, "updated agent");
    }
    Ok(Json(agent))
}

/// DELETE /agents?id= - Remove an agent. Deleting an absent id succeeds.
pub async fn delete_agent(
    State(state): State<SharedState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    const FAILED: &str = "Failed to delete agent";

    // The id is matched exactly as sent; whitespace-only counts as absent.
    let id = params
        .ok()
        .and_then(|Query(p)| p.id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Agent ID is required".to_string()))?;

    let target = id.clone();
    let removed = with_store(&state, FAILED, move |store| store.delete(&target)).await?;

    tracing::info!(id = %id, removed, "deleted agent");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /categories - The suggested category vocabulary for the admin form.
pub async fn list_categories() -> Json<&'static [&'static str]> {
    Json(SUGGESTED_CATEGORIES)
}

#[cfg(test)]
mod tests {
    use crate::app_state::{AppState, SharedState};
    use crate::auth::AuthGate;
    use crate::routes::create_router;
    use agentdir_store::AgentStore;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http::Request;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SESSION: &str = "auth=authenticated";

    fn state_at(db: &Path) -> SharedState {
        let store = AgentStore::open(db).unwrap();
        let auth = AuthGate::new("admin123", false).unwrap();
        Arc::new(AppState::new(store, auth))
    }

    fn temp_db() -> PathBuf {
        tempfile::TempDir::new().unwrap().keep().join("agents.db")
    }

    fn test_state() -> SharedState {
        state_at(&temp_db())
    }

    fn agent_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": "X",
            "description": "Does X",
            "githubUrl": "https://github.com/example/x",
            "category": "Automation",
            "status": "beta",
            "techStack": ["Go", "Redis"],
            "lastUpdated": "2024-12-20"
        })
    }

    fn json_request(method: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/agents")
            .header("content-type", "application/json")
            .header("cookie", SESSION)
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn send(state: &SharedState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = create_router(Arc::clone(state)).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn list(state: &SharedState) -> Vec<serde_json::Value> {
        let (status, json) =
            send(state, Request::get("/agents").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn list_on_fresh_database_is_empty() {
        let state = test_state();
        assert!(list(&state).await.is_empty());
    }

    #[tokio::test]
    async fn create_returns_201_and_lists_identical_agent() {
        let state = test_state();

        let (status, created) = send(&state, json_request("POST", &agent_json("a1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, agent_json("a1"));

        let agents = list(&state).await;
        assert_eq!(agents, vec![agent_json("a1")]);
        assert_eq!(agents[0]["techStack"], serde_json::json!(["Go", "Redis"]));
    }

    #[tokio::test]
    async fn create_generates_id_when_missing() {
        let state = test_state();
        let mut body = agent_json("ignored");
        body.as_object_mut().unwrap().remove("id");

        let (status, created) = send(&state, json_request("POST", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap();
        assert!(id.starts_with("agent-"));

        let agents = list(&state).await;
        assert_eq!(agents[0]["id"], id);
    }

    #[tokio::test]
    async fn create_normalizes_comma_separated_tech_stack() {
        let state = test_state();
        let mut body = agent_json("a1");
        body["techStack"] = serde_json::json!("Python, FastAPI,  Pandas ");

        let (status, created) = send(&state, json_request("POST", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["techStack"], serde_json::json!(["Python", "FastAPI", "Pandas"]));

        let agents = list(&state).await;
        assert_eq!(agents[0]["techStack"], serde_json::json!(["Python", "FastAPI", "Pandas"]));
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_and_keeps_first() {
        let state = test_state();

        let (status, _) = send(&state, json_request("POST", &agent_json("a1"))).await;
        assert_eq!(status, StatusCode::CREATED);

        let mut second = agent_json("a1");
        second["name"] = "Second".into();
        let (status, json) = send(&state, json_request("POST", &second)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["error"].is_string());

        assert_eq!(list(&state).await, vec![agent_json("a1")]);
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_before_store() {
        let state = test_state();
        let body = serde_json::json!({ "id": "a1", "status": "retired" });

        let (status, json) = send(&state, json_request("POST", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = json["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"status"));

        assert!(list(&state).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let state = test_state();
        let req = Request::post("/agents")
            .header("content-type", "application/json")
            .header("cookie", SESSION)
            .body(Body::from("{not json"))
            .unwrap();

        let (status, json) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let mut changed = agent_json("a1");
        changed["status"] = "stable".into();
        changed["demoUrl"] = "https://demo.example.com".into();
        let (status, json) = send(&state, json_request("PUT", &changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, changed);

        assert_eq!(list(&state).await, vec![changed]);
    }

    #[tokio::test]
    async fn update_missing_id_succeeds_without_effect() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let (status, _) = send(&state, json_request("PUT", &agent_json("missing"))).await;
        assert_eq!(status, StatusCode::OK);

        let agents = list(&state).await;
        assert_eq!(agents, vec![agent_json("a1")]);
        assert!(agents.iter().all(|a| a["id"] != "missing"));
    }

    #[tokio::test]
    async fn update_without_id_is_bad_request() {
        let state = test_state();
        let mut body = agent_json("a1");
        body.as_object_mut().unwrap().remove("id");

        let (status, json) = send(&state, json_request("PUT", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["details"][0]["field"], "id");
    }

    #[tokio::test]
    async fn delete_twice_is_idempotent() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        for _ in 0..2 {
            let req = Request::delete("/agents?id=a1")
                .header("cookie", SESSION)
                .body(Body::empty())
                .unwrap();
            let (status, json) = send(&state, req).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, serde_json::json!({ "success": true }));
        }

        assert!(list(&state).await.is_empty());
    }

    #[tokio::test]
    async fn delete_without_id_is_bad_request() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        for uri in ["/agents", "/agents?id=", "/agents?other=a1"] {
            let req = Request::delete(uri)
                .header("cookie", SESSION)
                .body(Body::empty())
                .unwrap();
            let (status, json) = send(&state, req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["error"], "Agent ID is required");
        }

        assert_eq!(list(&state).await.len(), 1);
    }

    #[tokio::test]
    async fn padded_values_round_trip_unchanged() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let mut padded = agent_json(" a1 ");
        padded["name"] = " X ".into();
        padded["category"] = "  ".into();
        padded["lastUpdated"] = "2024-12-21".into();

        let (status, created) = send(&state, json_request("POST", &padded)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, padded);
        assert_eq!(list(&state).await, vec![padded.clone(), agent_json("a1")]);

        // Updating the padded id leaves "a1" alone.
        padded["name"] = " Y ".into();
        let (status, updated) = send(&state, json_request("PUT", &padded)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated, padded);
        assert_eq!(list(&state).await, vec![padded, agent_json("a1")]);
    }

    #[tokio::test]
    async fn delete_matches_id_exactly() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let req = Request::delete("/agents?id=%20a1%20")
            .header("cookie", SESSION)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list(&state).await, vec![agent_json("a1")]);

        let req = Request::delete("/agents?id=%20%20")
            .header("cookie", SESSION)
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Agent ID is required");
    }

    #[tokio::test]
    async fn listing_skips_rows_that_fail_to_decode() {
        let db = temp_db();
        let state = state_at(&db);
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute(
            "INSERT INTO agents (id, name, description, github_url, category, status, tech_stack, last_updated)
             VALUES ('legacy', 'n', 'd', 'g', 'c', 'retired', '[]', '2024-12-21')",
            [],
        )
        .unwrap();

        assert_eq!(list(&state).await, vec![agent_json("a1")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_creates_all_land() {
        let state = test_state();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    send(&state, json_request("POST", &agent_json(&format!("a{}", i)))).await
                })
            })
            .collect();
        for handle in handles {
            let (status, _) = handle.await.unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        assert_eq!(list(&state).await.len(), 8);
    }

    #[tokio::test]
    async fn mutations_without_session_leave_store_unchanged() {
        let state = test_state();
        send(&state, json_request("POST", &agent_json("a1"))).await;

        let mut changed = agent_json("a1");
        changed["name"] = "Hijacked".into();
        let attempts = vec![
            ("POST", "/agents", Some(agent_json("a2"))),
            ("POST", "/agents", Some(serde_json::json!({}))),
            ("PUT", "/agents", Some(changed)),
            ("DELETE", "/agents?id=a1", None),
            ("DELETE", "/agents", None),
        ];

        for (method, uri, body) in attempts {
            let body = body
                .map(|b| Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap_or_else(Body::empty);
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap();

            let (status, json) = send(&state, req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(json["error"], "Unauthorized");
        }

        assert_eq!(list(&state).await, vec![agent_json("a1")]);
    }

    #[tokio::test]
    async fn categories_are_public() {
        let state = test_state();
        let (status, json) =
            send(&state, Request::get("/categories").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 8);
        assert_eq!(json[0], "Data Processing");
    }
}
