use crate::error::{AppError, AppResult};
use crate::state::AppState;
use asi_core::{extractor, scoring, AsiError};
use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AsiQuery {
    format: Option<String>,
}

#[derive(Serialize)]
pub struct AsiMeta {
    database: String,
    backend: String,
    #[serde(rename = "exec-ms")]
    exec_ms: f64,
    read_count: u64,
}

#[derive(Serialize)]
pub struct AsiResponse {
    meta: AsiMeta,
    data: Map<String, Value>,
}

/// `POST /asi?format=<format>` — the request orchestrator (C5). Validates
/// the format and body, then chains the extractor, the store, and the
/// scoring engine before assembling the response document.
pub async fn score_deck(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AsiQuery>,
    body: Bytes,
) -> AppResult<Json<AsiResponse>> {
    let format = query.format.ok_or(AppError::MissingParameter)?;

    if !state.store.is_known_format(&format) {
        return Err(AppError::InvalidParameter(format));
    }

    let cards = parse_deck_body(&body)?;

    let (_deck, candidates) = extractor::extract(cards).map_err(|e| match e {
        AsiError::TooFewCards => {
            AppError::InvalidJson("The request body must contain at least two cards.".to_string())
        }
        other => AppError::Internal(other.into()),
    })?;

    let result = state
        .store
        .lookup(&format, &candidates)
        .await
        .map_err(|e| match e {
            AsiError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            AsiError::SchemaMismatch(msg) => AppError::SchemaMismatch(msg),
            other => AppError::Internal(other.into()),
        })?;

    let outcome = scoring::score(&result.rows);

    let mut data = Map::new();
    for (archetype, score) in outcome.ranked {
        data.insert(archetype, Value::from(score));
    }

    Ok(Json(AsiResponse {
        meta: AsiMeta {
            database: state.database.clone(),
            backend: state.backend.clone(),
            exec_ms: result.stats.exec_ms,
            read_count: result.stats.rows_scanned,
        },
        data,
    }))
}

/// Parses the raw request body into a list of card names, enforcing the
/// "array of strings" contract ahead of the extractor's own "too few
/// cards" check.
fn parse_deck_body(body: &[u8]) -> AppResult<Vec<String>> {
    let value: Value = serde_json::from_slice(body).map_err(|_| {
        AppError::InvalidJson("The request body must be a valid JSON array.".to_string())
    })?;

    let array = value.as_array().ok_or_else(|| {
        AppError::InvalidJson("The request body must be a valid JSON array.".to_string())
    })?;

    array
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                AppError::InvalidJson(
                    "The request body must contain only card name strings.".to_string(),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asi_core::model::BigramRecord;
    use asi_core::store::{BigramStore, InMemoryBigramStore, StoreQueryResult};
    use asi_core::{AsiResult, Bigram};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    /// A store double that always reports a schema mismatch, so the route's
    /// `AsiError::SchemaMismatch` branch can be exercised without a real
    /// Postgres connection.
    struct SchemaMismatchStore;

    #[async_trait::async_trait]
    impl BigramStore for SchemaMismatchStore {
        async fn lookup(&self, _format: &String, _candidates: &BTreeSet<Bigram>) -> AsiResult<StoreQueryResult> {
            Err(AsiError::SchemaMismatch("column 'k1' is not of type SMALLINT".to_string()))
        }

        fn is_known_format(&self, _format: &String) -> bool {
            true
        }
    }

    fn fixture_state() -> Arc<AppState> {
        let mut store = InMemoryBigramStore::new();
        let format = "modern".to_string();
        store.insert(
            &format,
            BigramRecord {
                archetype: "Eldrazi".to_string(),
                bigram: Bigram::canonical("Eye of Ugin".to_string(), "Thought-Knot Seer".to_string()),
                k1: 4,
                k2: 4,
            },
        );
        Arc::new(AppState::new(
            Arc::new(store),
            "asi".to_string(),
            "in-memory".to_string(),
        ))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/asi", post(score_deck))
            .with_state(state)
    }

    async fn send(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn missing_format_is_rejected() {
        let (status, body) = send(app(fixture_state()), "/asi", "[]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing Parameter");
        assert_eq!(body["message"], "The 'format' parameter is required.");
    }

    #[tokio::test]
    async fn unknown_format_is_rejected() {
        let (status, body) = send(app(fixture_state()), "/asi?format=bogus", "[]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid Parameter");
        assert_eq!(
            body["message"],
            "The 'format' parameter 'bogus' is not supported."
        );
    }

    #[tokio::test]
    async fn non_array_body_is_rejected() {
        let (status, body) = send(app(fixture_state()), "/asi?format=modern", r#"{"x":1}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON");
        assert_eq!(
            body["message"],
            "The request body must be a valid JSON array."
        );
    }

    #[tokio::test]
    async fn too_few_cards_is_rejected() {
        let (status, body) =
            send(app(fixture_state()), "/asi?format=modern", r#"["Forest"]"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON");
        assert_eq!(
            body["message"],
            "The request body must contain at least two cards."
        );
    }

    #[tokio::test]
    async fn matching_deck_returns_scored_data() {
        let (status, body) = send(
            app(fixture_state()),
            "/asi?format=modern",
            r#"["Eye of Ugin", "Thought-Knot Seer"]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["Eldrazi"], 1.0);
        assert!(body["meta"]["database"].is_string());
    }

    #[tokio::test]
    async fn schema_mismatch_is_reported_as_a_distinct_fatal_error() {
        let state = Arc::new(AppState::new(
            Arc::new(SchemaMismatchStore),
            "asi".to_string(),
            "postgres".to_string(),
        ));
        let (status, body) = send(
            app(state),
            "/asi?format=modern",
            r#"["Forest", "Plains"]"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Schema Mismatch");
    }

    #[tokio::test]
    async fn disjoint_deck_returns_empty_data() {
        let (status, body) = send(
            app(fixture_state()),
            "/asi?format=modern",
            r#"["Forest", "Plains"]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!({}));
    }
}
