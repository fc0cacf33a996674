use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{catalog, members, reports, transactions};
use engine::{Engine, admins};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Basic-auth gate for every route. Credentials are checked against the
/// `admins` table on each request.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let admin = admins::Entity::find()
        .filter(admins::Column::Username.eq(auth_header.username()))
        .filter(admins::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(admin) = admin else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/members", get(members::list).post(members::enroll))
        .route(
            "/members/{id}",
            get(members::detail)
                .put(members::update)
                .delete(members::remove),
        )
        .route("/transactions", post(transactions::create))
        .route("/transactions/{member_id}", get(transactions::list))
        .route("/types", get(catalog::list_types).post(catalog::create_type))
        .route(
            "/types/{id}",
            put(catalog::update_type).delete(catalog::delete_type),
        )
        .route(
            "/pointLevels",
            get(catalog::list_levels).post(catalog::create_level),
        )
        .route(
            "/pointLevels/{id}",
            put(catalog::update_level).delete(catalog::delete_level),
        )
        .route("/reports/monthly/{year}/{month}", get(reports::monthly))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveModelTrait, ActiveValue, Database};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        admins::ActiveModel {
            username: ActiveValue::Set("admin".to_string()),
            password: ActiveValue::Set("secret".to_string()),
        }
        .insert(&db)
        .await
        .unwrap();

        let engine = Engine::builder().database(db.clone()).build();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str, password: &str) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{username}:{password}"));
        format!("Basic {encoded}")
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth("admin", "secret"))
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let app = test_router().await;
        let res = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/members")
                    .header(header::AUTHORIZATION, basic_auth("admin", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn enrollment_roundtrip() {
        let app = test_router().await;

        let res = app
            .clone()
            .oneshot(request(
                "POST",
                "/members",
                Some(serde_json::json!({
                    "name": "Ada",
                    "phone": "13800000001",
                    "initial_stored_minor": 10_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["stored_balance_minor"], 10_000);
        assert_eq!(created["points"], 1_000);
        let id = created["id"].as_str().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(request("GET", &format!("/members/{id}"), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        // Same phone again conflicts.
        let res = app
            .oneshot(request(
                "POST",
                "/members",
                Some(serde_json::json!({
                    "name": "Eve",
                    "phone": "13800000001",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_member_is_404() {
        let app = test_router().await;
        let res = app
            .oneshot(request(
                "GET",
                &format!("/members/{}", uuid::Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transactions_update_balances() {
        let app = test_router().await;

        let res = app
            .clone()
            .oneshot(request(
                "POST",
                "/members",
                Some(serde_json::json!({"name": "Ada", "phone": "13800000001"})),
            ))
            .await
            .unwrap();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(request(
                "POST",
                "/transactions",
                Some(serde_json::json!({
                    "member_id": id,
                    "kind": "recharge",
                    "amount_minor": 5_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let member: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(member["stored_balance_minor"], 5_000);

        let res = app
            .clone()
            .oneshot(request(
                "POST",
                "/transactions",
                Some(serde_json::json!({
                    "member_id": id,
                    "kind": "consume",
                    "amount_minor": 20_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = app
            .oneshot(request("GET", &format!("/transactions/{id}"), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let ledger: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(ledger.as_array().unwrap().len(), 1);
    }
}
