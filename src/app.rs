use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, comments, posts, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .route("/", get(home))
                .route("/health", get(|| async { "ok" }))
                .merge(auth::router())
                .merge(users::router())
                .merge(posts::router())
                .merge(comments::router()),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to the blog API" }))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn access_token(state: &AppState, user_id: i64) -> String {
        JwtKeys::from_ref(state).sign_access(user_id).unwrap()
    }

    #[tokio::test]
    async fn health_and_home() {
        let app = build_app(AppState::fake());
        let (status, body) = send(app.clone(), Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));

        let (status, body) = send(app, Method::GET, "/api", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn non_numeric_post_id_is_rejected_before_database() {
        let app = build_app(AppState::fake());
        for uri in ["/api/posts/abc", "/api/posts/-1", "/api/users/1.5", "/api/posts/x/comments"] {
            let (status, body) = send(app.clone(), Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].as_str().unwrap().starts_with("Invalid id"));
        }
    }

    #[tokio::test]
    async fn bad_pagination_is_a_json_bad_request() {
        let app = build_app(AppState::fake());
        for uri in ["/api/users?limit=abc", "/api/posts?offset=x"] {
            let res = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["error"].as_str().unwrap().contains("query string"));
        }
    }

    #[tokio::test]
    async fn mutations_require_a_token() {
        let app = build_app(AppState::fake());
        let cases = [
            (Method::PUT, "/api/users/1"),
            (Method::DELETE, "/api/users/1"),
            (Method::POST, "/api/posts"),
            (Method::PUT, "/api/posts/1"),
            (Method::DELETE, "/api/posts/1"),
            (Method::POST, "/api/comments"),
            (Method::PUT, "/api/comments/1"),
            (Method::DELETE, "/api/comments/1"),
            (Method::GET, "/api/me"),
        ];
        for (method, uri) in cases {
            let (status, body) =
                send(app.clone(), method.clone(), uri, None, Some(json!({}))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"], "Missing Authorization header");
        }
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let state = AppState::fake();
        let refresh = JwtKeys::from_ref(&state).sign_refresh(1).unwrap();
        let app = build_app(state);
        let (status, body) = send(app, Method::DELETE, "/api/users/1", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Access token required");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = send(app, Method::DELETE, "/api/users/1", Some("not.a.jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn users_cannot_touch_other_accounts() {
        let state = AppState::fake();
        let token = access_token(&state, 1);
        let app = build_app(state);

        let (status, _) = send(app.clone(), Method::DELETE, "/api/users/2", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let body = json!({ "username": "a", "email": "a@x.com", "password": "p" });
        let (status, body) = send(app, Method::PUT, "/api/users/2", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn post_for_another_author_is_unauthorized() {
        let state = AppState::fake();
        let token = access_token(&state, 1);
        let app = build_app(state);

        let body = json!({ "title": "t", "content": "c", "authorId": 2 });
        let (status, body) = send(app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn invalid_payloads_are_unprocessable() {
        let state = AppState::fake();
        let token = access_token(&state, 1);
        let app = build_app(state);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "username": "", "email": "kan@gmail.com", "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Required username.");
        assert_eq!(body["fields"]["username"], "Required username.");

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/posts",
            Some(&token),
            Some(json!({ "title": "t", "content": "c", "authorId": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Required Author");

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/comments",
            Some(&token),
            Some(json!({ "body": "  ", "postId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Required Body");

        let (status, body) = send(
            app,
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "kangmail.com", "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid Email.");
    }

    #[tokio::test]
    async fn malformed_json_is_unprocessable() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    mod with_database {
        use super::*;
        use sqlx::PgPool;

        fn state(db: PgPool) -> AppState {
            AppState::from_parts(db, AppState::fake().config)
        }

        async fn register(app: &Router, username: &str, email: &str) -> (StatusCode, Value) {
            let body = json!({ "username": username, "email": email, "password": "p" });
            send(app.clone(), Method::POST, "/api/users", None, Some(body)).await
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn duplicate_email_is_a_conflict_naming_the_email(db: PgPool) {
            let app = build_app(state(db));

            let (status, user) = register(&app, "a", "a@x.com").await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(user["username"], "a");
            assert!(user.get("password_hash").is_none());

            let (status, body) = register(&app, "b", "a@x.com").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "Email has already been used.");

            let (status, body) = register(&app, "a", "other@x.com").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "Username has already been used.");
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn post_owner_is_immutable_and_text_round_trips(db: PgPool) {
            let st = state(db);
            let app = build_app(st.clone());

            let (_, alice) = register(&app, "alice", "alice@x.com").await;
            let (_, bob) = register(&app, "bob", "bob@x.com").await;
            let alice_id = alice["id"].as_i64().unwrap();
            let bob_id = bob["id"].as_i64().unwrap();
            let alice_token = access_token(&st, alice_id);
            let bob_token = access_token(&st, bob_id);

            let body = json!({ "title": " Fish & Chips ", "content": "<b>tasty</b>", "authorId": alice_id });
            let (status, post) =
                send(app.clone(), Method::POST, "/api/posts", Some(&alice_token), Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
            let post_id = post["id"].as_i64().unwrap();
            let uri = format!("/api/posts/{post_id}");

            let (status, fetched) = send(app.clone(), Method::GET, &uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(fetched["title"], "Fish &amp; Chips");
            assert_eq!(fetched["content"], "&lt;b&gt;tasty&lt;/b&gt;");
            assert_eq!(fetched["author"]["username"], "alice");

            let hijack = json!({ "title": "mine", "content": "now", "authorId": bob_id });
            let (status, _) =
                send(app.clone(), Method::PUT, &uri, Some(&alice_token), Some(hijack.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let (status, _) = send(app.clone(), Method::PUT, &uri, Some(&bob_token), Some(hijack)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let (_, fetched) = send(app, Method::GET, &uri, None, None).await;
            assert_eq!(fetched["authorId"], alice_id);
            assert_eq!(fetched["title"], "Fish &amp; Chips");
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn deleting_a_user_removes_their_content(db: PgPool) {
            let st = state(db);
            let app = build_app(st.clone());

            let (_, alice) = register(&app, "alice", "alice@x.com").await;
            let (_, bob) = register(&app, "bob", "bob@x.com").await;
            let alice_id = alice["id"].as_i64().unwrap();
            let bob_id = bob["id"].as_i64().unwrap();
            let alice_token = access_token(&st, alice_id);
            let bob_token = access_token(&st, bob_id);

            let (_, post) = send(
                app.clone(),
                Method::POST,
                "/api/posts",
                Some(&alice_token),
                Some(json!({ "title": "t", "content": "c", "authorId": alice_id })),
            )
            .await;
            let post_id = post["id"].as_i64().unwrap();

            let (status, _) = send(
                app.clone(),
                Method::POST,
                "/api/comments",
                Some(&bob_token),
                Some(json!({ "body": "nice", "postId": post_id })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, body) = send(
                app.clone(),
                Method::DELETE,
                &format!("/api/users/{alice_id}"),
                Some(&alice_token),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "User has been deleted");

            let (status, _) =
                send(app.clone(), Method::GET, &format!("/api/posts/{post_id}"), None, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _) = send(
                app,
                Method::POST,
                "/api/comments",
                Some(&bob_token),
                Some(json!({ "body": "late", "postId": post_id })),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }
}
