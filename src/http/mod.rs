use crate::blocks::BlockGate;
use crate::hooks::{ValidationError, WriteValidator};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod filter;
mod handlers;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_host")]
    pub host: IpAddr,
    #[serde(default = "Config::default_port")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl Config {
    fn default_host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Config {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<BlockGate>,
    pub validator: Arc<WriteValidator>,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(message) => (StatusCode::CONFLICT, message).into_response(),
            Self::Gate(error) => {
                tracing::error!("unable to evaluate block status: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "unable to evaluate block status",
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/git/:project/git-receive-pack", post(handlers::receive_pack))
        .route("/git/:project/git-upload-pack", post(handlers::upload_pack))
        .route("/a/changes/:id/assignee", put(handlers::set_assignee))
        .route("/a/changes/:id/hashtags", post(handlers::edit_hashtags))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    filter::block_writes,
                )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::{router, AppState};
    use crate::blocks::finder::BlockFinder;
    use crate::blocks::BlockGate;
    use crate::hooks::WriteValidator;
    use crate::model::group::GroupId;
    use crate::repository::group::MemoryGroupService;
    use crate::repository::source::StaticConfigSource;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use similar_asserts::assert_eq;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with_table(table: &str) -> Router {
        let banned = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("banned", banned)
            .with_member("mallory", banned);
        let gate = Arc::new(BlockGate::new(
            String::from("You have been blocked!"),
            Arc::new(StaticConfigSource::new(table)),
            BlockFinder::new(Arc::new(groups)),
        ));
        let validator = Arc::new(WriteValidator::new(gate.clone()));
        router(AppState { gate, validator })
    }

    fn app() -> Router {
        app_with_table("[block \"banned\"]\nblocks = true\n")
    }

    fn assignee_request(user: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(Method::PUT)
            .uri("/a/changes/42/assignee")
            .header("content-type", "application/json");
        let builder = match user {
            Some(user) => builder.header("x-forwarded-user", user),
            None => builder,
        };
        builder
            .body(Body::from(r#"{"assignee":"alice"}"#))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_let_clean_account_write() {
        crate::init_logs();

        let response = app().oneshot(assignee_request(Some("alice"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn should_answer_unavailable_to_blocked_account() {
        crate::init_logs();

        let response = app()
            .oneshot(assignee_request(Some("mallory")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "You have been blocked!");
    }

    #[tokio::test]
    async fn should_let_anonymous_caller_through() {
        crate::init_logs();

        let response = app().oneshot(assignee_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_block_every_write_route() {
        crate::init_logs();

        let requests = [
            (
                Method::POST,
                "/git/demo/git-receive-pack",
                r#"{"ref":"refs/heads/main","commit":"0123456789abcdef"}"#,
            ),
            (
                Method::POST,
                "/git/demo/git-upload-pack",
                r#"{"wants":["0123456789abcdef"]}"#,
            ),
            (
                Method::POST,
                "/a/changes/42/hashtags",
                r#"{"add":["urgent"],"remove":[]}"#,
            ),
        ];
        for (method, uri, body) in requests {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .header("x-forwarded-user", "mallory")
                .body(Body::from(body))
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn should_answer_internal_error_when_table_unloadable() {
        crate::init_logs();

        let response = app_with_table("[block \"banned\"\nblocks = true\n")
            .oneshot(assignee_request(Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
