//! HTTP API for the catalog
//!
//! JSON over HTTP/1.1. Error bodies are `{"error": "<message>"}`.
//!
//! ## Works
//! - `GET /works/{uuid}` - Get a work
//! - `PUT|PATCH /works/{uuid}/movie` - Store or patch a movie
//! - `PUT|PATCH /works/{uuid}/movie-edition` - Store or patch a movie edition
//!
//! ## Sources
//! - `GET /sources/{uuid}` - Get a source
//! - `PUT|PATCH /sources/{uuid}/file` - Store or patch a file source
//! - `PUT|PATCH /sources/{uuid}/disc` - Store or patch a disc source
//!
//! ## Plans
//! - `GET /plans?sourceUuid=&workUuid=&pageSize=&pageToken=` - List plans
//! - `GET /plans/{uuid}` - Get a plan
//! - `PUT|PATCH /plans/{uuid}/direct` - Store or patch a direct plan
//! - `PUT|PATCH /plans/{uuid}/chapter-range` - Store or patch a chapter range plan
//!
//! PUT answers 201 when it created the row and 200 when it replaced it.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X PUT -H "Content-Type: application/json" \
//!      -d '{"title": "Heat", "releaseYear": 1995}' \
//!      http://localhost:8080/works/6f1c1f4e-8a0e-4c39-9a55-0f1f5b7e2d11/movie
//!
//! curl 'http://localhost:8080/plans?workUuid=6f1c1f4e-8a0e-4c39-9a55-0f1f5b7e2d11&pageSize=20'
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::entities::UpsertOutcome;
use crate::db::DbStats;
use crate::error::CatalogError;
use crate::services::response::{
    bad_request, from_patch_result, from_result, from_upsert_result, method_not_allowed, not_found,
};
use crate::services::CatalogService;
use crate::validate;
use crate::views::{
    ChapterRangePlanInputView, DirectPlanInputView, DiscSourceInputView, FileSourceInputView,
    ListPlansParams, MovieEditionInputView, MovieWorkInputView, PlanView, SourceView, WorkView,
};

type HttpResponse = Response<Full<Bytes>>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: DbStats,
}

/// HTTP server state
pub struct HttpServer {
    catalog: Arc<CatalogService>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(catalog: Arc<CatalogService>, bind_addr: SocketAddr) -> Self {
        Self { catalog, bind_addr }
    }

    /// Bind and run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), CatalogError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections from an already bound listener
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<(), CatalogError> {
        info!(addr = %listener.local_addr()?, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, hyper::Error> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);

        debug!(method = %method, path = %path, "Incoming request");

        let body = req.into_body().collect().await?.to_bytes();
        let response = self.route(&method, &path, query.as_deref(), &body);

        debug!(method = %method, path = %path, status = %response.status(), "Request complete");
        Ok(response)
    }

    /// Route a request to its handler
    pub fn route(&self, method: &Method, path: &str, query: Option<&str>, body: &[u8]) -> HttpResponse {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match segments.as_slice() {
            ["health"] => match *method {
                Method::GET => self.handle_health(),
                _ => method_not_allowed(),
            },

            // Works
            ["works", id] => match *method {
                Method::GET => from_result(
                    path_uuid(id).and_then(|id| {
                        self.catalog.get_work(id).map(|work| WorkView { uuid: id, work })
                    }),
                ),
                _ => method_not_allowed(),
            },
            ["works", id, "movie"] => write_route(
                method,
                id,
                body,
                |id, input: MovieWorkInputView| self.catalog.put_work(id, input.into_work()?),
                |id, input: MovieWorkInputView| self.catalog.patch_work(id, input.into_patch()?),
            ),
            ["works", id, "movie-edition"] => write_route(
                method,
                id,
                body,
                |id, input: MovieEditionInputView| self.catalog.put_work(id, input.into_work()?),
                |id, input: MovieEditionInputView| self.catalog.patch_work(id, input.into_patch()?),
            ),

            // Sources
            ["sources", id] => match *method {
                Method::GET => from_result(
                    path_uuid(id).and_then(|id| {
                        self.catalog
                            .get_source(id)
                            .map(|source| SourceView { uuid: id, source })
                    }),
                ),
                _ => method_not_allowed(),
            },
            ["sources", id, "file"] => write_route(
                method,
                id,
                body,
                |id, input: FileSourceInputView| self.catalog.put_source(id, input.into_source()?),
                |id, input: FileSourceInputView| self.catalog.patch_source(id, input.into_patch()?),
            ),
            ["sources", id, "disc"] => write_route(
                method,
                id,
                body,
                |id, input: DiscSourceInputView| self.catalog.put_source(id, input.into_source()?),
                |id, input: DiscSourceInputView| self.catalog.patch_source(id, input.into_patch()?),
            ),

            // Plans
            ["plans"] => match *method {
                Method::GET => self.handle_list_plans(query),
                _ => method_not_allowed(),
            },
            ["plans", id] => match *method {
                Method::GET => from_result(
                    path_uuid(id).and_then(|id| {
                        self.catalog.get_plan(id).map(|plan| PlanView { uuid: id, plan })
                    }),
                ),
                _ => method_not_allowed(),
            },
            ["plans", id, "direct"] => write_route(
                method,
                id,
                body,
                |id, input: DirectPlanInputView| self.catalog.put_plan(id, input.into_plan()?),
                |id, input: DirectPlanInputView| self.catalog.patch_plan(id, input.into_patch()?),
            ),
            ["plans", id, "chapter-range"] => write_route(
                method,
                id,
                body,
                |id, input: ChapterRangePlanInputView| self.catalog.put_plan(id, input.into_plan()?),
                |id, input: ChapterRangePlanInputView| self.catalog.patch_plan(id, input.into_patch()?),
            ),

            _ => not_found(&format!("No route for {}", path)),
        }
    }

    /// Health check endpoint
    fn handle_health(&self) -> HttpResponse {
        from_result(
            self.catalog
                .stats()
                .map(|stats| HealthResponse { status: "ok", stats }),
        )
    }

    /// GET /plans - One page of plans
    fn handle_list_plans(&self, query: Option<&str>) -> HttpResponse {
        let params: ListPlansParams = match serde_urlencoded::from_str(query.unwrap_or("")) {
            Ok(params) => params,
            Err(e) => return bad_request(&format!("Invalid query: {}", e)),
        };

        from_result(params.into_request().and_then(|request| {
            self.catalog.list_plans(
                &request.filter,
                request.page_token.as_deref(),
                request.page_size,
            )
        }))
    }
}

fn path_uuid(text: &str) -> Result<Uuid, CatalogError> {
    validate::parse_uuid("uuid", text)
}

/// Decode a JSON request body. An empty body is rejected.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, CatalogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CatalogError::InvalidInput("request body is required".into()));
    }
    serde_json::from_slice(body)
        .map_err(|e| CatalogError::InvalidInput(format!("Invalid JSON body: {}", e)))
}

/// Shared PUT / PATCH dispatch for `/{table}/{uuid}/{kind}` routes
fn write_route<I, Put, Patch>(method: &Method, id: &str, body: &[u8], put: Put, patch: Patch) -> HttpResponse
where
    I: DeserializeOwned,
    Put: FnOnce(Uuid, I) -> Result<UpsertOutcome, CatalogError>,
    Patch: FnOnce(Uuid, I) -> Result<(), CatalogError>,
{
    let request = || -> Result<(Uuid, I), CatalogError> { Ok((path_uuid(id)?, parse_body(body)?)) };

    match *method {
        Method::PUT => from_upsert_result(request().and_then(|(id, input)| put(id, input))),
        Method::PATCH => from_patch_result(request().and_then(|(id, input)| patch(id, input))),
        _ => method_not_allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogDb;
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn server() -> HttpServer {
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());
        HttpServer::new(
            Arc::new(CatalogService::new(db)),
            "127.0.0.1:0".parse().unwrap(),
        )
    }

    async fn call(
        server: &HttpServer,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let body = if body.is_null() { Vec::new() } else { serde_json::to_vec(&body).unwrap() };
        let response = server.route(&method, path, query, &body);
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let server = server();
        let (status, body) = call(&server, Method::GET, "/health", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["work_count"], 0);

        let (status, _) = call(&server, Method::POST, "/health", None, Value::Null).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_put_then_get_work() {
        let server = server();
        let id = Uuid::new_v4();
        let path = format!("/works/{}/movie", id);

        let movie = json!({"title": "Heat", "releaseYear": 1995});
        let (status, _) = call(&server, Method::PUT, &path, None, movie.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(&server, Method::PUT, &path, None, movie).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&server, Method::GET, &format!("/works/{}", id), None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"uuid": id, "movie": {"title": "Heat", "releaseYear": 1995}}));
    }

    #[tokio::test]
    async fn test_kind_conflict_is_409() {
        let server = server();
        let id = Uuid::new_v4();

        let (status, _) = call(
            &server,
            Method::PUT,
            &format!("/works/{}/movie", id),
            None,
            json!({"title": "Heat"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &server,
            Method::PUT,
            &format!("/works/{}/movie-edition", id),
            None,
            json!({"editionType": "Director's Cut"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("different kind"));

        let (status, _) = call(
            &server,
            Method::PATCH,
            &format!("/works/{}/movie-edition", id),
            None,
            json!({"editionType": "IMAX"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let server = server();
        let id = Uuid::new_v4();

        let (status, _) = call(&server, Method::PUT, &format!("/sources/{}/file", id), None, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &server,
            Method::PUT,
            &format!("/sources/{}/file", Uuid::nil()),
            None,
            json!({"path": "/a.mkv"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&server, Method::PUT, &format!("/sources/{}/file", id), None, Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&server, Method::GET, "/works/not-a-uuid", None, Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_missing_is_404() {
        let server = server();
        let (status, _) = call(
            &server,
            Method::PATCH,
            &format!("/sources/{}/disc", Uuid::new_v4()),
            None,
            json!({"allFilesAdded": true}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_page_token_is_400() {
        let server = server();
        let (status, body) = call(&server, Method::GET, "/plans", Some("pageToken=AAAA"), Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid page token");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = server();
        let (status, _) = call(&server, Method::GET, "/episodes", None, Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&server, Method::DELETE, "/plans", None, Value::Null).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_plan_listing() {
        let server = server();
        let source = Uuid::new_v4();
        let work = Uuid::new_v4();

        call(&server, Method::PUT, &format!("/sources/{}/file", source), None, json!({"path": "/a.mkv"})).await;
        call(&server, Method::PUT, &format!("/works/{}/movie", work), None, json!({"title": "A"})).await;

        for _ in 0..3 {
            let (status, _) = call(
                &server,
                Method::PUT,
                &format!("/plans/{}/direct", Uuid::new_v4()),
                None,
                json!({"sourceUuid": source, "workUuid": work}),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let query = format!("sourceUuid={}&pageSize=2", source);
        let (status, first) = call(&server, Method::GET, "/plans", Some(&query), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["plans"].as_array().unwrap().len(), 2);
        let token = first["nextPageToken"].as_str().unwrap().to_string();

        let query = format!("sourceUuid={}&pageSize=2&pageToken={}", source, token);
        let (status, second) = call(&server, Method::GET, "/plans", Some(&query), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["plans"].as_array().unwrap().len(), 1);
        assert!(second.get("nextPageToken").is_none());
        assert!(second["plans"][0]["direct"]["sourceUuid"].is_string());
    }
}
