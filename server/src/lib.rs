//! HTTP server side of the Petstore API.
//!
//! # Design
//! `router` turns any implementation of the three handler traits into an
//! axum `Router`. Extraction is the only logic here: path and query
//! parameters, the `api_key` header, urlencoded and multipart forms, and JSON
//! bodies mapped through the lenient model mapper. `app` wires the router to
//! a fresh `InMemoryPetstore`.

pub mod config;
pub mod handler;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Form, Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use petstore_core::model::models_from_json_slice;
use petstore_core::{Model, Order, Pet, User};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub use config::{ConfigError, ServerConfig};
pub use handler::{PetApiHandler, StoreApiHandler, UploadedFile, UserApiHandler};
pub use memory::InMemoryPetstore;

/// Router over a fresh in-memory store.
pub fn app() -> Router {
    router(Arc::new(InMemoryPetstore::new()))
}

/// Router dispatching every Petstore operation to `handler`.
pub fn router<H>(handler: Arc<H>) -> Router
where
    H: PetApiHandler + StoreApiHandler + UserApiHandler,
{
    Router::new()
        .route("/pet", post(add_pet::<H>).put(update_pet::<H>))
        .route("/pet/findByStatus", get(find_pets_by_status::<H>))
        .route("/pet/findByTags", get(find_pets_by_tags::<H>))
        .route(
            "/pet/{petId}",
            get(get_pet_by_id::<H>)
                .post(update_pet_with_form::<H>)
                .delete(delete_pet::<H>),
        )
        .route("/pet/{petId}/uploadImage", post(upload_file::<H>))
        .route("/store/inventory", get(get_inventory::<H>))
        .route("/store/order", post(place_order::<H>))
        .route(
            "/store/order/{orderId}",
            get(get_order_by_id::<H>).delete(delete_order::<H>),
        )
        .route("/user", post(create_user::<H>))
        .route("/user/createWithArray", post(create_users_with_array_input::<H>))
        .route("/user/createWithList", post(create_users_with_list_input::<H>))
        .route("/user/login", get(login_user::<H>))
        .route("/user/logout", get(logout_user::<H>))
        .route(
            "/user/{username}",
            get(get_user_by_name::<H>)
                .put(update_user::<H>)
                .delete(delete_user::<H>),
        )
        .with_state(handler)
        .layer(middleware::from_fn(log_request))
}

/// Serve `router` under `base_path` (for example `/v2`).
pub fn mount(router: Router, base_path: &str) -> Router {
    let base_path = base_path.trim_end_matches('/');
    if base_path.is_empty() {
        router
    } else {
        Router::new().nest(base_path, router)
    }
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Split a comma-separated query value, dropping empty items.
fn csv(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// pet
// ---------------------------------------------------------------------------

async fn add_pet<H: PetApiHandler>(State(handler): State<Arc<H>>, body: Bytes) -> Response {
    handler.add_pet(Pet::from_json_slice(&body)).await
}

async fn update_pet<H: PetApiHandler>(State(handler): State<Arc<H>>, body: Bytes) -> Response {
    handler.update_pet(Pet::from_json_slice(&body)).await
}

async fn delete_pet<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Path(pet_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let api_key = headers
        .get("api_key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    handler.delete_pet(pet_id, api_key).await
}

async fn find_pets_by_status<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handler.find_pets_by_status(csv(&params, "status")).await
}

async fn find_pets_by_tags<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handler.find_pets_by_tags(csv(&params, "tags")).await
}

async fn get_pet_by_id<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Path(pet_id): Path<i64>,
) -> Response {
    handler.get_pet_by_id(pet_id).await
}

#[derive(Debug, Deserialize)]
struct PetForm {
    name: Option<String>,
    status: Option<String>,
}

async fn update_pet_with_form<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Path(pet_id): Path<i64>,
    Form(form): Form<PetForm>,
) -> Response {
    handler.update_pet_with_form(pet_id, form.name, form.status).await
}

async fn upload_file<H: PetApiHandler>(
    State(handler): State<Arc<H>>,
    Path(pet_id): Path<i64>,
    mut multipart: Multipart,
) -> Response {
    let mut additional_metadata = None;
    let mut file = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        match name.as_str() {
            "additionalMetadata" => {
                additional_metadata = Some(String::from_utf8_lossy(&data).into_owned());
            }
            "file" => {
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }
    handler.upload_file(pet_id, additional_metadata, file).await
}

// ---------------------------------------------------------------------------
// store
// ---------------------------------------------------------------------------

async fn delete_order<H: StoreApiHandler>(
    State(handler): State<Arc<H>>,
    Path(order_id): Path<String>,
) -> Response {
    handler.delete_order(order_id).await
}

async fn get_inventory<H: StoreApiHandler>(State(handler): State<Arc<H>>) -> Response {
    handler.get_inventory().await
}

async fn get_order_by_id<H: StoreApiHandler>(
    State(handler): State<Arc<H>>,
    Path(order_id): Path<i64>,
) -> Response {
    handler.get_order_by_id(order_id).await
}

async fn place_order<H: StoreApiHandler>(State(handler): State<Arc<H>>, body: Bytes) -> Response {
    handler.place_order(Order::from_json_slice(&body)).await
}

// ---------------------------------------------------------------------------
// user
// ---------------------------------------------------------------------------

async fn create_user<H: UserApiHandler>(State(handler): State<Arc<H>>, body: Bytes) -> Response {
    handler.create_user(User::from_json_slice(&body)).await
}

async fn create_users_with_array_input<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Response {
    handler
        .create_users_with_array_input(models_from_json_slice(&body))
        .await
}

async fn create_users_with_list_input<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Response {
    handler
        .create_users_with_list_input(models_from_json_slice(&body))
        .await
}

async fn delete_user<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    Path(username): Path<String>,
) -> Response {
    handler.delete_user(username).await
}

async fn get_user_by_name<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    Path(username): Path<String>,
) -> Response {
    handler.get_user_by_name(username).await
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login_user<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    Query(credentials): Query<Credentials>,
) -> Response {
    handler
        .login_user(credentials.username, credentials.password)
        .await
}

async fn logout_user<H: UserApiHandler>(State(handler): State<Arc<H>>) -> Response {
    handler.logout_user().await
}

async fn update_user<H: UserApiHandler>(
    State(handler): State<Arc<H>>,
    Path(username): Path<String>,
    body: Bytes,
) -> Response {
    handler
        .update_user(username, User::from_json_slice(&body))
        .await
}
