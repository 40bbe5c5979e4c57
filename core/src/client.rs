//! Request builder and response parser for the Petstore API.
//!
//! # Design
//! `PetstoreClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequestInput` and a `parse_*` method that consumes the
//! `ResponseOutcome` an executor produced for it:
//!
//! ```no_run
//! # async fn demo() -> Result<(), petstore_core::ApiError> {
//! use petstore_core::{HttpRequestExecutor, PetstoreClient};
//!
//! let client = PetstoreClient::new("http://localhost:8080/v2");
//! let executor = HttpRequestExecutor::default();
//! let outcome = executor.execute(client.build_get_pet_by_id(7)).await;
//! let pet = client.parse_get_pet_by_id(outcome)?;
//! # let _ = pet;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::encoding::encode_path_segment;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequestInput, ResponseOutcome, VarLayout};
use crate::model::{models_as_json_value, models_from_json_slice, Model};
use crate::types::{ApiResponse, Order, Pet, PetStatus, User};

const JSON: &str = "application/json";

/// Stateless client for the Petstore API.
#[derive(Debug, Clone)]
pub struct PetstoreClient {
    base_url: String,
}

impl PetstoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequestInput {
        HttpRequestInput::new(format!("{}{path}", self.base_url), method)
    }

    fn json_request(&self, method: HttpMethod, path: &str, body: Value) -> HttpRequestInput {
        let mut input = self.request(method, path).with_body(body.to_string());
        input.add_header("Content-Type", JSON);
        input
    }

    // -----------------------------------------------------------------------
    // pet
    // -----------------------------------------------------------------------

    pub fn build_add_pet(&self, pet: &Pet) -> HttpRequestInput {
        self.json_request(HttpMethod::Post, "/pet", pet.as_json_value())
    }

    pub fn build_update_pet(&self, pet: &Pet) -> HttpRequestInput {
        self.json_request(HttpMethod::Put, "/pet", pet.as_json_value())
    }

    pub fn build_delete_pet(&self, pet_id: i64, api_key: Option<&str>) -> HttpRequestInput {
        let mut input = self.request(HttpMethod::Delete, &format!("/pet/{pet_id}"));
        if let Some(key) = api_key {
            input.add_header("api_key", key);
        }
        input
    }

    pub fn build_find_pets_by_status(&self, status: &[PetStatus]) -> HttpRequestInput {
        let csv = status.iter().map(PetStatus::as_str).collect::<Vec<_>>().join(",");
        let mut input = self
            .request(HttpMethod::Get, "/pet/findByStatus")
            .with_layout(VarLayout::Address);
        input.add_var("status", csv);
        input
    }

    pub fn build_find_pets_by_tags(&self, tags: &[&str]) -> HttpRequestInput {
        let mut input = self
            .request(HttpMethod::Get, "/pet/findByTags")
            .with_layout(VarLayout::Address);
        input.add_var("tags", tags.join(","));
        input
    }

    pub fn build_get_pet_by_id(&self, pet_id: i64) -> HttpRequestInput {
        self.request(HttpMethod::Get, &format!("/pet/{pet_id}"))
    }

    pub fn build_update_pet_with_form(
        &self,
        pet_id: i64,
        name: Option<&str>,
        status: Option<&str>,
    ) -> HttpRequestInput {
        let mut input = self
            .request(HttpMethod::Post, &format!("/pet/{pet_id}"))
            .with_layout(VarLayout::UrlEncoded);
        if let Some(name) = name {
            input.add_var("name", name);
        }
        if let Some(status) = status {
            input.add_var("status", status);
        }
        input
    }

    pub fn build_upload_file(
        &self,
        pet_id: i64,
        additional_metadata: Option<&str>,
        file: Option<&Path>,
    ) -> HttpRequestInput {
        let mut input = self
            .request(HttpMethod::Post, &format!("/pet/{pet_id}/uploadImage"))
            .with_layout(VarLayout::Multipart);
        if let Some(metadata) = additional_metadata {
            input.add_var("additionalMetadata", metadata);
        }
        if let Some(path) = file {
            let request_filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            input.add_file("file", path, request_filename, "application/octet-stream");
        }
        input
    }

    pub fn parse_add_pet(&self, outcome: ResponseOutcome) -> Result<Pet, ApiError> {
        check_outcome(&outcome)?;
        Ok(Pet::from_json_slice(&outcome.body))
    }

    pub fn parse_update_pet(&self, outcome: ResponseOutcome) -> Result<Pet, ApiError> {
        check_outcome(&outcome)?;
        Ok(Pet::from_json_slice(&outcome.body))
    }

    pub fn parse_delete_pet(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_find_pets_by_status(&self, outcome: ResponseOutcome) -> Result<Vec<Pet>, ApiError> {
        check_outcome(&outcome)?;
        Ok(models_from_json_slice(&outcome.body))
    }

    pub fn parse_find_pets_by_tags(&self, outcome: ResponseOutcome) -> Result<Vec<Pet>, ApiError> {
        check_outcome(&outcome)?;
        Ok(models_from_json_slice(&outcome.body))
    }

    pub fn parse_get_pet_by_id(&self, outcome: ResponseOutcome) -> Result<Pet, ApiError> {
        check_outcome(&outcome)?;
        Ok(Pet::from_json_slice(&outcome.body))
    }

    pub fn parse_update_pet_with_form(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_upload_file(&self, outcome: ResponseOutcome) -> Result<ApiResponse, ApiError> {
        check_outcome(&outcome)?;
        Ok(ApiResponse::from_json_slice(&outcome.body))
    }

    // -----------------------------------------------------------------------
    // store
    // -----------------------------------------------------------------------

    pub fn build_get_inventory(&self) -> HttpRequestInput {
        self.request(HttpMethod::Get, "/store/inventory")
    }

    pub fn build_place_order(&self, order: &Order) -> HttpRequestInput {
        self.json_request(HttpMethod::Post, "/store/order", order.as_json_value())
    }

    pub fn build_get_order_by_id(&self, order_id: i64) -> HttpRequestInput {
        self.request(HttpMethod::Get, &format!("/store/order/{order_id}"))
    }

    pub fn build_delete_order(&self, order_id: &str) -> HttpRequestInput {
        self.request(
            HttpMethod::Delete,
            &format!("/store/order/{}", encode_path_segment(order_id)),
        )
    }

    /// Status name to count. Entries whose count is not an integer are skipped.
    pub fn parse_get_inventory(&self, outcome: ResponseOutcome) -> Result<HashMap<String, i32>, ApiError> {
        check_outcome(&outcome)?;
        let inventory = match serde_json::from_slice::<Value>(&outcome.body) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .filter_map(|(status, count)| {
                    let count = count.as_i64().and_then(|c| i32::try_from(c).ok())?;
                    Some((status, count))
                })
                .collect(),
            _ => HashMap::new(),
        };
        Ok(inventory)
    }

    pub fn parse_place_order(&self, outcome: ResponseOutcome) -> Result<Order, ApiError> {
        check_outcome(&outcome)?;
        Ok(Order::from_json_slice(&outcome.body))
    }

    pub fn parse_get_order_by_id(&self, outcome: ResponseOutcome) -> Result<Order, ApiError> {
        check_outcome(&outcome)?;
        Ok(Order::from_json_slice(&outcome.body))
    }

    pub fn parse_delete_order(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    // -----------------------------------------------------------------------
    // user
    // -----------------------------------------------------------------------

    pub fn build_create_user(&self, user: &User) -> HttpRequestInput {
        self.json_request(HttpMethod::Post, "/user", user.as_json_value())
    }

    pub fn build_create_users_with_array_input(&self, users: &[User]) -> HttpRequestInput {
        self.json_request(HttpMethod::Post, "/user/createWithArray", models_as_json_value(users))
    }

    pub fn build_create_users_with_list_input(&self, users: &[User]) -> HttpRequestInput {
        self.json_request(HttpMethod::Post, "/user/createWithList", models_as_json_value(users))
    }

    pub fn build_login_user(&self, username: &str, password: &str) -> HttpRequestInput {
        let mut input = self
            .request(HttpMethod::Get, "/user/login")
            .with_layout(VarLayout::Address);
        input.add_var("username", username);
        input.add_var("password", password);
        input
    }

    pub fn build_logout_user(&self) -> HttpRequestInput {
        self.request(HttpMethod::Get, "/user/logout")
    }

    pub fn build_get_user_by_name(&self, username: &str) -> HttpRequestInput {
        self.request(
            HttpMethod::Get,
            &format!("/user/{}", encode_path_segment(username)),
        )
    }

    pub fn build_update_user(&self, username: &str, user: &User) -> HttpRequestInput {
        self.json_request(
            HttpMethod::Put,
            &format!("/user/{}", encode_path_segment(username)),
            user.as_json_value(),
        )
    }

    pub fn build_delete_user(&self, username: &str) -> HttpRequestInput {
        self.request(
            HttpMethod::Delete,
            &format!("/user/{}", encode_path_segment(username)),
        )
    }

    pub fn parse_create_user(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_create_users_with_array_input(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_create_users_with_list_input(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    /// The session token. Accepts both a JSON string and plain text.
    pub fn parse_login_user(&self, outcome: ResponseOutcome) -> Result<String, ApiError> {
        check_outcome(&outcome)?;
        Ok(match serde_json::from_slice::<Value>(&outcome.body) {
            Ok(Value::String(token)) => token,
            _ => outcome.text(),
        })
    }

    pub fn parse_logout_user(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_get_user_by_name(&self, outcome: ResponseOutcome) -> Result<User, ApiError> {
        check_outcome(&outcome)?;
        Ok(User::from_json_slice(&outcome.body))
    }

    pub fn parse_update_user(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }

    pub fn parse_delete_user(&self, outcome: ResponseOutcome) -> Result<(), ApiError> {
        check_outcome(&outcome)
    }
}

/// Map transport failures and non-2xx status codes to `ApiError`.
fn check_outcome(outcome: &ResponseOutcome) -> Result<(), ApiError> {
    if !outcome.is_success() {
        return Err(ApiError::Transport {
            kind: outcome.error,
            message: outcome.error_str.clone(),
        });
    }
    match outcome.status {
        Some(200..=299) | None => Ok(()),
        Some(404) => Err(ApiError::NotFound),
        Some(status) => Err(ApiError::Http {
            status,
            body: outcome.text(),
        }),
    }
}
