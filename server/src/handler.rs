//! Operation surface of the Petstore API, one trait per resource.
//!
//! An application implements these traits and hands the implementation to
//! [`crate::router`]. Parameters arrive already extracted and typed; request
//! bodies have gone through the lenient model mapper, so a malformed field
//! shows up as `None` rather than as a rejected request. Building the
//! response is entirely up to the implementation.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::response::Response;
use petstore_core::{Order, Pet, User};

/// A file received through a multipart form.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[async_trait]
pub trait PetApiHandler: Send + Sync + 'static {
    async fn add_pet(&self, pet: Pet) -> Response;
    async fn delete_pet(&self, pet_id: i64, api_key: Option<String>) -> Response;
    async fn find_pets_by_status(&self, status: Vec<String>) -> Response;
    async fn find_pets_by_tags(&self, tags: Vec<String>) -> Response;
    async fn get_pet_by_id(&self, pet_id: i64) -> Response;
    async fn update_pet(&self, pet: Pet) -> Response;
    async fn update_pet_with_form(
        &self,
        pet_id: i64,
        name: Option<String>,
        status: Option<String>,
    ) -> Response;
    async fn upload_file(
        &self,
        pet_id: i64,
        additional_metadata: Option<String>,
        file: Option<UploadedFile>,
    ) -> Response;
}

#[async_trait]
pub trait StoreApiHandler: Send + Sync + 'static {
    async fn delete_order(&self, order_id: String) -> Response;
    async fn get_inventory(&self) -> Response;
    async fn get_order_by_id(&self, order_id: i64) -> Response;
    async fn place_order(&self, order: Order) -> Response;
}

#[async_trait]
pub trait UserApiHandler: Send + Sync + 'static {
    async fn create_user(&self, user: User) -> Response;
    async fn create_users_with_array_input(&self, users: Vec<User>) -> Response;
    async fn create_users_with_list_input(&self, users: Vec<User>) -> Response;
    async fn delete_user(&self, username: String) -> Response;
    async fn get_user_by_name(&self, username: String) -> Response;
    async fn login_user(&self, username: String, password: String) -> Response;
    async fn logout_user(&self) -> Response;
    async fn update_user(&self, username: String, user: User) -> Response;
}
