//! Reference handler that keeps everything in memory.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use petstore_core::{ApiResponse, Model, Order, Pet, PetStatus, User};
use tokio::sync::RwLock;
use tracing::debug;

use crate::handler::{PetApiHandler, StoreApiHandler, UploadedFile, UserApiHandler};

#[derive(Debug, Default)]
struct Db {
    pets: BTreeMap<i64, Pet>,
    orders: BTreeMap<i64, Order>,
    users: BTreeMap<String, User>,
    last_pet_id: i64,
    last_order_id: i64,
}

/// Use `requested` or the next free id, keeping `last` at the highest id seen.
fn claim_id(last: &mut i64, requested: Option<i64>) -> i64 {
    let id = requested.unwrap_or(*last + 1);
    *last = (*last).max(id);
    id
}

/// Pets, orders and users held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryPetstore {
    db: RwLock<Db>,
    sessions: AtomicU64,
}

impl InMemoryPetstore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn status(code: StatusCode, message: &str) -> Response {
    (code, message.to_string()).into_response()
}

#[async_trait]
impl PetApiHandler for InMemoryPetstore {
    async fn add_pet(&self, mut pet: Pet) -> Response {
        if !pet.is_set() {
            return status(StatusCode::METHOD_NOT_ALLOWED, "Invalid input");
        }
        let mut db = self.db.write().await;
        let id = claim_id(&mut db.last_pet_id, pet.id);
        pet.id = Some(id);
        db.pets.insert(id, pet.clone());
        debug!(pet_id = id, "pet added");
        Json(pet).into_response()
    }

    async fn delete_pet(&self, pet_id: i64, api_key: Option<String>) -> Response {
        debug!(pet_id, has_api_key = api_key.is_some(), "deleting pet");
        match self.db.write().await.pets.remove(&pet_id) {
            Some(_) => StatusCode::OK.into_response(),
            None => status(StatusCode::NOT_FOUND, "Pet not found"),
        }
    }

    async fn find_pets_by_status(&self, status_values: Vec<String>) -> Response {
        let wanted: Vec<PetStatus> = status_values
            .iter()
            .filter_map(|value| PetStatus::parse(value))
            .collect();
        if wanted.is_empty() {
            return status(StatusCode::BAD_REQUEST, "Invalid status value");
        }
        let db = self.db.read().await;
        let pets: Vec<Pet> = db
            .pets
            .values()
            .filter(|pet| pet.status.is_some_and(|s| wanted.contains(&s)))
            .cloned()
            .collect();
        Json(pets).into_response()
    }

    async fn find_pets_by_tags(&self, tags: Vec<String>) -> Response {
        if tags.is_empty() {
            return status(StatusCode::BAD_REQUEST, "Invalid tag value");
        }
        let db = self.db.read().await;
        let pets: Vec<Pet> = db
            .pets
            .values()
            .filter(|pet| {
                pet.tags.iter().flatten().any(|tag| {
                    tag.name
                        .as_ref()
                        .is_some_and(|name| tags.iter().any(|t| t == name))
                })
            })
            .cloned()
            .collect();
        Json(pets).into_response()
    }

    async fn get_pet_by_id(&self, pet_id: i64) -> Response {
        match self.db.read().await.pets.get(&pet_id) {
            Some(pet) => Json(pet.clone()).into_response(),
            None => status(StatusCode::NOT_FOUND, "Pet not found"),
        }
    }

    async fn update_pet(&self, pet: Pet) -> Response {
        let Some(id) = pet.id else {
            return status(StatusCode::BAD_REQUEST, "Invalid ID supplied");
        };
        let mut db = self.db.write().await;
        match db.pets.get_mut(&id) {
            Some(existing) => {
                *existing = pet.clone();
                Json(pet).into_response()
            }
            None => status(StatusCode::NOT_FOUND, "Pet not found"),
        }
    }

    async fn update_pet_with_form(
        &self,
        pet_id: i64,
        name: Option<String>,
        status_value: Option<String>,
    ) -> Response {
        let new_status = match status_value.as_deref() {
            Some(value) => match PetStatus::parse(value) {
                Some(parsed) => Some(parsed),
                None => return status(StatusCode::METHOD_NOT_ALLOWED, "Invalid input"),
            },
            None => None,
        };
        let mut db = self.db.write().await;
        let Some(pet) = db.pets.get_mut(&pet_id) else {
            return status(StatusCode::NOT_FOUND, "Pet not found");
        };
        if name.is_some() {
            pet.name = name;
        }
        if new_status.is_some() {
            pet.status = new_status;
        }
        StatusCode::OK.into_response()
    }

    async fn upload_file(
        &self,
        pet_id: i64,
        additional_metadata: Option<String>,
        file: Option<UploadedFile>,
    ) -> Response {
        if !self.db.read().await.pets.contains_key(&pet_id) {
            return status(StatusCode::NOT_FOUND, "Pet not found");
        }
        let mut message = String::new();
        if let Some(metadata) = &additional_metadata {
            message.push_str(&format!("additionalMetadata: {metadata}\n"));
        }
        match &file {
            Some(file) => message.push_str(&format!(
                "File uploaded to ./{}, {} bytes",
                file.file_name.as_deref().unwrap_or("upload"),
                file.data.len()
            )),
            None => message.push_str("No file uploaded"),
        }
        Json(ApiResponse {
            code: Some(200),
            kind: Some("unknown".to_string()),
            message: Some(message),
        })
        .into_response()
    }
}

#[async_trait]
impl StoreApiHandler for InMemoryPetstore {
    async fn delete_order(&self, order_id: String) -> Response {
        let Ok(id) = order_id.parse::<i64>() else {
            return status(StatusCode::BAD_REQUEST, "Invalid ID supplied");
        };
        match self.db.write().await.orders.remove(&id) {
            Some(_) => StatusCode::OK.into_response(),
            None => status(StatusCode::NOT_FOUND, "Order not found"),
        }
    }

    async fn get_inventory(&self) -> Response {
        let db = self.db.read().await;
        let mut inventory: HashMap<&'static str, i32> = HashMap::new();
        for status in db.pets.values().filter_map(|pet| pet.status) {
            *inventory.entry(status.as_str()).or_default() += 1;
        }
        Json(inventory).into_response()
    }

    async fn get_order_by_id(&self, order_id: i64) -> Response {
        match self.db.read().await.orders.get(&order_id) {
            Some(order) => Json(order.clone()).into_response(),
            None => status(StatusCode::NOT_FOUND, "Order not found"),
        }
    }

    async fn place_order(&self, mut order: Order) -> Response {
        if !order.is_set() {
            return status(StatusCode::BAD_REQUEST, "Invalid Order");
        }
        let mut db = self.db.write().await;
        let id = claim_id(&mut db.last_order_id, order.id);
        order.id = Some(id);
        db.orders.insert(id, order.clone());
        Json(order).into_response()
    }
}

impl InMemoryPetstore {
    /// Store all of `users` or none of them.
    async fn insert_users(&self, users: Vec<User>) -> Response {
        let mut keyed = Vec::with_capacity(users.len());
        for user in users {
            let Some(username) = user.username.clone() else {
                return status(StatusCode::BAD_REQUEST, "username is required");
            };
            keyed.push((username, user));
        }
        self.db.write().await.users.extend(keyed);
        StatusCode::OK.into_response()
    }
}

#[async_trait]
impl UserApiHandler for InMemoryPetstore {
    async fn create_user(&self, user: User) -> Response {
        self.insert_users(vec![user]).await
    }

    async fn create_users_with_array_input(&self, users: Vec<User>) -> Response {
        self.insert_users(users).await
    }

    async fn create_users_with_list_input(&self, users: Vec<User>) -> Response {
        self.insert_users(users).await
    }

    async fn delete_user(&self, username: String) -> Response {
        match self.db.write().await.users.remove(&username) {
            Some(_) => StatusCode::OK.into_response(),
            None => status(StatusCode::NOT_FOUND, "User not found"),
        }
    }

    async fn get_user_by_name(&self, username: String) -> Response {
        match self.db.read().await.users.get(&username) {
            Some(user) => Json(user.clone()).into_response(),
            None => status(StatusCode::NOT_FOUND, "User not found"),
        }
    }

    async fn login_user(&self, username: String, password: String) -> Response {
        let db = self.db.read().await;
        let authenticated = db
            .users
            .get(&username)
            .is_some_and(|user| user.password.as_deref() == Some(password.as_str()));
        if !authenticated {
            return status(StatusCode::BAD_REQUEST, "Invalid username/password supplied");
        }
        let session = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        Json(format!("logged in user session:{session}")).into_response()
    }

    async fn logout_user(&self) -> Response {
        StatusCode::OK.into_response()
    }

    async fn update_user(&self, username: String, user: User) -> Response {
        let mut db = self.db.write().await;
        if db.users.remove(&username).is_none() {
            return status(StatusCode::NOT_FOUND, "User not found");
        }
        let key = user.username.clone().unwrap_or(username);
        db.users.insert(key, user);
        StatusCode::OK.into_response()
    }
}
