//! Petstore data-transfer objects.
//!
//! # Design
//! Every field is optional and maps through `model::lenient`, so one
//! malformed field never costs the rest of the record. JSON names follow the
//! API's camelCase convention. Unset fields are not serialized.

use serde::{Deserialize, Serialize};

use crate::model::Model;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Model for Category {
    fn is_set(&self) -> bool {
        self.id.is_some() || self.name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Model for Tag {
    fn is_set(&self) -> bool {
        self.id.is_some() || self.name.is_some()
    }
}

/// Pet status in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(PetStatus::Available),
            "pending" => Some(PetStatus::Pending),
            "sold" => Some(PetStatus::Sold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub photo_urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl Model for Pet {
    fn is_set(&self) -> bool {
        self.id.is_some()
            || self.category.as_ref().is_some_and(Model::is_set)
            || self.name.is_some()
            || self.photo_urls.as_ref().is_some_and(|urls| !urls.is_empty())
            || self.tags.as_ref().is_some_and(|tags| !tags.is_empty())
            || self.status.is_some()
    }
}

/// Order status in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Approved,
    Delivered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    /// RFC 3339 timestamp, kept as sent.
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

impl Model for Order {
    fn is_set(&self) -> bool {
        self.id.is_some()
            || self.pet_id.is_some()
            || self.quantity.is_some()
            || self.ship_date.is_some()
            || self.status.is_some()
            || self.complete.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// User status
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub user_status: Option<i32>,
}

impl Model for User {
    fn is_set(&self) -> bool {
        self.id.is_some()
            || self.username.is_some()
            || self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.password.is_some()
            || self.phone.is_some()
            || self.user_status.is_some()
    }
}

/// Describes the result of uploading an image resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(rename = "type", default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "crate::model::lenient::deserialize", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Model for ApiResponse {
    fn is_set(&self) -> bool {
        self.code.is_some() || self.kind.is_some() || self.message.is_some()
    }
}
