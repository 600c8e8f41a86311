use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::models::Sock;

/// Sea-ORM Entity for the socks table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "socks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: Json, // JSONB array of strings
    pub price: f64,
    pub quantity: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json, // JSONB array of strings, GIN indexed
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Rows written by other tools may hold anything in the JSON columns
impl TryFrom<Model> for Sock {
    type Error = serde_json::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let tags = if model.tags.is_null() {
            Default::default()
        } else {
            serde_json::from_value(model.tags)?
        };
        let image_urls = if model.image_urls.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(model.image_urls)?
        };

        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_urls,
            price: model.price,
            quantity: model.quantity,
            tags,
        })
    }
}

impl From<&Sock> for ActiveModel {
    fn from(sock: &Sock) -> Self {
        ActiveModel {
            id: Set(sock.id.clone()),
            name: Set(sock.name.clone()),
            description: Set(sock.description.clone()),
            image_urls: Set(serde_json::json!(sock.image_urls)),
            price: Set(sock.price),
            quantity: Set(sock.quantity),
            tags: Set(serde_json::json!(sock.tags)),
        }
    }
}
