//! AI-generated counterpart entity
//!
//! Title, explanation, date and copyright are copied from the source APOD
//! row at creation time; only `url` points at the generated image.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_apod")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning reference; the store does not cascade deletes
    pub nasa_apod_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub explanation: String,

    pub date: Date,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub copyright: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::apod::Entity",
        from = "Column::NasaApodId",
        to = "super::apod::Column::Id"
    )]
    Apod,
}

impl Related<super::apod::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
