//! NASA APOD entity (the real picture of the day)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nasa_apod")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unique together with `date`: the constraints back the dedup check
    /// when two creators race past it
    #[sea_orm(column_type = "Text", unique)]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub explanation: String,

    /// Calendar date of the APOD, its natural external identity
    #[sea_orm(unique)]
    pub date: Date,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub copyright: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ai_apod::Entity")]
    AiImages,
}

impl Related<super::ai_apod::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AiImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
