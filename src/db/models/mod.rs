//! SeaORM entities for the paired tables

pub mod ai_apod;
pub mod apod;

pub use ai_apod::{
    ActiveModel as AiApodActiveModel, Column as AiApodColumn, Entity as AiApodEntity,
    Model as AiApod,
};
pub use apod::{
    ActiveModel as ApodActiveModel, Column as ApodColumn, Entity as ApodEntity, Model as Apod,
};
