//! Thin request/response adapters for the two upstream providers
//!
//! Both validate and normalize at the boundary so the pipeline only ever
//! handles typed records, never loose JSON.

pub mod apod;
pub mod synthesis;

pub use apod::{ApodProvider, ApodQuery, NasaApodClient};
pub use synthesis::{ApodMetadata, DalleClient, ImageSynthesizer};
