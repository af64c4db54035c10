//! NASA-or-Not: pair acquisition pipeline for the daily guessing game
//!
//! Pairs NASA's Astronomy Picture of the Day with an AI-generated
//! counterpart rendered from the same description, persists both rows as
//! one atomic unit, and serves the pair over HTTP. Presentation (image
//! shuffling, scoring, admin tables) lives with the callers.

pub mod config;
pub mod db;
pub mod errors;
pub mod providers;
pub mod routes;
pub mod services;
