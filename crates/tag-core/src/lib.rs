//! Core types, the store trait, and the game components for the tag service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; backends implement [`store::GameStore`].

pub mod clock;
pub mod directory;
pub mod engine;
pub mod error;
pub mod game;
pub mod membership;
pub mod pin;
pub mod player;
pub mod roster;
pub mod store;
pub mod timing;
pub mod transition;
pub mod user;
pub mod window;

pub use error::{Error, Result};
