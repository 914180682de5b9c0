//! Library crate for cerdas-cermat-back, the scoreboard engine behind a quiz competition console.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
