//! Shared configuration and domain models

pub mod config;
pub mod models;
