//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, query and session calls into use-case level APIs.
//! - Keep consuming layers decoupled from storage details.

pub mod recipe_service;
