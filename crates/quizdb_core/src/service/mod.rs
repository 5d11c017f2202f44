//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Supply factory defaults (timestamps, flags, derived totals) so callers
//!   never depend on ambient state.

pub mod account_service;
pub mod game_service;
