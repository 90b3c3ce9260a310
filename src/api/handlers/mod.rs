//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod automations;
pub mod emails;
pub mod events;
pub mod health;
