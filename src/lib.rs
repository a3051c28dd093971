//! Select Therapy Lead Intake & Tracking API Library
//!
//! Core functionality for the lead intake and tracking service: the webhook
//! intake validation pipeline, the tri-state partial-update contract for the
//! staff dashboard, and the shared status workflow model.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types, one variant per failure category.
//! - `handlers`: Dashboard HTTP handlers (list, board, update).
//! - `intake`: Webhook intake validation pipeline.
//! - `models`: Lead, status workflow, and patch contracts.
//! - `store`: Database storage operations.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod store;
