//! Tatami Labs API - Backend for the Tatami Labs platform
//!
//! This crate provides the REST API for Tatami Labs, covering:
//! - Master profiles and user-expressed interests
//! - Referral link registration, click tracking, and earnings aggregation
//! - Magic-link and Google OAuth sign-in with role/permission authorization
//! - CMS content with an audited admin surface

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
