//! Role-gated hospital records service.
//!
//! Staff register with a role, log in, and then read or edit departments,
//! diseases, medications, employees and patients as the permission table in
//! [`access`] allows.

pub mod access;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
