//! Customer Accounts service library.
//!
//! This crate provides the HTTP API and the loan limit event consumer as a
//! library, so the binary, the CLI and the tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod consumer;
pub mod db;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
