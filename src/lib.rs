//! EV Charger Quote API Library
//!
//! Scoring and CRM relay for the EV charger installation quiz: the answer
//! model, the step-by-step answer collector, the score/estimate calculator,
//! quote formatting, lead validation and the GoHighLevel client, plus the
//! HTTP handlers that expose them.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `circuit_breaker`: Circuit breaker for GoHighLevel calls.
//! - `collector`: Quiz answer collector.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `ghl_client`: GoHighLevel API client.
//! - `ghl_handler`: GoHighLevel proxy handlers.
//! - `ghl_models`: GoHighLevel data models.
//! - `handlers`: Quiz HTTP handlers and shared state.
//! - `lead_handler`: Lead submission handler.
//! - `leads`: Lead validation and CRM payloads.
//! - `models`: Quiz answers and lead info.
//! - `quote`: Quote formatting and HTML report.
//! - `routes`: Router assembly.
//! - `scoring`: Score, tier and cost estimate.

pub mod api;
pub mod core;
pub mod integrations;

pub mod circuit_breaker;
pub mod collector;
pub mod config;
pub mod errors;
pub mod ghl_client;
pub mod ghl_handler;
pub mod ghl_models;
pub mod handlers;
pub mod lead_handler;
pub mod leads;
pub mod models;
pub mod quote;
pub mod routes;
pub mod scoring;
