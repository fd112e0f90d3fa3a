//! Solar Savings API Library
//!
//! This library provides the core functionality for the solar savings
//! estimator: provider clients (geocoding, roof solar potential, text
//! generation) with proxy fallback, the deterministic estimator, the report
//! pipeline, the in-memory lead marketplace and the HTTP handlers.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `circuit_breaker`: Proxy-tier circuit breaker.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `estimator`: System sizing and savings math.
//! - `geocoding`: Address resolution client with synthetic fallback.
//! - `handlers`: HTTP request handlers and router.
//! - `leads`: Lead contact validation and masking.
//! - `llm`: Text-generation provider client.
//! - `models`: Core data models.
//! - `narrative`: Report summaries with template fallback.
//! - `pipeline`: Address + bill → report orchestration.
//! - `proxy`: Provider proxy endpoints.
//! - `services`: Shared provider plumbing.
//! - `solar`: Roof solar potential client and schema.
//! - `store`: Reports, leads and installer accounts.
//! - `tariff`: Per-state electricity tariffs.

pub mod api;
pub mod core;
pub mod integrations;

pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod geocoding;
pub mod handlers;
pub mod leads;
pub mod llm;
pub mod models;
pub mod narrative;
pub mod pipeline;
pub mod proxy;
pub mod services;
pub mod solar;
pub mod store;
pub mod tariff;
