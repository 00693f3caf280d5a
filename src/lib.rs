//! Synthetic data layer for the supply-chain-finance dashboard.
//!
//! Per-entity analytics are derived on demand from a small set of reference
//! templates, served through a request router that either answers from the
//! synthetic catalog or forwards to the real backend.
//!
//! # Modules
//!
//! - `api`: HTTP gateway surface.
//! - `core`: Derivation engine and shared models.
//! - `integrations`: Real transport and typed client.
//! - `analytics`: Per-module derivation for one (entity, time range).
//! - `assistant`: Keyword-scripted assistant replies.
//! - `chat`: Chat orchestration with a single in-flight turn.
//! - `client`: Typed dashboard API over the router.
//! - `config`: Configuration management.
//! - `data_management`: Upload, list and export fixtures.
//! - `debounce`: Quiet-period debouncing.
//! - `enterprise_dashboard`: Enterprise dashboard fixtures.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Envelope, request and chat models.
//! - `profiles`: Entity profile table.
//! - `report_models`: Analytics payload models.
//! - `resolution`: Template resolution chain.
//! - `router`: Mock-or-real request routing.
//! - `streaming`: Timed streaming reveal.
//! - `synthetic`: Catalog of synthetic providers.
//! - `templates`: Embedded template store.
//! - `transforms`: Scaling transforms.
//! - `transport`: HTTP transport to the real backend.

pub mod api;
pub mod core;
pub mod integrations;

pub mod analytics;
pub mod assistant;
pub mod chat;
pub mod client;
pub mod config;
pub mod data_management;
pub mod debounce;
pub mod enterprise_dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod profiles;
pub mod report_models;
pub mod resolution;
pub mod router;
pub mod streaming;
pub mod synthetic;
pub mod templates;
pub mod transforms;
pub mod transport;
