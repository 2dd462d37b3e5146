//! restform
//!
//! Declarative CRUD engine for REST control-plane resources. A resource is
//! described by a [`handler::ContextHandler`]; the handler turns into
//! [`engine::Flow`]s (or callbacks) that move a [`engine::Record`] between
//! local state and the control plane through a [`engine::Transport`].
//!
//! # Module Structure
//!
//! - [`engine`] - records, steps, flows, URL factories, error handlers
//! - [`handler`] - the REST, HTTP and generic-callback conventions
//! - [`resources`] - concrete resource definitions and the kind registry
//! - [`client`] - reqwest-backed transport and credentials
//! - [`config`] - persistent CLI configuration
//! - [`state`] - JSON/YAML state documents

pub mod client;
pub mod config;
pub mod engine;
pub mod handler;
pub mod resources;
pub mod state;
