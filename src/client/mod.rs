//! Control-plane API client
//!
//! # Module Structure
//!
//! - [`auth`] - bearer token resolution
//! - [`http`] - request execution, error-body parsing and log sanitization
//! - [`transport`] - the reqwest-backed [`Transport`](crate::engine::Transport)
//!
//! # Example
//!
//! ```ignore
//! use restform::client::{Credentials, HttpTransport, DEFAULT_TIMEOUT};
//!
//! fn example() -> anyhow::Result<()> {
//!     let creds = Credentials::resolve(None, None)?;
//!     let transport = HttpTransport::new("https://cp.example.com", creds, DEFAULT_TIMEOUT)?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod http;
pub mod transport;

pub use auth::Credentials;
pub use transport::{HttpTransport, DEFAULT_TIMEOUT};
pub use http::format_api_error;
