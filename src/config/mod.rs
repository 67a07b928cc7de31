//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Process settings (once, at startup):
//!     config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! Transport settings (per request):
//!     Awesometlsconfig header (JSON)
//!     → transport.rs (TransportConfig::parse)
//!     → owned by the request task, dropped with it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All file fields have defaults to allow minimal configs
//! - Header parsing is pure; timeout defaults are applied by the client factory

pub mod loader;
pub mod schema;
pub mod transport;
pub mod validation;

pub use schema::ServerConfig;
pub use schema::{AuthorityConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig, DEFAULT_ADDRESS};
pub use transport::{ConfigError, Scheme, TransportConfig};
