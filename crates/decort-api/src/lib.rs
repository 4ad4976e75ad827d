// decort-api: async client for the DECORT platform control API

pub mod auth;
pub mod client;
pub mod error;
pub mod params;
pub mod scope;
pub mod transport;

pub use auth::{Authenticator, Credentials, TokenSource};
pub use client::{ClientConfig, DecortClient, parse_bool, parse_id};
pub use error::Error;
pub use params::FormParams;
pub use scope::Scope;
pub use transport::{TlsMode, TransportConfig};

pub use reqwest::Method;
