//! HTTP transport for OpenAI-compatible endpoints.

pub mod credentials;
pub mod http;

pub use credentials::CredentialResolver;
pub use http::HttpInvoker;
