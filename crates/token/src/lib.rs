//! Access-token providers for the platform API.
//!
//! The media client only needs "the current token"; how it is obtained and
//! refreshed lives behind [`TokenProvider`].

pub mod client_credential;
pub mod error;
pub mod provider;

pub use {
    client_credential::ClientCredentialTokenProvider,
    error::{Error, Result},
    provider::{StaticTokenProvider, TokenProvider},
};
