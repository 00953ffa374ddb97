//! Shared error plumbing and endpoint templating used by the wxmedia crates.

pub mod error;
pub mod url_template;

pub use {
    error::FromMessage,
    url_template::{TemplateError, expand},
};
