//! Outbound REST client for the Relay gateway cache.
//!
//! Bot code that consumes cached gateway state usually needs to answer on
//! the same platform. [`RestClient::create_message`] posts a message (text,
//! embed, file, or any combination) to a channel and returns the created
//! message object.
//!
//! # Modules
//!
//! - [`client`] -- Endpoint configuration and requests
//! - [`message`] -- Message content and file attachments
//! - [`error`] -- Request and API errors

pub mod client;
pub mod error;
pub mod message;

pub use client::{DEFAULT_ENDPOINT, RestClient, RestConfig};
pub use error::RestError;
pub use message::{DEFAULT_FILENAME, FileAttachment, MessageContent, sanitize_filename};
