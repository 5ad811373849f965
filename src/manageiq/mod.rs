//! ManageIQ API connection module
//!
//! Everything needed to talk to the REST API: validated connection
//! parameters, the authenticated HTTP transport, and the error taxonomy.
//!
//! # Module Structure
//!
//! - [`connection`] - Connection parameter validation and auth selection
//! - [`http`] - Authenticated GET/POST transport
//! - [`error`] - Error types shared by the whole crate
//!
//! # Example
//!
//! ```ignore
//! use miq_vmdb::manageiq::{connection::ConnectionParams, http::{MiqHttpClient, Transport}};
//!
//! async fn example(params: ConnectionParams) -> Result<(), miq_vmdb::VmdbError> {
//!     let connection = params.resolve()?;
//!     let client = MiqHttpClient::new(&connection)?;
//!     let vm = client.get(&format!("{}/vms/10", connection.api_url())).await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod http;
