//! Fetch ManageIQ VMDB resources and invoke actions on them.
//!
//! An invocation either reads a resource (one GET) or checks that an action
//! is offered by the resource and then invokes it (one GET, one POST).
//!
//! ```ignore
//! use miq_vmdb::{run, ModuleParams};
//!
//! let params: ModuleParams = serde_json::from_str(r#"{
//!     "manageiq_connection": {"url": "https://miq.example.com", "token": "..."},
//!     "href": "vms::10",
//!     "action": "start"
//! }"#)?;
//! let outcome = run(params).await;
//! ```

pub mod manageiq;
pub mod vmdb;

pub use manageiq::connection::{Auth, Connection, ConnectionParams, TlsOptions};
pub use manageiq::error::{TransportError, VmdbError};
pub use manageiq::http::{MiqHttpClient, Transport};
pub use vmdb::{
    action_exists, run, run_with, ActionRequest, ModuleParams, Outcome, ResourceReference, Vmdb,
};
