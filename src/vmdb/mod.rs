//! VMDB resource handling
//!
//! # Architecture
//!
//! - [`reference`] - Resolves a resource reference to a request URL
//! - [`params`] - Invocation arguments (resource, action, payload)
//! - [`dispatch`] - Action validation and the read/action dispatcher

pub mod dispatch;
pub mod params;
pub mod reference;

pub use dispatch::{action_exists, run, run_with, Outcome, Vmdb};
pub use params::{ActionRequest, ModuleParams};
pub use reference::ResourceReference;
