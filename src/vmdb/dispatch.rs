//! VMDB dispatch
//!
//! Reads a resource, or validates and invokes an action on it. At most two
//! sequential requests per call: the action list GET and the action POST.

use super::params::{ActionRequest, ModuleParams};
use super::reference::ResourceReference;
use crate::manageiq::connection::ConnectionParams;
use crate::manageiq::error::VmdbError;
use crate::manageiq::http::{MiqHttpClient, Transport};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// Result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { changed: bool, value: Value },
    Failure { msg: String },
}

impl Outcome {
    pub fn failure(msg: impl Into<String>) -> Self {
        Outcome::Failure { msg: msg.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Serialized the way automation hosts expect: `{"changed", "value"}` or
/// `{"failed": true, "msg"}`
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Success { changed, value } => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("changed", changed)?;
                state.serialize_field("value", value)?;
                state.end()
            }
            Outcome::Failure { msg } => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("failed", &true)?;
                state.serialize_field("msg", msg)?;
                state.end()
            }
        }
    }
}

impl From<Result<Outcome, VmdbError>> for Outcome {
    fn from(result: Result<Outcome, VmdbError>) -> Self {
        result.unwrap_or_else(|e| Outcome::failure(e.to_string()))
    }
}

/// Check the resource at `path` lists an action called `name`.
///
/// A response without an `actions` array is malformed, not a `false`.
pub async fn action_exists<T: Transport>(
    transport: &T,
    path: &str,
    name: &str,
) -> Result<bool, VmdbError> {
    let resource = transport.get(path).await?;
    let actions = resource
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| VmdbError::malformed(format!("{path} has no 'actions' list")))?;

    for action in actions {
        let action_name = action.get("name").and_then(Value::as_str).ok_or_else(|| {
            VmdbError::malformed(format!("action entry without a name at {path}"))
        })?;
        if action_name == name {
            return Ok(true);
        }
    }

    Ok(false)
}

/// VMDB operations over a transport rooted at an API URL
pub struct Vmdb<T> {
    transport: T,
    api_url: String,
}

impl Vmdb<MiqHttpClient> {
    /// Validate connection parameters and open an HTTP transport.
    pub fn connect(params: ConnectionParams) -> Result<Self, VmdbError> {
        let connection = params.resolve()?;
        let transport = MiqHttpClient::new(&connection)?;
        Ok(Self::with_transport(transport, connection.api_url()))
    }
}

impl<T: Transport> Vmdb<T> {
    pub fn with_transport(transport: T, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the referenced resource as-is
    pub async fn get_object(&self, reference: &ResourceReference) -> Result<Value, VmdbError> {
        let path = reference.resolve(&self.api_url)?;
        tracing::info!(path = %path, collection = ?reference.collection_hint(), "fetching resource");
        self.transport.get(&path).await
    }

    /// Invoke `action` on the referenced resource once it is known to be legal
    pub async fn action(
        &self,
        reference: &ResourceReference,
        action: &ActionRequest,
    ) -> Result<Value, VmdbError> {
        let path = reference.resolve(&self.api_url)?;
        tracing::info!(path = %path, action = %action.name, "invoking action");

        if !action_exists(&self.transport, &path, &action.name).await? {
            tracing::warn!("action {} not offered by {}", action.name, path);
            return Err(VmdbError::ActionNotFound {
                action: action.name.clone(),
            });
        }

        let response = self.transport.post(&path, &action.body()).await?;
        match response.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(response),
            Some(false) => {
                let message = response
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("action rejected by the API");
                Err(VmdbError::ActionRejected(message.to_string()))
            }
            None => Err(VmdbError::malformed(format!(
                "action response from {path} has no 'success' flag"
            ))),
        }
    }

    /// Read without an action, otherwise validate and invoke it
    pub async fn handle(
        &self,
        reference: &ResourceReference,
        action: Option<&ActionRequest>,
    ) -> Outcome {
        let result = match action {
            None => self
                .get_object(reference)
                .await
                .map(|value| Outcome::Success {
                    changed: false,
                    value,
                }),
            Some(action) => self
                .action(reference, action)
                .await
                .map(|value| Outcome::Success {
                    changed: true,
                    value,
                }),
        };

        if let Err(e) = &result {
            tracing::error!("vmdb request failed: {}", e);
        }
        result.into()
    }
}

/// Run a full invocation against the live API.
///
/// Connection problems are reported before any request is made.
pub async fn run(params: ModuleParams) -> Outcome {
    let reference = match params.reference() {
        Ok(reference) => reference,
        Err(e) => return Outcome::failure(e.to_string()),
    };
    let action = params.action_request();

    match Vmdb::connect(params.manageiq_connection) {
        Ok(vmdb) => vmdb.handle(&reference, action.as_ref()).await,
        Err(e) => Outcome::failure(e.to_string()),
    }
}

/// Run an invocation over a given transport, skipping connection setup.
pub async fn run_with<T: Transport>(
    transport: T,
    api_url: &str,
    params: &ModuleParams,
) -> Outcome {
    let reference = match params.reference() {
        Ok(reference) => reference,
        Err(e) => return Outcome::failure(e.to_string()),
    };
    let action = params.action_request();

    Vmdb::with_transport(transport, api_url)
        .handle(&reference, action.as_ref())
        .await
}
