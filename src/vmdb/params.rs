//! Invocation parameters

use super::reference::ResourceReference;
use crate::manageiq::connection::ConnectionParams;
use crate::manageiq::error::VmdbError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A named action and the payload to send with it
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub name: String,
    pub payload: Value,
}

impl ActionRequest {
    /// An action with an empty payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Value::Object(Map::new()),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Request body for the action POST
    pub fn body(&self) -> Value {
        serde_json::json!({
            "action": self.name,
            "resource": self.payload,
        })
    }
}

/// Complete argument set of one invocation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleParams {
    pub manageiq_connection: ConnectionParams,
    /// Inline resource object, or a string reference
    #[serde(default)]
    pub vmdb: Option<ResourceReference>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ModuleParams {
    /// The referenced resource; exactly one of `vmdb` and `href` must be set
    pub fn reference(&self) -> Result<ResourceReference, VmdbError> {
        let href = self.href.as_deref().filter(|h| !h.is_empty());
        match (&self.vmdb, href) {
            (Some(vmdb), None) => Ok(vmdb.clone()),
            (None, Some(href)) => Ok(ResourceReference::from(href)),
            (Some(_), Some(_)) => Err(VmdbError::InvalidArguments(
                "parameters are mutually exclusive: vmdb|href".to_string(),
            )),
            (None, None) => Err(VmdbError::InvalidArguments(
                "one of the following is required: vmdb, href".to_string(),
            )),
        }
    }

    /// The action to invoke, if any. `data` is ignored without an action.
    pub fn action_request(&self) -> Option<ActionRequest> {
        let name = self.action.as_deref().filter(|a| !a.is_empty())?;
        let request = ActionRequest::new(name);
        Some(match &self.data {
            Some(data) if !data.is_null() => request.with_payload(data.clone()),
            _ => request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module_params(value: Value) -> ModuleParams {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_href_reference() {
        let params = module_params(json!({
            "manageiq_connection": {"url": "https://miq.example.com", "token": "tok"},
            "href": "vms::10"
        }));
        assert_eq!(params.reference().unwrap(), ResourceReference::from("vms::10"));
        assert!(params.action_request().is_none());
    }

    #[test]
    fn test_inline_vmdb_reference() {
        let params = module_params(json!({
            "manageiq_connection": {"url": "https://miq.example.com", "token": "tok"},
            "vmdb": {"href": "https://miq.example.com/api/vms/10"}
        }));
        assert!(matches!(
            params.reference().unwrap(),
            ResourceReference::Inline(_)
        ));
    }

    #[test]
    fn test_vmdb_and_href_are_exclusive() {
        let params = module_params(json!({
            "manageiq_connection": {"url": "https://miq.example.com", "token": "tok"},
            "vmdb": "vms::10",
            "href": "vms/10"
        }));
        let err = params.reference().unwrap_err();
        assert_eq!(err.to_string(), "parameters are mutually exclusive: vmdb|href");
    }

    #[test]
    fn test_reference_required() {
        let err = ModuleParams::default().reference().unwrap_err();
        assert_eq!(err.to_string(), "one of the following is required: vmdb, href");
    }

    #[test]
    fn test_action_request_body() {
        let params = module_params(json!({
            "manageiq_connection": {"url": "https://miq.example.com", "token": "tok"},
            "href": "vms/10",
            "action": "edit",
            "data": {"description": "web tier"}
        }));
        let request = params.action_request().unwrap();
        assert_eq!(
            request.body(),
            json!({"action": "edit", "resource": {"description": "web tier"}})
        );
    }

    #[test]
    fn test_action_without_data_sends_empty_resource() {
        let request = ActionRequest::new("start");
        assert_eq!(request.body(), json!({"action": "start", "resource": {}}));
    }
}
