//! In-memory API for tests: scripted responses and a call log.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use super::{Api, ApiError, Method};

/// A recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

/// Answers requests from a table keyed by method and endpoint.
///
/// Unscripted requests fail with HTTP 404.
#[derive(Debug, Default)]
pub struct FakeApi {
    responses: HashMap<(Method, String), Result<Value, u16>>,
    calls: RefCell<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method endpoint` with `body`.
    pub fn on(mut self, method: Method, endpoint: &str, body: Value) -> Self {
        self.responses
            .insert((method, endpoint.to_string()), Ok(body));
        self
    }

    /// Answer `method endpoint` with an HTTP error status.
    pub fn fail(mut self, method: Method, endpoint: &str, status: u16) -> Self {
        self.responses
            .insert((method, endpoint.to_string()), Err(status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// The body sent with the first `method endpoint` call.
    pub fn body_of(&self, method: Method, endpoint: &str) -> Option<Value> {
        self.calls
            .borrow()
            .iter()
            .find(|c| c.method == method && c.endpoint == endpoint)
            .and_then(|c| c.body.clone())
    }

    pub fn was_called(&self, method: Method, endpoint: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c.method == method && c.endpoint == endpoint)
    }
}

impl Api for FakeApi {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.calls.borrow_mut().push(Call {
            method,
            endpoint: endpoint.to_string(),
            body: body.cloned(),
        });

        let status = match self.responses.get(&(method, endpoint.to_string())) {
            Some(Ok(value)) => return Ok(value.clone()),
            Some(Err(status)) => *status,
            None => 404,
        };

        Err(ApiError::Status {
            method: method.as_str(),
            endpoint: endpoint.to_string(),
            status,
            message: format!("scripted failure (HTTP {status})"),
        })
    }
}
