//! GET/POST variable filters gating whether an app runs at all.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{trace, warn};

use antengine_core::types::RequestInfo;

/// Expected values for request variables.
///
/// With no filters the app is always eligible. Otherwise a single matching
/// entry, GET or POST, is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// GET variable → expected value.
    get_filters: BTreeMap<String, String>,
    /// POST variable → expected value.
    post_filters: BTreeMap<String, String>,
}

impl RequestFilter {
    /// Creates an unrestricted filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both filter maps.
    pub fn configure(
        &mut self,
        get_vars: BTreeMap<String, String>,
        post_vars: BTreeMap<String, String>,
    ) {
        self.get_filters = get_vars;
        self.post_filters = post_vars;
    }

    /// Replaces the filters from an app options document.
    ///
    /// Reads `requestFilter` (an object, or an array whose first element is
    /// used) and its `GET` / `POST` objects. Non-string expected values are
    /// compared through their JSON text.
    pub fn configure_from_options(&mut self, options: &Value) {
        self.get_filters.clear();
        self.post_filters.clear();

        let filters = match options.get("requestFilter") {
            Some(Value::Array(items)) => items.first(),
            Some(object @ Value::Object(_)) => Some(object),
            Some(other) => {
                warn!(value = %other, "requestFilter must be an object or array, ignoring");
                None
            }
            None => None,
        };

        let Some(filters) = filters else {
            return;
        };

        self.get_filters = expected_values(filters.get("GET"));
        self.post_filters = expected_values(filters.get("POST"));
    }

    /// Whether a request carrying these variables may run the app.
    pub fn permits(&self, request: &RequestInfo) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        // A filter whose variable is absent only fails for that entry.
        let post_match = self.post_filters.iter().any(|(var, expected)| {
            request.post_vars.get(var).is_some_and(|actual| {
                trace!(var = %var, actual = %actual, expected = %expected, "POST filter");
                actual == expected
            })
        });

        post_match
            || self.get_filters.iter().any(|(var, expected)| {
                request.get_vars.get(var).is_some_and(|actual| {
                    trace!(var = %var, actual = %actual, expected = %expected, "GET filter");
                    actual == expected
                })
            })
    }

    /// Whether no filter is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.get_filters.is_empty() && self.post_filters.is_empty()
    }

    /// Configured GET filters.
    pub fn get_filters(&self) -> &BTreeMap<String, String> {
        &self.get_filters
    }

    /// Configured POST filters.
    pub fn post_filters(&self) -> &BTreeMap<String, String> {
        &self.post_filters
    }
}

fn expected_values(section: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(vars)) = section else {
        return BTreeMap::new();
    };

    vars.iter()
        .map(|(var, value)| {
            let expected = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (var.clone(), expected)
        })
        .collect()
}
