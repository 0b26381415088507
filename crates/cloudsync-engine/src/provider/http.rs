//! HTTP provider gateway client
//!
//! Posts list calls as JSON to a gateway that fronts the cloud provider:
//!
//! ```json
//! {"service": "ec2", "action": "DescribeNatGateways",
//!  "account_id": "123456789012", "region": "us-east-1",
//!  "input": {"MaxResults": 100, "NextToken": "..."}}
//! ```
//!
//! The gateway answers with the provider's response document; items and the
//! cursor are read from the fields named by the [`ListOperation`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{ListOutput, ListProvider};
use crate::descriptor::ListOperation;
use crate::error::ProviderError;
use crate::partition::PartitionKey;

/// Default request timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Response bodies longer than this are truncated in error messages.
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl HttpProviderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

#[derive(Serialize)]
struct ListCall<'a> {
    service: &'a str,
    action: &'a str,
    account_id: &'a str,
    region: &'a str,
    input: &'a serde_json::Value,
}

/// [`ListProvider`] backed by a JSON-over-HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpListProvider {
    client: Client,
    endpoint: String,
}

impl HttpListProvider {
    pub fn new(config: &HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ListProvider for HttpListProvider {
    async fn list(
        &self,
        operation: &ListOperation,
        partition: &PartitionKey,
        params: &serde_json::Value,
    ) -> Result<ListOutput, ProviderError> {
        let call = ListCall {
            service: operation.service,
            action: operation.action,
            account_id: &partition.account_id,
            region: &partition.region,
            input: params,
        };

        tracing::debug!(
            service = operation.service,
            action = operation.action,
            partition = %partition,
            "Calling provider"
        );

        let response = self.client.post(&self.endpoint).json(&call).send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: serde_json::Value = response.json().await?;
        parse_list_output(operation, document)
    }
}

/// Pull items and cursor out of a provider response document
pub fn parse_list_output(
    operation: &ListOperation,
    mut document: serde_json::Value,
) -> Result<ListOutput, ProviderError> {
    let object = document.as_object_mut().ok_or_else(|| {
        ProviderError::InvalidResponse(format!("{} response is not an object", operation.action))
    })?;

    let items = match object.remove(operation.items_field) {
        Some(serde_json::Value::Array(items)) => items,
        // Some list calls omit the field entirely on an empty page
        Some(serde_json::Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(ProviderError::InvalidResponse(format!(
                "{}.{} is not an array (got {})",
                operation.action,
                operation.items_field,
                type_name(&other)
            )))
        }
    };

    let next_cursor = match object.remove(operation.cursor_field) {
        Some(serde_json::Value::String(cursor)) if !cursor.is_empty() => Some(cursor),
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => None,
        Some(other) => {
            return Err(ProviderError::InvalidResponse(format!(
                "{}.{} is not a string (got {})",
                operation.action,
                operation.cursor_field,
                type_name(&other)
            )))
        }
    };

    Ok(ListOutput { items, next_cursor })
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const OP: ListOperation = ListOperation {
        service: "ec2",
        action: "DescribeNatGateways",
        items_field: "NatGateways",
        cursor_field: "NextToken",
    };

    #[test]
    fn test_parse_page_with_cursor() {
        let output = parse_list_output(
            &OP,
            json!({"NatGateways": [{"NatGatewayId": "nat-1"}], "NextToken": "B"}),
        )
        .unwrap();
        assert_eq!(output.items.len(), 1);
        assert_eq!(output.next_cursor.as_deref(), Some("B"));
    }

    #[test]
    fn test_empty_cursor_means_done() {
        let output = parse_list_output(&OP, json!({"NatGateways": [], "NextToken": ""})).unwrap();
        assert!(output.items.is_empty());
        assert!(output.next_cursor.is_none());
    }

    #[test]
    fn test_missing_items_field_is_empty_page() {
        let output = parse_list_output(&OP, json!({})).unwrap();
        assert_eq!(output, ListOutput::default());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(matches!(
            parse_list_output(&OP, json!([1, 2])),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_list_output(&OP, json!({"NatGateways": {"a": 1}})),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_list_output(&OP, json!({"NatGateways": [], "NextToken": 5})),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
