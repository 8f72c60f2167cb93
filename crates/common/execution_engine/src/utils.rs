use anyhow::bail;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn strip_prefix(string: &str) -> &str {
    if let Some(stripped) = string.strip_prefix("0x") {
        stripped
    } else {
        string
    }
}

#[derive(Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub id: i32,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<serde_json::Value>,
}

// Define a wrapper struct to extract "result" without cloning
#[derive(Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse<T> {
    Result { result: T },
    Error(Value),
}

impl<T> JsonRpcResponse<T> {
    pub fn to_result(self) -> anyhow::Result<T> {
        match self {
            JsonRpcResponse::Result { result } => Ok(result),
            JsonRpcResponse::Error(err) => bail!("Engine API returned an error: {err}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// issued-at claim. Represented as seconds passed since UNIX_EPOCH.
    pub iat: u64,
    /// Optional unique identifier for the CL node.
    pub id: Option<String>,
    /// Optional client version for the CL node.
    pub clv: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_types::payload_status::{PayloadStatus, PayloadStatusV1};

    #[test]
    fn test_json_rpc_error_response() {
        let response: JsonRpcResponse<PayloadStatusV1> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#,
        )
        .unwrap();
        let err = response.to_result().unwrap_err();
        assert!(err.to_string().contains("Invalid params"));
    }

    #[test]
    fn test_json_rpc_result_response() {
        let response: JsonRpcResponse<PayloadStatusV1> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":{"status":"VALID","latestValidHash":null,"validationError":null}}"#,
        )
        .unwrap();
        assert_eq!(response.to_result().unwrap().status, PayloadStatus::Valid);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("0xabcd"), "abcd");
        assert_eq!(strip_prefix("abcd"), "abcd");
    }
}
