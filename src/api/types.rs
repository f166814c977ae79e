//! Wire types for the JTDC GraphQL API.
//!
//! The endpoint answers single operations with a nested `data.<operation>`
//! envelope and batched operations with an array of such envelopes. Fields
//! are optional throughout; the client maps missing ones to `InvalidResponse`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Single GraphQL operation in a request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: String,
    pub variables: serde_json::Value,
    pub query: String,
}

impl GraphQlRequest {
    pub fn new(operation_name: &str, variables: serde_json::Value, query: &str) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            variables,
            query: query.to_string(),
        }
    }
}

// ---- generateToken / signInByEmail ----

#[derive(Debug, Deserialize)]
pub struct GenerateTokenResponse {
    pub data: Option<GenerateTokenData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenData {
    pub generate_token: Option<TokenResult>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResult {
    pub result: Option<TokenPayload>,
}

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub data: Option<SignInData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInData {
    pub sign_in_by_email: Option<SignInResult>,
}

#[derive(Debug, Deserialize)]
pub struct SignInResult {
    pub result: Option<SignInPayload>,
}

#[derive(Debug, Deserialize)]
pub struct SignInPayload {
    pub auth: Option<TokenPayload>,
}

// ---- getAddressList ----

#[derive(Debug, Deserialize)]
pub struct AddressListResponse {
    pub data: Option<AddressListData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressListData {
    pub get_address_list: Option<AddressListResult>,
}

#[derive(Debug, Deserialize)]
pub struct AddressListResult {
    #[serde(default)]
    pub result: Vec<AddressEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AddressEntry {
    #[serde(rename = "addressID")]
    pub address_id: i64,
}

// ---- batched checkout ----

/// One envelope per batched operation in the checkout response.
#[derive(Debug, Deserialize)]
pub struct BatchEnvelope {
    #[serde(default)]
    pub data: HashMap<String, OperationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub meta: OperationMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct OperationMeta {
    #[serde(default)]
    pub code: String,
}

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no delivery address on the account")]
    NoAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let req = GraphQlRequest::new("generateToken", serde_json::json!({}), "query { x }");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["operationName"], "generateToken");
        assert_eq!(value["query"], "query { x }");
    }

    #[test]
    fn address_list_decodes_the_upstream_field_name() {
        let body = r#"{"data":{"getAddressList":{"result":[{"addressID":681613}]}}}"#;
        let res: AddressListResponse = serde_json::from_str(body).unwrap();
        let list = res.data.unwrap().get_address_list.unwrap().result;
        assert_eq!(list[0].address_id, 681_613);
    }

    #[test]
    fn batch_envelope_surfaces_non_success_codes() {
        let body = r#"[
            {"data":{"processCheckoutV2":{"meta":{"code":"success"}}}},
            {"data":{"addOrderV2":{"meta":{"code":"out_of_stock","message":"sold out"}}}}
        ]"#;
        let envelopes: Vec<BatchEnvelope> = serde_json::from_str(body).unwrap();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].data["processCheckoutV2"].meta.code, "success");
        assert_eq!(envelopes[1].data["addOrderV2"].meta.code, "out_of_stock");
    }

    #[test]
    fn missing_token_decodes_as_none() {
        let body = r#"{"data":{"generateToken":{"result":null}}}"#;
        let res: GenerateTokenResponse = serde_json::from_str(body).unwrap();
        assert!(res.data.unwrap().generate_token.unwrap().result.is_none());
    }
}
