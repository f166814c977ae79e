//! JTDC storefront API client.
//!
//! Thin GraphQL client used by the scheduled jobs: two-step email login,
//! address lookup, and the batched seven-operation checkout submission.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use super::types::*;

/// External storefront operations the scheduled jobs depend on.
///
/// Behind a trait so job tests can substitute deterministic stubs.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// Authenticate `email` and return a session token.
    async fn login(&self, email: &str) -> Result<String, ApiError>;

    /// Resolve the account's delivery address id.
    async fn address_id(&self, token: &str) -> Result<i64, ApiError>;

    /// Submit one checkout. `Ok(false)` is a rejected attempt (window not
    /// open yet, stock gone, any non-success operation in the batch).
    async fn checkout(&self, address_id: i64, token: &str) -> Result<bool, ApiError>;
}

const GENERATE_TOKEN_QUERY: &str = "query generateToken {
    generateToken {
        __typename
        meta { __typename message error code }
        result { token }
    }
}";

const SIGN_IN_QUERY: &str = "mutation signInByEmail($input: signInByEmailReq!) {
    signInByEmail(input: $input) {
        result { auth { token } }
    }
}";

const ADDRESS_LIST_QUERY: &str = "query getAddressList($size: Int, $page: Int, $keyword: String) {
    getAddressList(size: $size, page: $page, keyword: $keyword) {
        result { addressID }
    }
}";

/// Build the seven-operation batch the storefront expects for one checkout
/// submission: validate, pin shipping and payment, apply points, refresh the
/// summary and SKU list, then place the order.
fn checkout_batch(address_id: i64) -> Vec<GraphQlRequest> {
    vec![
        GraphQlRequest::new(
            "processCheckoutV2",
            json!({}),
            "query processCheckoutV2 {
                processCheckoutV2 {
                    meta { message error code }
                    result { isContinueProcessCheckout isGoToNewCheckout isAddressAvailable }
                }
            }",
        ),
        GraphQlRequest::new(
            "updateSummaryShipping",
            json!({ "request": { "addressID": address_id, "shippingID": 4 } }),
            "mutation updateSummaryShipping($request: UpdateSummaryShippingRequest!) {
                updateSummaryShipping(request: $request) {
                    meta { message error code }
                    result { status }
                }
            }",
        ),
        GraphQlRequest::new(
            "updateSummaryPayment",
            json!({
                "request": {
                    "paymentID": 57,
                    "paymentCode": "VABCA",
                    "paymentParentCode": "VirtualAccount",
                    "paymentName": "Virtual Account",
                    "paymentChildName": "BCA Virtual Account",
                    "minimumAmount": 10000,
                }
            }),
            "mutation updateSummaryPayment($request: UpdateSummaryPaymentRequest!) {
                updateSummaryPayment(request: $request) {
                    meta { message error code }
                    result { status }
                }
            }",
        ),
        GraphQlRequest::new(
            "updateSummaryJTPoint",
            json!({ "request": { "isJTPoint": true } }),
            "mutation updateSummaryJTPoint($request: UpdateSummaryJTPointRequest!) {
                updateSummaryJTPoint(request: $request) {
                    meta { message error code }
                    result { status }
                }
            }",
        ),
        GraphQlRequest::new(
            "getSummaryCheckoutV2",
            json!({ "request": { "isChanges": true } }),
            "query getSummaryCheckoutV2($request: SummaryCheckoutV2Request!) {
                getSummaryCheckoutV2(request: $request) {
                    meta { message error code }
                    result { total subTotal quantity }
                }
            }",
        ),
        GraphQlRequest::new(
            "getCheckoutSKUList",
            json!({ "request": { "isValidate": false } }),
            "query getCheckoutSKUList($request: CheckoutSKUListRequest) {
                getCheckoutSKUList(request: $request) {
                    meta { message error code }
                    result { items { productID productSKU productFinalPrice } }
                }
            }",
        ),
        GraphQlRequest::new(
            "addOrderV2",
            json!({ "request": {} }),
            "mutation addOrderV2($request: addOrderV2Request) {
                addOrderV2(request: $request) {
                    meta { message error code }
                    result { status payment { status orderId redirectUrl } }
                }
            }",
        ),
    ]
}

/// GraphQL client for the JTDC storefront.
pub struct StoreClient {
    client: Client,
    api_url: String,
    password: String,
}

impl StoreClient {
    pub fn new(api_url: &str, password: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            password: password.to_string(),
        })
    }
}

#[async_trait]
impl StoreApi for StoreClient {
    async fn login(&self, email: &str) -> Result<String, ApiError> {
        info!(email, "logging in");

        // Step 1: anonymous guest token
        let request = GraphQlRequest::new("generateToken", json!({}), GENERATE_TOKEN_QUERY);
        let response = self
            .client
            .post(&self.api_url)
            .header("x-action", "generate_token")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .json::<GenerateTokenResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let guest_token = response
            .data
            .and_then(|d| d.generate_token)
            .and_then(|t| t.result)
            .and_then(|r| r.token)
            .ok_or_else(|| ApiError::InvalidResponse("generateToken returned no token".into()))?;

        // Step 2: sign in with the guest token as bearer
        let request = GraphQlRequest::new(
            "signInByEmail",
            json!({ "input": { "email": email, "password": self.password } }),
            SIGN_IN_QUERY,
        );
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&guest_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .json::<SignInResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        response
            .data
            .and_then(|d| d.sign_in_by_email)
            .and_then(|s| s.result)
            .and_then(|r| r.auth)
            .and_then(|a| a.token)
            .ok_or_else(|| ApiError::InvalidResponse("signInByEmail returned no token".into()))
    }

    async fn address_id(&self, token: &str) -> Result<i64, ApiError> {
        let request = GraphQlRequest::new(
            "getAddressList",
            json!({ "size": 1, "page": 1 }),
            ADDRESS_LIST_QUERY,
        );
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .json::<AddressListResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        response
            .data
            .and_then(|d| d.get_address_list)
            .map(|r| r.result)
            .unwrap_or_default()
            .first()
            .map(|entry| entry.address_id)
            .ok_or(ApiError::NoAddress)
    }

    async fn checkout(&self, address_id: i64, token: &str) -> Result<bool, ApiError> {
        let batch = checkout_batch(address_id);
        let envelopes = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&batch)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .json::<Vec<BatchEnvelope>>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        for envelope in &envelopes {
            for (operation, status) in &envelope.data {
                if status.meta.code != "success" {
                    debug!(operation, code = %status.meta.code, "checkout operation rejected");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_contains_the_seven_operations_in_order() {
        let batch = checkout_batch(681_613);
        let names: Vec<&str> = batch.iter().map(|r| r.operation_name.as_str()).collect();
        assert_eq!(
            names,
            [
                "processCheckoutV2",
                "updateSummaryShipping",
                "updateSummaryPayment",
                "updateSummaryJTPoint",
                "getSummaryCheckoutV2",
                "getCheckoutSKUList",
                "addOrderV2",
            ]
        );
    }

    #[test]
    fn batch_pins_the_address_and_payment_constants() {
        let batch = checkout_batch(681_613);
        assert_eq!(batch[1].variables["request"]["addressID"], 681_613);
        assert_eq!(batch[1].variables["request"]["shippingID"], 4);
        assert_eq!(batch[2].variables["request"]["paymentCode"], "VABCA");
        assert_eq!(batch[3].variables["request"]["isJTPoint"], true);
    }
}
