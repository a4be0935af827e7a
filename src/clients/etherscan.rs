//! Etherscan-compatible metadata client
//!
//! Uses two read-only endpoints of the classic `/api` interface:
//! - `module=contract&action=getsourcecode` for contract name and ABI
//! - `module=transaction&action=getstatus` for an error description
//!
//! The service reports errors in-band (`"result": "Invalid API Key"`), so
//! the `result` field is inspected before it is interpreted.

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, B256},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    errors::{InitError, MetadataError},
    resolver::ContractAbi,
    traits::MetadataClient,
    types::LookupOptions,
};

/// Envelope of every response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    message: String,
    result: Value,
}

#[derive(Debug, Deserialize)]
struct SourceCodeEntry {
    #[serde(rename = "ContractName", default)]
    contract_name: String,
    #[serde(rename = "ABI")]
    abi: String,
}

#[derive(Debug, Deserialize)]
struct TxStatusEntry {
    #[serde(rename = "errDescription", default)]
    err_description: String,
}

/// [`MetadataClient`] for Etherscan and API-compatible explorers
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherscanClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, InitError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| InitError::HttpClient(err.to_string()))?;
        Ok(Self { http, base_url: base_url.into(), api_key })
    }

    /// Client for the network and key configured in `options`
    pub fn from_options(options: &LookupOptions) -> Result<Self, InitError> {
        Self::new(options.etherscan_url(), options.etherscan_key.clone())
    }

    async fn get(&self, params: &[(&str, String)]) -> Result<ApiResponse, MetadataError> {
        let mut request = self.http.get(&self.base_url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|err| MetadataError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataError::Http(format!("HTTP {}", response.status().as_u16())));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|err| MetadataError::Http(err.to_string()))
    }
}

fn api_error(response: &ApiResponse, fallback: &str) -> MetadataError {
    match &response.result {
        Value::String(text) if !text.is_empty() => MetadataError::Api(text.clone()),
        _ if !response.message.is_empty() => MetadataError::Api(response.message.clone()),
        _ => MetadataError::Api(fallback.to_string()),
    }
}

fn parse_source_code(response: ApiResponse) -> Result<ContractAbi, MetadataError> {
    let entries: Vec<SourceCodeEntry> = match &response.result {
        Value::Array(_) => serde_json::from_value(response.result.clone())
            .map_err(|err| MetadataError::Api(err.to_string()))?,
        _ => return Err(api_error(&response, "unexpected getsourcecode result")),
    };
    let entry = entries.into_iter().next().ok_or(MetadataError::EmptyResult)?;
    // unverified contracts carry a plain-text notice instead of JSON here
    let abi: JsonAbi = serde_json::from_str(&entry.abi)
        .map_err(|_| MetadataError::InvalidAbi(entry.abi.clone()))?;
    Ok(ContractAbi { name: entry.contract_name, abi })
}

fn parse_tx_status(response: ApiResponse) -> Result<String, MetadataError> {
    match &response.result {
        Value::Object(_) => {
            let status: TxStatusEntry = serde_json::from_value(response.result.clone())
                .map_err(|err| MetadataError::Api(err.to_string()))?;
            Ok(status.err_description)
        }
        _ => Err(api_error(&response, "unexpected getstatus result")),
    }
}

#[async_trait]
impl MetadataClient for EtherscanClient {
    async fn contract_abi(&self, address: Address) -> Result<ContractAbi, MetadataError> {
        let response = self
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getsourcecode".to_string()),
                ("address", address.to_string()),
            ])
            .await?;
        parse_source_code(response)
    }

    async fn tx_error_description(&self, hash: B256) -> Result<String, MetadataError> {
        let response = self
            .get(&[
                ("module", "transaction".to_string()),
                ("action", "getstatus".to_string()),
                ("txhash", hash.to_string()),
            ])
            .await?;
        parse_tx_status(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> ApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_verified_source() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"...","ContractName":"Dai","ABI":"[{\"type\":\"function\",\"name\":\"decimals\",\"inputs\":[],\"outputs\":[{\"name\":\"\",\"type\":\"uint8\"}],\"stateMutability\":\"view\"}]"}]}"#;
        let contract = parse_source_code(response(body)).unwrap();
        assert_eq!(contract.name, "Dai");
        assert!(contract.abi.function("decimals").is_some());
    }

    #[test]
    fn test_parse_unverified_source() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"","ContractName":"","ABI":"Contract source code not verified"}]}"#;
        assert!(matches!(parse_source_code(response(body)), Err(MetadataError::InvalidAbi(_))));

        let body = r#"{"status":"1","message":"OK","result":[]}"#;
        assert!(matches!(parse_source_code(response(body)), Err(MetadataError::EmptyResult)));
    }

    #[test]
    fn test_in_band_errors() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        match parse_source_code(response(body)) {
            Err(MetadataError::Api(message)) => assert_eq!(message, "Invalid API Key"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(parse_tx_status(response(body)).is_err());
    }

    #[test]
    fn test_parse_tx_status() {
        let body = r#"{"status":"1","message":"OK","result":{"isError":"1","errDescription":"Bad jump destination"}}"#;
        assert_eq!(parse_tx_status(response(body)).unwrap(), "Bad jump destination");

        let body = r#"{"status":"1","message":"OK","result":{"isError":"0","errDescription":""}}"#;
        assert_eq!(parse_tx_status(response(body)).unwrap(), "");
    }
}
