//! Call data and event log decoding
//!
//! Decoding runs against a [`SignatureRegistry`]: the union of every ABI
//! registered so far. Selectors and topics are matched globally rather than
//! per contract, so a proxy's call can be decoded with its target's ABI and a
//! log from any resolved contract can be decoded regardless of emitter.
//!
//! Nothing is ever dropped. An input that matches no signature comes back as
//! [`CallDecoding::Raw`] / [`LogDecoding::Raw`] in its original position.

use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use alloy::{
    dyn_abi::{DynSolValue, EventExt, JsonAbiExt},
    hex,
    json_abi::{Event, Function, JsonAbi},
    primitives::{Address, Bytes, B256},
};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::{
    errors::DecodeError,
    types::LogEntry,
    utils::format_utils::{format_value, Formatted},
};

/// Function selectors and event topics collected from registered ABIs
#[derive(Debug, Default, Clone)]
pub struct SignatureRegistry {
    functions: HashMap<[u8; 4], Vec<Function>>,
    events: HashMap<B256, Vec<Event>>,
    sources: HashSet<Address>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every function and non-anonymous event of `abi`
    ///
    /// Signatures already present are not duplicated. Events sharing a
    /// topic0 with a different indexed layout (ERC-20 vs ERC-721 `Transfer`)
    /// are kept side by side in registration order.
    pub fn register(&mut self, source: Address, abi: &JsonAbi) {
        if !self.sources.insert(source) {
            return;
        }
        for function in abi.functions() {
            let entry = self.functions.entry(function.selector().0).or_default();
            if !entry.contains(function) {
                entry.push(function.clone());
            }
        }
        for event in abi.events().filter(|event| !event.anonymous) {
            let entry = self.events.entry(event.selector()).or_default();
            if !entry.contains(event) {
                entry.push(event.clone());
            }
        }
        trace!(
            %source,
            functions = self.functions.len(),
            events = self.events.len(),
            "registered ABI"
        );
    }

    /// Check if an ABI from `source` has been registered
    pub fn contains(&self, source: &Address) -> bool {
        self.sources.contains(source)
    }

    /// Decode call data against the registered functions
    pub fn decode_call(&self, data: &[u8]) -> Result<DecodedCall, DecodeError> {
        if data.len() < 4 {
            return Err(DecodeError::InputTooShort);
        }
        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];
        let candidates = self
            .functions
            .get(&selector)
            .ok_or(DecodeError::UnknownSelector(selector))?;

        let mut last_err = None;
        for function in candidates {
            match function.abi_decode_input(&data[4..]) {
                Ok(values) => {
                    let inputs = function.inputs.iter().map(|p| (&p.name, p.selector_type()));
                    return Ok(DecodedCall {
                        name: function.name.clone(),
                        signature: function.signature(),
                        params: decoded_params(inputs, values),
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.map_or(DecodeError::UnknownSelector(selector), DecodeError::from))
    }

    /// Decode one log against the registered events
    pub fn decode_log(&self, log: &LogEntry) -> Result<DecodedLog, DecodeError> {
        let topic0 = log.topics.first().ok_or(DecodeError::LogHasNoTopics)?;
        let candidates = self.events.get(topic0).ok_or(DecodeError::UnknownEvent(*topic0))?;

        let mut last_err = None;
        for event in candidates {
            match event.decode_log_parts(log.topics.iter().copied(), &log.data) {
                Ok(decoded) => {
                    let mut indexed = decoded.indexed.into_iter();
                    let mut body = decoded.body.into_iter();
                    // restore declaration order from the indexed/body split
                    let values: Vec<DynSolValue> = event
                        .inputs
                        .iter()
                        .filter_map(|input| {
                            if input.indexed {
                                indexed.next()
                            } else {
                                body.next()
                            }
                        })
                        .collect();
                    let inputs = event.inputs.iter().map(|p| (&p.name, p.selector_type()));
                    let params = decoded_params(inputs, values);
                    return Ok(DecodedLog {
                        name: event.name.clone(),
                        address: log.address,
                        params,
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.map_or(DecodeError::UnknownEvent(*topic0), DecodeError::from))
    }
}

fn decoded_params<'a, I>(inputs: I, values: Vec<DynSolValue>) -> Vec<DecodedParam>
where
    I: IntoIterator<Item = (&'a String, Cow<'a, str>)>,
{
    inputs
        .into_iter()
        .zip(values)
        .map(|((name, ty), value)| DecodedParam::new(name.clone(), ty.into_owned(), value))
        .collect()
}

/// A decoded value, with a human-readable rendering when one applies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    Decoded {
        #[serde(serialize_with = "serialize_value")]
        value: DynSolValue,
    },
    DecodedFormatted {
        #[serde(serialize_with = "serialize_value")]
        value: DynSolValue,
        formatted: Formatted,
    },
}

impl ParamValue {
    /// Attach a rendering from the value formatter when one applies
    pub fn new(value: DynSolValue) -> Self {
        match format_value(&value) {
            Some(formatted) => ParamValue::DecodedFormatted { value, formatted },
            None => ParamValue::Decoded { value },
        }
    }

    pub fn value(&self) -> &DynSolValue {
        match self {
            ParamValue::Decoded { value } | ParamValue::DecodedFormatted { value, .. } => value,
        }
    }

    pub fn formatted(&self) -> Option<&Formatted> {
        match self {
            ParamValue::Decoded { .. } => None,
            ParamValue::DecodedFormatted { formatted, .. } => Some(formatted),
        }
    }
}

/// One decoded parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedParam {
    pub name: String,
    /// Declared ABI type
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    pub value: ParamValue,
}

impl DecodedParam {
    pub fn new(name: String, ty: String, value: DynSolValue) -> Self {
        Self { name, ty, value: ParamValue::new(value) }
    }
}

/// A decoded method call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedCall {
    pub name: String,
    pub signature: String,
    pub params: Vec<DecodedParam>,
}

/// A decoded event log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedLog {
    pub name: String,
    pub address: Address,
    pub params: Vec<DecodedParam>,
}

/// Call data, decoded or passed through
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CallDecoding {
    Raw(Bytes),
    Decoded(DecodedCall),
}

impl CallDecoding {
    pub fn as_decoded(&self) -> Option<&DecodedCall> {
        match self {
            CallDecoding::Decoded(call) => Some(call),
            CallDecoding::Raw(_) => None,
        }
    }
}

/// A log, decoded or passed through
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum LogDecoding {
    Raw(LogEntry),
    Decoded(DecodedLog),
}

impl LogDecoding {
    pub fn as_decoded(&self) -> Option<&DecodedLog> {
        match self {
            LogDecoding::Decoded(log) => Some(log),
            LogDecoding::Raw(_) => None,
        }
    }
}

/// Decode call data, falling back to the raw bytes
pub fn decode_call(registry: &SignatureRegistry, data: &Bytes) -> CallDecoding {
    match registry.decode_call(data) {
        Ok(call) => CallDecoding::Decoded(call),
        Err(err) => {
            debug!(error = %err, "call data left undecoded");
            CallDecoding::Raw(data.clone())
        }
    }
}

/// Decode logs position by position, falling back to each raw log
pub fn decode_logs(registry: &SignatureRegistry, logs: &[LogEntry]) -> Vec<LogDecoding> {
    logs.iter()
        .map(|log| match registry.decode_log(log) {
            Ok(decoded) => LogDecoding::Decoded(decoded),
            Err(err) => {
                debug!(address = %log.address, error = %err, "log left undecoded");
                LogDecoding::Raw(log.clone())
            }
        })
        .collect()
}

/// Render a decoded value as JSON
///
/// Integers become decimal strings so no precision is lost.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Int(v, _) => json!(v.to_string()),
        DynSolValue::Uint(v, _) => json!(v.to_string()),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => json!(address.to_checksum(None)),
        DynSolValue::Function(function) => json!(hex::encode_prefixed(function.as_slice())),
        DynSolValue::Bytes(bytes) => json!(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

fn serialize_value<S: Serializer>(value: &DynSolValue, serializer: S) -> Result<S::Ok, S::Error> {
    value_to_json(value).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    const ERC20_ABI: &str = r#"[
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
        {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
    ]"#;

    const ERC721_ABI: &str = r#"[
        {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"tokenId","type":"uint256","indexed":true}],"anonymous":false}
    ]"#;

    const TOKEN: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const NFT: Address = address!("BC4CA0EdA7647A8aB7C2061c2E118A18a936f13D");
    const ALICE: Address = address!("1111111111111111111111111111111111111111");
    const BOB: Address = address!("2222222222222222222222222222222222222222");

    fn registry_with(abis: &[(Address, &str)]) -> SignatureRegistry {
        let mut registry = SignatureRegistry::new();
        for (source, json) in abis {
            let abi: JsonAbi = serde_json::from_str(json).unwrap();
            registry.register(*source, &abi);
        }
        registry
    }

    fn word(address: Address) -> B256 {
        address.into_word()
    }

    fn transfer_topic() -> B256 {
        alloy::primitives::keccak256("Transfer(address,address,uint256)")
    }

    #[test]
    fn test_decode_call() {
        let registry = registry_with(&[(TOKEN, ERC20_ABI)]);
        let mut data = hex::decode("a9059cbb").unwrap();
        data.extend_from_slice(word(BOB).as_slice());
        data.extend_from_slice(&U256::from(2_000_000_000_000_000_000u128).to_be_bytes::<32>());

        let call = registry.decode_call(&data).unwrap();
        assert_eq!(call.name, "transfer");
        assert_eq!(call.signature, "transfer(address,uint256)");
        assert_eq!(call.params.len(), 2);
        assert_eq!(call.params[0].ty, "address");
        assert_eq!(call.params[0].value.value(), &DynSolValue::Address(BOB));
        assert_eq!(
            call.params[1].value.formatted(),
            Some(&Formatted::Units { decimals: 18, amount: "2.000000000000000000".into() })
        );
    }

    #[test]
    fn test_unknown_call_passes_through() {
        let registry = registry_with(&[(TOKEN, ERC20_ABI)]);
        let data = Bytes::from(hex::decode("deadbeef00").unwrap());
        assert_eq!(decode_call(&registry, &data), CallDecoding::Raw(data.clone()));

        let short = Bytes::from(vec![0xa9, 0x05]);
        assert!(matches!(registry.decode_call(&short), Err(DecodeError::InputTooShort)));
    }

    #[test]
    fn test_decode_logs_preserves_positions() {
        let registry = registry_with(&[(TOKEN, ERC20_ABI)]);
        let transfer = LogEntry {
            address: TOKEN,
            topics: vec![transfer_topic(), word(ALICE), word(BOB)],
            data: U256::from(1u64).to_be_bytes::<32>().to_vec().into(),
        };
        let unknown = LogEntry {
            address: BOB,
            topics: vec![B256::repeat_byte(0xab)],
            data: Bytes::new(),
        };
        let anonymous = LogEntry { address: BOB, topics: vec![], data: Bytes::from(vec![1, 2, 3]) };

        let decoded = decode_logs(&registry, &[unknown.clone(), transfer, anonymous.clone()]);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], LogDecoding::Raw(unknown));
        let log = decoded[1].as_decoded().unwrap();
        assert_eq!(log.name, "Transfer");
        assert_eq!(log.address, TOKEN);
        let names: Vec<&str> = log.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["from", "to", "value"]);
        assert_eq!(log.params[1].value.value(), &DynSolValue::Address(BOB));
        assert_eq!(decoded[2], LogDecoding::Raw(anonymous));
    }

    #[test]
    fn test_colliding_event_layouts() {
        let registry = registry_with(&[(TOKEN, ERC20_ABI), (NFT, ERC721_ABI)]);
        // ERC-721 Transfer: tokenId is indexed, data is empty
        let nft_transfer = LogEntry {
            address: NFT,
            topics: vec![transfer_topic(), word(ALICE), word(BOB), B256::with_last_byte(7)],
            data: Bytes::new(),
        };
        let log = registry.decode_log(&nft_transfer).unwrap();
        assert_eq!(log.params[2].name, "tokenId");
        assert_eq!(log.params[2].value.value(), &DynSolValue::Uint(U256::from(7u64), 256));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = registry_with(&[(TOKEN, ERC20_ABI)]);
        let abi: JsonAbi = serde_json::from_str(ERC20_ABI).unwrap();
        registry.register(BOB, &abi);
        assert!(registry.contains(&TOKEN));
        assert!(registry.contains(&BOB));
        assert_eq!(registry.functions.values().map(Vec::len).sum::<usize>(), 1);
        assert_eq!(registry.events.values().map(Vec::len).sum::<usize>(), 1);
    }

    #[test]
    fn test_json_rendering() {
        let param = DecodedParam::new(
            "amount".into(),
            "uint256".into(),
            DynSolValue::Uint(U256::from(1_577_836_800u64), 256),
        );
        let rendered = serde_json::to_value(&param).unwrap();
        assert_eq!(rendered["name"], "amount");
        assert_eq!(rendered["type"], "uint256");
        assert_eq!(rendered["kind"], "decoded_formatted");
        assert_eq!(rendered["value"], "1577836800");
        assert_eq!(rendered["formatted"]["kind"], "date");
    }
}
