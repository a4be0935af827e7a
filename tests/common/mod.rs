//! In-memory ledger and metadata clients that count remote calls
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::{address, keccak256, Address, Bytes, B256, U256},
};
use async_trait::async_trait;
use tx_reveal::{
    errors::{ClientError, MetadataError},
    resolver::ContractAbi,
    traits::{LedgerClient, MetadataClient},
    types::{CallOutput, CallRequest, LogEntry, Receipt, Transaction, TxStatus},
};

pub const SENDER: Address = address!("00000000000000000000000000000000000a11ce");
pub const RECEIVER: Address = address!("0000000000000000000000000000000000000b0b");
pub const TOKEN: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const UNVERIFIED: Address = address!("00000000000000000000000000000000000dead1");
pub const PROXY: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
pub const INNER_PROXY: Address = address!("43506849d7c04f9138d1a2050bbf3a0c054402dd");
pub const LOGIC: Address = address!("0000000000000000000000000000000000001091");
pub const CREATED: Address = address!("00000000000000000000000000000000000c0de1");

pub const BLOCK: u64 = 9_000_000;
pub const BLOCK_TIME: u64 = 1_575_000_000;

pub const ERC20_ABI: &str = r#"[
    {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
    {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
    {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
]"#;

pub const PROXY_ABI: &str = r#"[
    {"type":"function","name":"implementation","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
    {"type":"function","name":"upgradeTo","inputs":[{"name":"newImplementation","type":"address"}],"outputs":[],"stateMutability":"nonpayable"}
]"#;

pub fn contract(name: &str, json: &str) -> ContractAbi {
    ContractAbi { name: name.to_string(), abi: serde_json::from_str(json).unwrap() }
}

pub fn tx_hash(n: u8) -> B256 {
    B256::with_last_byte(n)
}

pub fn transfer_input(to: Address, amount: u64) -> Bytes {
    let abi: JsonAbi = serde_json::from_str(ERC20_ABI).unwrap();
    abi.function("transfer").unwrap()[0]
        .abi_encode_input(&[DynSolValue::Address(to), DynSolValue::Uint(U256::from(amount), 256)])
        .unwrap()
        .into()
}

pub fn transfer_log(emitter: Address, from: Address, to: Address, amount: u64) -> LogEntry {
    LogEntry {
        address: emitter,
        topics: vec![
            keccak256("Transfer(address,address,uint256)"),
            from.into_word(),
            to.into_word(),
        ],
        data: U256::from(amount).to_be_bytes::<32>().to_vec().into(),
    }
}

/// ABI-encoded `Error(string)` payload
pub fn error_payload(reason: &str) -> Bytes {
    let mut payload = vec![0x08, 0xc3, 0x79, 0xa0];
    let reason = DynSolValue::Tuple(vec![DynSolValue::String(reason.to_string())]);
    payload.extend(reason.abi_encode_params());
    payload.into()
}

pub fn address_output(address: Address) -> Bytes {
    address.into_word().to_vec().into()
}

pub fn transaction(hash: B256, to: Option<Address>, input: Bytes) -> Transaction {
    Transaction {
        hash,
        from: SENDER,
        to,
        input,
        value: U256::ZERO,
        nonce: 7,
        gas_price: 20_000_000_000,
        gas_limit: 100_000,
        block_number: Some(BLOCK),
    }
}

pub fn receipt(status: TxStatus, logs: Vec<LogEntry>) -> Receipt {
    Receipt { from: SENDER, gas_used: 52_000, status, logs, contract_address: None }
}

/// Ledger answering from in-memory maps
#[derive(Default)]
pub struct MockLedger {
    transactions: HashMap<B256, Transaction>,
    receipts: HashMap<B256, Receipt>,
    code: HashMap<Address, Bytes>,
    unreadable_code: HashSet<Address>,
    call_outputs: HashMap<Address, CallOutput>,
    /// Reject every call pinned to a block
    pruned: bool,
    pub transaction_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
    pub calls: Mutex<Vec<(Option<Address>, Option<u64>)>>,
}

impl MockLedger {
    pub fn with_transaction(mut self, tx: Transaction, receipt: Option<Receipt>) -> Self {
        if let Some(receipt) = receipt {
            self.receipts.insert(tx.hash, receipt);
        }
        self.transactions.insert(tx.hash, tx);
        self
    }

    pub fn with_contract(mut self, address: Address) -> Self {
        self.code.insert(address, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));
        self
    }

    pub fn with_unreadable_code(mut self, address: Address) -> Self {
        self.unreadable_code.insert(address);
        self
    }

    pub fn with_call_output(mut self, to: Address, output: Bytes) -> Self {
        self.call_outputs.insert(to, CallOutput::Returned(output));
        self
    }

    pub fn with_call_revert(mut self, to: Address, payload: Bytes) -> Self {
        self.call_outputs.insert(to, CallOutput::Reverted(payload));
        self
    }

    pub fn pruned(mut self) -> Self {
        self.pruned = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, to: Address) -> Vec<Option<u64>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(callee, _)| *callee == Some(to))
            .map(|(_, block)| *block)
            .collect()
    }

    pub fn remote_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
            + self.receipt_calls.load(Ordering::SeqCst)
            + self.block_calls.load(Ordering::SeqCst)
            + self.code_calls.load(Ordering::SeqCst)
            + self.call_count()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ClientError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipts.get(&hash).cloned())
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, ClientError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        Ok((number == BLOCK).then_some(BLOCK_TIME))
    }

    async fn code(&self, address: Address) -> Result<Bytes, ClientError> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreadable_code.contains(&address) {
            return Err(ClientError::Rpc("invalid address context".to_string()));
        }
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn call(
        &self,
        request: &CallRequest,
        block: Option<u64>,
    ) -> Result<CallOutput, ClientError> {
        self.calls.lock().unwrap().push((request.to, block));
        if self.pruned && block.is_some() {
            return Err(ClientError::ArchivalAccessDenied("missing trie node".to_string()));
        }
        Ok(request
            .to
            .and_then(|to| self.call_outputs.get(&to).cloned())
            .unwrap_or(CallOutput::Returned(Bytes::new())))
    }
}

/// Metadata service answering from in-memory maps
#[derive(Default)]
pub struct MockMetadata {
    abis: HashMap<Address, ContractAbi>,
    descriptions: HashMap<B256, String>,
    abi_calls: Mutex<HashMap<Address, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl MockMetadata {
    pub fn with_abi(mut self, address: Address, abi: ContractAbi) -> Self {
        self.abis.insert(address, abi);
        self
    }

    pub fn with_description(mut self, hash: B256, description: &str) -> Self {
        self.descriptions.insert(hash, description.to_string());
        self
    }

    pub fn abi_calls(&self, address: Address) -> usize {
        self.abi_calls.lock().unwrap().get(&address).copied().unwrap_or_default()
    }

    pub fn total_abi_calls(&self) -> usize {
        self.abi_calls.lock().unwrap().values().sum()
    }

    /// Most ABI fetches ever pending at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataClient for MockMetadata {
    async fn contract_abi(&self, address: Address) -> Result<ContractAbi, MetadataError> {
        *self.abi_calls.lock().unwrap().entry(address).or_default() += 1;
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);
        // let concurrent callers pile up on the pending lookup
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.abis.get(&address).cloned().ok_or_else(|| {
            MetadataError::InvalidAbi("Contract source code not verified".to_string())
        })
    }

    async fn tx_error_description(&self, hash: B256) -> Result<String, MetadataError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.descriptions
            .get(&hash)
            .cloned()
            .ok_or_else(|| MetadataError::Http("connection reset".to_string()))
    }
}
