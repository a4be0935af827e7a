//! Ledger client backed by an alloy provider
//!
//! Connects over HTTP or WebSocket depending on the URL scheme and maps RPC
//! types and errors onto the crate's own:
//! - revert payloads returned inside an `eth_call` error become call output
//! - node messages about missing history become
//!   [`ClientError::ArchivalAccessDenied`]

use alloy::{
    consensus::{Eip658Value, Transaction as ConsensusTx, TxReceipt},
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, Bytes, B256},
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::{Transaction as RpcTransaction, TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use async_trait::async_trait;

use crate::{
    errors::{classify_rpc_message, ClientError, InitError},
    traits::LedgerClient,
    types::{CallOutput, CallRequest, LogEntry, Receipt, Transaction, TxStatus},
};

/// [`LedgerClient`] over any alloy provider
#[derive(Clone)]
pub struct AlloyLedger {
    provider: DynProvider,
}

impl AlloyLedger {
    /// Wrap an existing provider
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    /// Connect to `rpc_url`; `http(s)://` uses HTTP, anything else WebSocket
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use tx_reveal::clients::AlloyLedger;
    /// let ledger = AlloyLedger::connect("https://eth.llamarpc.com").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(rpc_url: &str) -> Result<Self, InitError> {
        let provider = if rpc_url.starts_with("http") {
            let url = rpc_url
                .parse()
                .map_err(|_| InitError::InvalidRpcUrl(rpc_url.to_string()))?;
            ProviderBuilder::new().connect_http(url).erased()
        } else {
            ProviderBuilder::new()
                .connect_ws(WsConnect::new(rpc_url))
                .await
                .map_err(|err| InitError::WsConnection(err.to_string()))?
                .erased()
        };
        Ok(Self::new(provider))
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

fn map_error(err: TransportError) -> ClientError {
    match err.as_error_resp() {
        Some(payload) => classify_rpc_message(payload.message.to_string()),
        None => ClientError::Transport(err.to_string()),
    }
}

/// Price actually paid when mined, else the legacy price, else the fee cap
fn select_gas_price(effective: Option<u128>, legacy: Option<u128>, max_fee: u128) -> u128 {
    effective.or(legacy).unwrap_or(max_fee)
}

fn to_status(value: Eip658Value) -> TxStatus {
    match value {
        Eip658Value::Eip658(true) => TxStatus::Success,
        Eip658Value::Eip658(false) => TxStatus::Failure,
        Eip658Value::PostState(_) => TxStatus::Unknown,
    }
}

fn to_transaction(tx: RpcTransaction) -> Transaction {
    let gas_price = select_gas_price(
        tx.effective_gas_price,
        ConsensusTx::gas_price(&tx),
        ConsensusTx::max_fee_per_gas(&tx),
    );
    Transaction {
        hash: *tx.inner.tx_hash(),
        from: tx.inner.signer(),
        to: ConsensusTx::to(&tx),
        input: ConsensusTx::input(&tx).clone(),
        value: ConsensusTx::value(&tx),
        nonce: ConsensusTx::nonce(&tx),
        gas_price,
        gas_limit: ConsensusTx::gas_limit(&tx),
        block_number: tx.block_number,
    }
}

fn to_receipt(receipt: TransactionReceipt) -> Receipt {
    let status = to_status(receipt.inner.status_or_post_state());
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| LogEntry {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
        .collect();
    Receipt {
        from: receipt.from,
        gas_used: receipt.gas_used,
        status,
        logs,
        contract_address: receipt.contract_address,
    }
}

#[async_trait]
impl LedgerClient for AlloyLedger {
    async fn transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError> {
        let tx = self.provider.get_transaction_by_hash(hash).await.map_err(map_error)?;
        Ok(tx.map(to_transaction))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ClientError> {
        let receipt = self.provider.get_transaction_receipt(hash).await.map_err(map_error)?;
        Ok(receipt.map(to_receipt))
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, ClientError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(map_error)?;
        Ok(block.map(|block| block.header.timestamp))
    }

    async fn code(&self, address: Address) -> Result<Bytes, ClientError> {
        self.provider.get_code_at(address).await.map_err(map_error)
    }

    async fn call(
        &self,
        request: &CallRequest,
        block: Option<u64>,
    ) -> Result<CallOutput, ClientError> {
        let mut tx = TransactionRequest::default()
            .input(request.input.clone().into())
            .value(request.value);
        if let Some(from) = request.from {
            tx = tx.from(from);
        }
        if let Some(to) = request.to {
            tx = tx.to(to);
        }
        if let Some(gas) = request.gas {
            tx = tx.gas_limit(gas);
        }

        let call = self.provider.call(tx);
        let result = match block {
            Some(number) => call.block(BlockId::number(number)).await,
            None => call.await,
        };
        match result {
            Ok(output) => Ok(CallOutput::Returned(output)),
            // a reverting call still carries the payload we are after
            Err(err) => match err.as_error_resp().and_then(|payload| payload.as_revert_data()) {
                Some(data) => Ok(CallOutput::Reverted(data)),
                None => Err(map_error(err)),
            },
        }
    }
}
