//! Parent-to-Child Retryable Messages
//!
//! Tracks a retryable ticket from its parent-chain creation to its
//! redemption on the child chain.
//!
//! ## Ticket id
//!
//! The child chain executes the ticket creation as a transaction of type
//! `0x69`. Its hash, the ticket id, is derived from the message fields:
//!
//! ```text
//! keccak256(0x69 || rlp([chainId, pad32(messageNumber), sender, parentBaseFee,
//!     deposit, maxFeePerGas, gasLimit, dest | "", l2CallValue,
//!     callValueRefund, maxSubmissionFee, excessFeeRefund, data]))
//! ```
//!
//! ## Status
//!
//! - no creation receipt: `NotYetCreated`
//! - reverted creation receipt: `CreationFailed`
//! - a scheduled redeem whose retry transaction succeeded: `Redeemed`
//! - otherwise `FundsDepositedOnChild` while `getTimeout` is not behind the
//!   latest child block, `Expired` once it is or the ticket is gone

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{keccak256, Address, Bytes, B256, U256},
    providers::Provider,
    rpc::types::{BlockTransactionsKind, Filter, Log, TransactionReceipt},
    sol_types::{SolError, SolEvent},
};
use alloy_rlp::Encodable;
use eyre::{eyre, Result, WrapErr};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::RetryableError;
use crate::evm::client::{EvmClientWithSigner, HttpProvider};
use crate::evm::contracts::{ArbRetryableTx, ARB_RETRYABLE_TX_ADDRESS};
use crate::networks::get_child_network;
use crate::types::{MessageStatus, RetryableMessage};

/// Transaction type of a submit-retryable transaction on the child chain
pub const SUBMIT_RETRYABLE_TX_TYPE: u8 = 0x69;

/// RLP payload (without list header) of the submit-retryable transaction
fn creation_fields(message: &RetryableMessage) -> Vec<u8> {
    let params = &message.message_data;
    let mut out = Vec::new();

    U256::from(message.child_chain_id).encode(&mut out);
    B256::from(message.message_number.to_be_bytes::<32>()).encode(&mut out);
    message.sender.encode(&mut out);
    message.parent_base_fee.encode(&mut out);
    params.l1_value.encode(&mut out);
    params.max_fee_per_gas.encode(&mut out);
    params.gas_limit.encode(&mut out);
    if params.dest_address == Address::ZERO {
        // contract creation
        Bytes::new().encode(&mut out);
    } else {
        params.dest_address.encode(&mut out);
    }
    params.l2_call_value.encode(&mut out);
    params.call_value_refund_address.encode(&mut out);
    params.max_submission_fee.encode(&mut out);
    params.excess_fee_refund_address.encode(&mut out);
    params.data.encode(&mut out);

    out
}

/// Typed encoding of the submit-retryable transaction, `0x69 || rlp(fields)`
pub fn encode_retryable_creation(message: &RetryableMessage) -> Vec<u8> {
    let payload = creation_fields(message);
    let header = alloy_rlp::Header {
        list: true,
        payload_length: payload.len(),
    };

    let mut out = Vec::with_capacity(1 + header.length() + payload.len());
    out.push(SUBMIT_RETRYABLE_TX_TYPE);
    header.encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

/// Ticket id of a retryable message on the child chain
pub fn retryable_creation_id(message: &RetryableMessage) -> B256 {
    keccak256(encode_retryable_creation(message))
}

/// Reads and redeems one retryable ticket on the child chain
#[derive(Debug, Clone)]
pub struct ChildMessageClient {
    provider: HttpProvider,
    message: RetryableMessage,
    ticket_id: B256,
}

impl ChildMessageClient {
    pub fn new(provider: HttpProvider, message: RetryableMessage) -> Self {
        let ticket_id = retryable_creation_id(&message);
        Self {
            provider,
            message,
            ticket_id,
        }
    }

    /// Ticket id (hash of the creation transaction on the child chain)
    pub fn ticket_id(&self) -> B256 {
        self.ticket_id
    }

    /// How long to wait for the ticket creation
    ///
    /// `configured` wins; otherwise the child network's deposit timeout
    /// applies, and a network without one (or an unregistered network) waits
    /// indefinitely.
    pub fn wait_timeout(&self, configured: Option<Duration>) -> Option<Duration> {
        configured.or_else(|| {
            get_child_network(self.message.child_chain_id).and_then(|n| n.deposit_timeout())
        })
    }

    /// Receipt of the ticket creation, if it has been executed
    pub async fn creation_receipt(&self) -> Result<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(self.ticket_id)
            .await
            .wrap_err("Failed to get retryable creation receipt")
    }

    /// Current status of the ticket
    pub async fn status(&self) -> Result<MessageStatus> {
        match self.creation_receipt().await? {
            Some(creation) => self.status_after_creation(&creation).await,
            None => Ok(ticket_status(None, &[], None)),
        }
    }

    async fn status_after_creation(&self, creation: &TransactionReceipt) -> Result<MessageStatus> {
        let created = creation.status();
        let redeems = if created {
            self.redeem_outcomes(creation).await?
        } else {
            Vec::new()
        };
        let lifetime = if created && !redeems.contains(&Some(true)) {
            Some(self.lifetime().await?)
        } else {
            None
        };
        Ok(ticket_status(Some(created), &redeems, lifetime))
    }

    /// Receipt status of every scheduled redeem of the ticket
    async fn redeem_outcomes(&self, creation: &TransactionReceipt) -> Result<Vec<Option<bool>>> {
        let mut logs: Vec<Log> = creation.inner.logs().to_vec();

        let mut filter = Filter::new()
            .address(ARB_RETRYABLE_TX_ADDRESS)
            .event_signature(ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH)
            .topic1(self.ticket_id);
        if let Some(block) = creation.block_number {
            filter = filter.from_block(block);
        }
        logs.extend(
            self.provider
                .get_logs(&filter)
                .await
                .wrap_err("Failed to query RedeemScheduled logs")?,
        );

        let mut retry_txs = redeem_attempts(&logs, self.ticket_id);
        retry_txs.dedup();

        let mut outcomes = Vec::with_capacity(retry_txs.len());
        for retry_tx in retry_txs {
            let outcome = self
                .provider
                .get_transaction_receipt(retry_tx)
                .await
                .wrap_err("Failed to get retry transaction receipt")?
                .map(|r| r.status());
            debug!(ticket_id = %self.ticket_id, retry_tx = %retry_tx, ?outcome, "Redeem attempt");
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Look the ticket up in the ArbRetryableTx precompile
    async fn lifetime(&self) -> Result<TicketLifetime> {
        let precompile = ArbRetryableTx::new(ARB_RETRYABLE_TX_ADDRESS, &self.provider);
        let expires_at = match precompile.getTimeout(self.ticket_id).call().await {
            Ok(timeout) => timeout._0,
            Err(e) if is_missing_ticket(&e) => {
                debug!(ticket_id = %self.ticket_id, "No ticket with this id");
                return Ok(TicketLifetime::NotFound);
            }
            Err(e) => return Err(eyre::Report::new(e).wrap_err("Failed to get ticket timeout")),
        };

        let latest = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
            .await
            .wrap_err("Failed to get latest child block")?
            .ok_or_else(|| eyre!("Latest child block not found"))?;

        Ok(TicketLifetime::Live {
            expires_at,
            now: latest.header.timestamp,
        })
    }

    /// Poll until the ticket creation is executed, then return its status
    ///
    /// Fails with [`RetryableError::Timeout`] if `timeout` elapses first.
    pub async fn wait_for_status(
        &self,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<MessageStatus> {
        let creation = poll_until(self.ticket_id, poll_interval, timeout, || {
            self.creation_receipt()
        })
        .await?;

        let status = self.status_after_creation(&creation).await?;
        info!(ticket_id = %self.ticket_id, status = %status, "Retryable ticket status resolved");
        Ok(status)
    }

    /// Redeem the ticket from the child signer
    ///
    /// Returns the receipt of the redeem transaction; a reverted redeem is an error.
    pub async fn redeem(&self, signer: &EvmClientWithSigner) -> Result<TransactionReceipt> {
        let precompile = ArbRetryableTx::new(ARB_RETRYABLE_TX_ADDRESS, signer.signing_provider());
        let pending = precompile
            .redeem(self.ticket_id)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send redeem: {}", e))?;

        let tx_hash = *pending.tx_hash();
        debug!(ticket_id = %self.ticket_id, tx_hash = %tx_hash, "Redeem transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .wrap_err("Failed to get redeem receipt")?;
        if !receipt.status() {
            return Err(eyre!("Redeem transaction {} reverted", tx_hash));
        }
        Ok(receipt)
    }
}

/// What the ArbRetryableTx precompile reports for a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketLifetime {
    /// `getTimeout` reverted with `NoTicketWithID`
    NotFound,
    /// The ticket expires at `expires_at`; `now` is the latest child block timestamp
    Live { expires_at: U256, now: u64 },
}

/// Status of a ticket from what the child chain reports about it
///
/// `creation` is the status of the creation receipt, `redeems` the receipt
/// status of each scheduled retry (`None` while unexecuted). `lifetime` is
/// only consulted for a created ticket without a successful redeem.
pub fn ticket_status(
    creation: Option<bool>,
    redeems: &[Option<bool>],
    lifetime: Option<TicketLifetime>,
) -> MessageStatus {
    match creation {
        None => MessageStatus::NotYetCreated,
        Some(false) => MessageStatus::CreationFailed,
        Some(true) if redeems.contains(&Some(true)) => MessageStatus::Redeemed,
        Some(true) => match lifetime {
            Some(TicketLifetime::Live { expires_at, now }) if expires_at >= U256::from(now) => {
                MessageStatus::FundsDepositedOnChild
            }
            _ => MessageStatus::Expired,
        },
    }
}

/// Whether revert data is the precompile's `NoTicketWithID()` error
pub fn is_no_ticket_revert(revert: &[u8]) -> bool {
    revert.starts_with(ArbRetryableTx::NoTicketWithID::SELECTOR.as_slice())
}

fn is_missing_ticket(err: &alloy::contract::Error) -> bool {
    match err {
        alloy::contract::Error::TransportError(e) => e
            .as_error_resp()
            .and_then(|payload| payload.as_revert_data())
            .is_some_and(|revert| is_no_ticket_revert(&revert)),
        _ => false,
    }
}

/// Call `poll` every `poll_interval` until it yields a value
///
/// Fails with [`RetryableError::Timeout`] for `ticket_id` once `timeout` has
/// elapsed; `None` polls indefinitely.
pub async fn poll_until<T, F, Fut>(
    ticket_id: B256,
    poll_interval: Duration,
    timeout: Option<Duration>,
    mut poll: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let mut polls: u64 = 0;

    loop {
        if let Some(value) = poll().await? {
            debug!(ticket_id = %ticket_id, polls, "Poll succeeded");
            return Ok(value);
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                warn!(ticket_id = %ticket_id, ?limit, "Timed out waiting for retryable ticket");
                return Err(RetryableError::Timeout {
                    ticket_id,
                    timeout: limit,
                }
                .into());
            }
        }

        polls += 1;
        if polls % 30 == 0 {
            debug!(ticket_id = %ticket_id, polls, "Still waiting for retryable ticket");
        }
        sleep(poll_interval).await;
    }
}

/// Retry transaction hashes of `RedeemScheduled` events for `ticket_id`, in log order
pub fn redeem_attempts(logs: &[Log], ticket_id: B256) -> Vec<B256> {
    logs.iter()
        .filter(|l| l.address() == ARB_RETRYABLE_TX_ADDRESS)
        .filter(|l| l.topics().first() == Some(&ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH))
        .filter_map(|l| l.log_decode::<ArbRetryableTx::RedeemScheduled>().ok())
        .map(|decoded| decoded.inner.data)
        .filter(|event| event.ticketId == ticket_id)
        .map(|event| event.retryTxHash)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RetryableMessageParams;

    fn sample_message() -> RetryableMessage {
        RetryableMessage {
            child_chain_id: 412346,
            sender: Address::repeat_byte(0x11),
            message_number: U256::from(5u64),
            parent_base_fee: U256::from(7u64),
            message_data: RetryableMessageParams {
                dest_address: Address::repeat_byte(0x22),
                l2_call_value: U256::ZERO,
                l1_value: U256::from(1000u64),
                max_submission_fee: U256::from(300u64),
                excess_fee_refund_address: Address::repeat_byte(0x33),
                call_value_refund_address: Address::repeat_byte(0x44),
                gas_limit: U256::from(100u64),
                max_fee_per_gas: U256::from(7u64),
                data: Bytes::from(vec![0xca, 0xfe]),
            },
        }
    }

    #[test]
    fn test_creation_encoding_layout() {
        let encoded = encode_retryable_creation(&sample_message());
        assert_eq!(encoded[0], SUBMIT_RETRYABLE_TX_TYPE);

        // list header: payload is longer than 55 bytes
        let payload = creation_fields(&sample_message());
        assert_eq!(encoded[1], 0xf8);
        assert_eq!(encoded[2] as usize, payload.len());
        assert_eq!(&encoded[3..], payload.as_slice());

        // chain id 412346 = 0x064aba
        assert_eq!(&payload[..4], &[0x83, 0x06, 0x4a, 0xba]);
        // message number as a 32-byte string
        assert_eq!(payload[4], 0xa0);
        assert_eq!(payload[4 + 32], 5);
        // sender as a 20-byte string
        assert_eq!(payload[37], 0x94);
        assert_eq!(&payload[38..58], &[0x11; 20]);
        // parent base fee 7 as a single byte
        assert_eq!(payload[58], 0x07);
        // data at the tail
        assert_eq!(&payload[payload.len() - 3..], &[0x82, 0xca, 0xfe]);
    }

    #[test]
    fn test_creation_encoding_zero_destination() {
        let mut message = sample_message();
        let with_dest = creation_fields(&message);

        message.message_data.dest_address = Address::ZERO;
        let without_dest = creation_fields(&message);

        // 21-byte address replaced by the empty string marker
        assert_eq!(with_dest.len() - without_dest.len(), 20);
        assert!(without_dest.windows(2).any(|w| w == [0x80, 0x80]));
    }

    #[test]
    fn test_zero_values_encode_as_empty() {
        let mut message = sample_message();
        message.parent_base_fee = U256::ZERO;
        let payload = creation_fields(&message);
        assert_eq!(payload[58], 0x80);
    }

    #[test]
    fn test_creation_id_depends_on_every_field() {
        let base = retryable_creation_id(&sample_message());
        assert_eq!(base, retryable_creation_id(&sample_message()));

        let mut other = sample_message();
        other.message_number = U256::from(6u64);
        assert_ne!(base, retryable_creation_id(&other));

        let mut other = sample_message();
        other.child_chain_id = 42161;
        assert_ne!(base, retryable_creation_id(&other));

        let mut other = sample_message();
        other.message_data.data = Bytes::new();
        assert_ne!(base, retryable_creation_id(&other));
    }

    #[test]
    fn test_creation_id_is_hash_of_encoding() {
        let message = sample_message();
        assert_eq!(
            retryable_creation_id(&message),
            keccak256(encode_retryable_creation(&message))
        );
    }

    fn redeem_log(ticket_id: B256, retry_tx: B256, address: Address) -> Log {
        let event = ArbRetryableTx::RedeemScheduled {
            ticketId: ticket_id,
            retryTxHash: retry_tx,
            sequenceNum: 0,
            donatedGas: 100_000,
            gasDonor: Address::repeat_byte(0x55),
            maxRefund: U256::ZERO,
            submissionFeeRefund: U256::ZERO,
        };
        Log {
            inner: alloy::primitives::Log {
                address,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_redeem_attempts_filters_ticket_and_address() {
        let ticket = B256::repeat_byte(0x01);
        let logs = vec![
            redeem_log(ticket, B256::repeat_byte(0xa1), ARB_RETRYABLE_TX_ADDRESS),
            redeem_log(B256::repeat_byte(0x02), B256::repeat_byte(0xa2), ARB_RETRYABLE_TX_ADDRESS),
            redeem_log(ticket, B256::repeat_byte(0xa3), Address::repeat_byte(0x99)),
            redeem_log(ticket, B256::repeat_byte(0xa4), ARB_RETRYABLE_TX_ADDRESS),
        ];

        assert_eq!(
            redeem_attempts(&logs, ticket),
            vec![B256::repeat_byte(0xa1), B256::repeat_byte(0xa4)]
        );
        assert!(redeem_attempts(&[], ticket).is_empty());
    }

    #[test]
    fn test_status_before_and_at_creation() {
        assert_eq!(ticket_status(None, &[], None), MessageStatus::NotYetCreated);
        assert_eq!(
            ticket_status(Some(false), &[], None),
            MessageStatus::CreationFailed
        );
    }

    #[test]
    fn test_status_redeemed() {
        // an earlier reverted attempt does not matter
        assert_eq!(
            ticket_status(Some(true), &[Some(false), Some(true)], None),
            MessageStatus::Redeemed
        );
    }

    #[test]
    fn test_status_funds_deposited() {
        let live = TicketLifetime::Live {
            expires_at: U256::from(2_000u64),
            now: 1_000,
        };
        assert_eq!(
            ticket_status(Some(true), &[Some(false), None], Some(live)),
            MessageStatus::FundsDepositedOnChild
        );
        assert_eq!(
            ticket_status(Some(true), &[], Some(live)),
            MessageStatus::FundsDepositedOnChild
        );

        let expires_now = TicketLifetime::Live {
            expires_at: U256::from(1_000u64),
            now: 1_000,
        };
        assert_eq!(
            ticket_status(Some(true), &[], Some(expires_now)),
            MessageStatus::FundsDepositedOnChild
        );
    }

    #[test]
    fn test_status_expired() {
        let lapsed = TicketLifetime::Live {
            expires_at: U256::from(999u64),
            now: 1_000,
        };
        assert_eq!(
            ticket_status(Some(true), &[], Some(lapsed)),
            MessageStatus::Expired
        );
        assert_eq!(
            ticket_status(Some(true), &[Some(false)], Some(TicketLifetime::NotFound)),
            MessageStatus::Expired
        );
    }

    #[test]
    fn test_no_ticket_revert_detection() {
        let revert = ArbRetryableTx::NoTicketWithID {}.abi_encode();
        assert!(is_no_ticket_revert(&revert));

        // Error(string)
        assert!(!is_no_ticket_revert(&[0x08, 0xc3, 0x79, 0xa0, 0, 0]));
        assert!(!is_no_ticket_revert(&[]));
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let ticket = B256::repeat_byte(0x07);
        let result: Result<()> = poll_until(
            ticket,
            Duration::from_millis(5),
            Some(Duration::from_millis(30)),
            || async { Ok(None) },
        )
        .await;

        let err = result.unwrap_err();
        match err.downcast_ref::<RetryableError>() {
            Some(RetryableError::Timeout { ticket_id, timeout }) => {
                assert_eq!(*ticket_id, ticket);
                assert_eq!(*timeout, Duration::from_millis(30));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_until_returns_value() {
        let mut polls = 0u32;
        let value = poll_until(B256::ZERO, Duration::from_millis(1), None, || {
            polls += 1;
            let current = polls;
            async move { Ok((current >= 3).then_some(current)) }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_poll_until_propagates_errors() {
        let result: Result<()> = poll_until(
            B256::ZERO,
            Duration::from_millis(1),
            Some(Duration::from_secs(5)),
            || async { Err(eyre!("rpc down")) },
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("rpc down"));
    }

    fn client_for(child_chain_id: u64) -> ChildMessageClient {
        let provider = alloy::providers::ProviderBuilder::new()
            .on_http("http://localhost:8547".parse().unwrap());
        let mut message = sample_message();
        message.child_chain_id = child_chain_id;
        ChildMessageClient::new(provider, message)
    }

    fn register(child_chain_id: u64, deposit_timeout_ms: u64) {
        let bridge = crate::networks::EthBridge {
            bridge: Address::repeat_byte(0x01),
            inbox: Address::repeat_byte(0x02),
            sequencer_inbox: Address::repeat_byte(0x03),
            outbox: Address::repeat_byte(0x04),
            rollup: Address::repeat_byte(0x05),
        };
        let mut child = crate::networks::ChildNetwork::custom(child_chain_id, 1, bridge, None);
        child.deposit_timeout_ms = deposit_timeout_ms;
        crate::networks::add_custom_network(None, child).unwrap();
    }

    #[test]
    fn test_wait_timeout_falls_back_to_network() {
        register(930_001, 100);
        let client = client_for(930_001);
        assert_eq!(client.wait_timeout(None), Some(Duration::from_millis(100)));
        assert_eq!(
            client.wait_timeout(Some(Duration::from_secs(9))),
            Some(Duration::from_secs(9))
        );
    }

    #[test]
    fn test_wait_timeout_disabled_or_unknown() {
        register(930_011, 0);
        assert_eq!(client_for(930_011).wait_timeout(None), None);
        assert_eq!(client_for(930_099).wait_timeout(None), None);
    }

    #[tokio::test]
    async fn test_wait_for_status_times_out_with_network_timeout() {
        register(930_021, 50);
        let client = client_for(930_021);
        let timeout = client.wait_timeout(None);

        // the creation receipt never shows up
        let result = poll_until(
            client.ticket_id(),
            Duration::from_millis(5),
            timeout,
            || async { Ok(None::<TransactionReceipt>) },
        )
        .await;
        assert!(matches!(
            result.unwrap_err().downcast_ref::<RetryableError>(),
            Some(RetryableError::Timeout { .. })
        ));
    }
}
