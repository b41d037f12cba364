//! Sample networks, messages and bridge logs

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};

use crate::evm::contracts::{IBridge, IInbox, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE};
use crate::networks::EthBridge;
use crate::types::{RetryableMessage, RetryableMessageParams};

/// Bridge contracts with distinct placeholder addresses
pub fn sample_eth_bridge() -> EthBridge {
    EthBridge {
        bridge: Address::repeat_byte(0xb1),
        inbox: Address::repeat_byte(0x1b),
        sequencer_inbox: Address::repeat_byte(0x5e),
        outbox: Address::repeat_byte(0x0b),
        rollup: Address::repeat_byte(0x40),
    }
}

/// A retryable message calling `dest` with `data`
pub fn sample_message(child_chain_id: u64, message_number: u64, dest: Address) -> RetryableMessage {
    RetryableMessage {
        child_chain_id,
        sender: Address::repeat_byte(0x5d),
        message_number: U256::from(message_number),
        parent_base_fee: U256::from(1_000_000_000u64),
        message_data: RetryableMessageParams {
            dest_address: dest,
            l2_call_value: U256::ZERO,
            l1_value: U256::from(10_000_000_000_000u64),
            max_submission_fee: U256::from(1_000_000_000_000u64),
            excess_fee_refund_address: Address::repeat_byte(0x5d),
            call_value_refund_address: Address::repeat_byte(0x5d),
            gas_limit: U256::from(90_000u64),
            max_fee_per_gas: U256::from(100_000_000u64),
            data: Bytes::from(vec![0x01, 0x02, 0x03, 0x04]),
        },
    }
}

fn to_rpc_log<E: SolEvent>(address: Address, event: &E) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address,
            data: event.encode_log_data(),
        },
        ..Default::default()
    }
}

/// The `MessageDelivered` + `InboxMessageDelivered` pair a parent receipt carries for `message`
pub fn message_logs(eth_bridge: &EthBridge, message: &RetryableMessage) -> Vec<Log> {
    let delivered = IBridge::MessageDelivered {
        messageIndex: message.message_number,
        beforeInboxAcc: B256::ZERO,
        inbox: eth_bridge.inbox,
        kind: L1_MESSAGE_TYPE_SUBMIT_RETRYABLE,
        sender: message.sender,
        messageDataHash: B256::ZERO,
        baseFeeL1: message.parent_base_fee,
        timestamp: 0,
    };
    let inbox_delivered = IInbox::InboxMessageDelivered {
        messageNum: message.message_number,
        data: message.message_data.to_bytes(),
    };

    vec![
        to_rpc_log(eth_bridge.bridge, &delivered),
        to_rpc_log(eth_bridge.inbox, &inbox_delivered),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::events::parse_retryable_messages;

    #[test]
    fn test_message_logs_parse_back() {
        let message = sample_message(99, 3, Address::repeat_byte(0x77));
        let logs = message_logs(&sample_eth_bridge(), &message);

        let parsed = parse_retryable_messages(&logs, &sample_eth_bridge(), 99).unwrap();
        assert_eq!(parsed, vec![message]);
    }
}
