//! Rollup bridge and pusher contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the parent-chain
//! bridge contracts, the child-chain precompiles, and the pusher/buffer pair.

#![allow(clippy::too_many_arguments)]

use alloy::primitives::{address, Address};
use alloy::sol;

/// NodeInterface virtual contract, only reachable through `eth_call`/`eth_estimateGas`
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000C8");

/// ArbRetryableTx precompile
pub const ARB_RETRYABLE_TX_ADDRESS: Address = address!("000000000000000000000000000000000000006E");

/// Bridge message kind for submit-retryable messages
pub const L1_MESSAGE_TYPE_SUBMIT_RETRYABLE: u8 = 9;

sol! {
    // ========================================================================
    // Parent Chain: Bridge Contracts
    // ========================================================================

    /// Delayed inbox (ETH and ERC20 flavours share these entry points)
    #[sol(rpc)]
    contract IInbox {
        /// Bridge this inbox delivers into
        function bridge() external view returns (address);

        /// Sequencer inbox of the same rollup
        function sequencerInbox() external view returns (address);

        /// Submission fee for a retryable with `dataLength` bytes of calldata
        function calculateRetryableSubmissionFee(uint256 dataLength, uint256 baseFee) external view returns (uint256);

        /// Raised instead of creating a ticket when gasLimit or maxFeePerGas is 1
        error RetryableData(
            address from,
            address to,
            uint256 l2CallValue,
            uint256 deposit,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes data
        );

        /// Emitted with the packed message payload
        event InboxMessageDelivered(uint256 indexed messageNum, bytes data);
    }

    /// Bridge contract holding the delayed message accumulator
    #[sol(rpc)]
    contract IBridge {
        /// Rollup core contract
        function rollup() external view returns (address);

        /// Emitted for every delayed message
        event MessageDelivered(
            uint256 indexed messageIndex,
            bytes32 indexed beforeInboxAcc,
            address inbox,
            uint8 kind,
            address sender,
            bytes32 messageDataHash,
            uint256 baseFeeL1,
            uint64 timestamp
        );
    }

    /// Bridge of a custom fee chain
    #[sol(rpc)]
    contract IERC20Bridge {
        /// ERC20 token used to pay child chain fees
        function nativeToken() external view returns (address);
    }

    /// Rollup core contract
    #[sol(rpc)]
    contract IRollupCore {
        /// Outbox for child-to-parent messages
        function outbox() external view returns (address);
    }

    // ========================================================================
    // Child Chain: Precompiles
    // ========================================================================

    /// NodeInterface virtual contract (gas estimation helpers)
    #[sol(rpc)]
    contract NodeInterface {
        /// Simulate the auto-redeem of a retryable; only meaningful under eth_estimateGas
        function estimateRetryableTicket(
            address sender,
            uint256 deposit,
            address to,
            uint256 l2CallValue,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            bytes calldata data
        ) external;
    }

    /// ArbRetryableTx precompile
    #[sol(rpc)]
    contract ArbRetryableTx {
        /// Schedule a redeem of the ticket, donating the caller's gas
        function redeem(bytes32 ticketId) external returns (bytes32);

        /// Expiry timestamp of a live ticket; reverts if the ticket does not exist
        function getTimeout(bytes32 ticketId) external view returns (uint256);

        /// Raised by `getTimeout` for unknown, redeemed or expired tickets
        error NoTicketWithID();

        /// Emitted when a redeem attempt is scheduled
        event RedeemScheduled(
            bytes32 indexed ticketId,
            bytes32 indexed retryTxHash,
            uint64 indexed sequenceNum,
            uint64 donatedGas,
            address gasDonor,
            uint256 maxRefund,
            uint256 submissionFeeRefund
        );
    }

    // ========================================================================
    // Pusher / Buffer
    // ========================================================================

    /// Parent-side contract forwarding recent block hashes to the child chain
    #[sol(rpc)]
    contract IPusher {
        /// Push the hashes of the `numBlocks` most recent blocks through `inbox`
        function pushHashes(
            address inbox,
            uint256 numBlocks,
            uint256 maxFeePerGas,
            uint256 gasLimit,
            uint256 submissionCost,
            bool isERC20Inbox
        ) external payable;

        /// Emitted on every push
        event BlockHashesPushed(uint256 firstBlockNumber, uint256 lastBlockNumber);
    }

    /// Child-side store of parent block hashes
    #[sol(rpc)]
    contract IBuffer {
        /// Stored hash of a parent block, zero if never received
        function parentChainBlockHash(uint256 parentChainBlockNumber) external view returns (bytes32);
    }

    // ========================================================================
    // ERC20 Interface for fee token operations
    // ========================================================================

    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
