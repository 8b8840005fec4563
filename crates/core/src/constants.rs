//! Constants shared with the FactHound escrow contract.
//!
//! The status codes MUST match the `Status` enum ordering of the deployed contract.

use alloy_primitives::Address;

/// `Status.Open` as reported by `getQuestion`.
pub const ONCHAIN_STATUS_OPEN: u8 = 0;

/// `Status.AnswerSelected` as reported by `getQuestion`.
pub const ONCHAIN_STATUS_ANSWER_SELECTED: u8 = 1;

/// `Status.Resolved` as reported by `getQuestion`.
pub const ONCHAIN_STATUS_RESOLVED: u8 = 3;

/// `Status.Canceled` as reported by `getQuestion`.
pub const ONCHAIN_STATUS_CANCELED: u8 = 4;

/// Returned by `getAnswererAddress` when the contract has no record of an answer hash.
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Length of a `0x`-prefixed hex address.
pub const ADDRESS_HEX_LEN: usize = 42;
