//! Hashing utilities for FactHound.
//!
//! Question and answer hashes are committed on-chain as
//! `keccak256(abi.encodePacked(address author, string text))`. The functions here
//! recompute that digest off-chain so stored hashes can be checked against the post text.

use alloy_primitives::{keccak256 as alloy_keccak256, Address, B256};

use crate::address::parse_address;
use crate::error::{CoreError, Result};

/// Compute keccak256 hash of input data.
pub fn keccak256(data: &[u8]) -> B256 {
    alloy_keccak256(data)
}

/// Compute the expected question/answer hash for an author and post text.
///
/// Matches Solidity's `keccak256(abi.encodePacked(author, text))`: the 20 address bytes
/// followed by the UTF-8 bytes of the text, with no padding or length prefix.
///
/// # Example
///
/// ```
/// use facthound_core::hashing::expected_hash;
/// use alloy_primitives::Address;
///
/// let author = Address::repeat_byte(0x11);
/// assert_eq!(expected_hash(&author, "T"), expected_hash(&author, "T"));
/// assert_ne!(expected_hash(&author, "T"), expected_hash(&author, "U"));
/// ```
pub fn expected_hash(author: &Address, text: &str) -> B256 {
    let mut data = Vec::with_capacity(20 + text.len());
    data.extend_from_slice(author.as_slice());
    data.extend_from_slice(text.as_bytes());

    keccak256(&data)
}

/// Same as [`expected_hash`] for an author given as a hex string.
///
/// # Errors
///
/// Returns `CoreError::InvalidAddress` if `author` is not a 20-byte hex address.
pub fn expected_hash_str(author: &str, text: &str) -> Result<B256> {
    let author = parse_address(author)?;
    Ok(expected_hash(&author, text))
}

/// Decode a 32-byte hash from hex, with or without a `0x` prefix.
///
/// # Errors
///
/// Returns `CoreError::InvalidHash` unless the input is exactly 64 hex digits.
pub fn parse_hash(input: &str) -> Result<B256> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidHash(input.to_string()));
    }

    digits
        .parse::<B256>()
        .map_err(|_| CoreError::InvalidHash(input.to_string()))
}
