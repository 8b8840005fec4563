//! Ethereum address validation.
//!
//! Contract and wallet addresses cross the service boundary as hex strings. They are
//! accepted only in `0x`-prefixed, 40-digit form carrying a valid EIP-55 checksum.

use alloy_primitives::Address;

use crate::constants::{ADDRESS_HEX_LEN, ZERO_ADDRESS};
use crate::error::{CoreError, Result};

/// Check the `^0x[a-fA-F0-9]{40}$` shape without looking at the checksum.
pub fn is_address_shaped(input: &str) -> bool {
    input.len() == ADDRESS_HEX_LEN
        && input.starts_with("0x")
        && input[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse an address that must be EIP-55 checksummed.
///
/// # Errors
///
/// - `CoreError::InvalidAddress` if the input is not `0x` followed by 40 hex digits.
/// - `CoreError::InvalidChecksum` if the mixed-case checksum does not verify.
///
/// # Example
///
/// ```
/// use facthound_core::address::parse_checksummed_address;
///
/// let addr = parse_checksummed_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
/// assert_eq!(addr.to_checksum(None), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
///
/// assert!(parse_checksummed_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
/// ```
pub fn parse_checksummed_address(input: &str) -> Result<Address> {
    let input = input.trim();
    if !is_address_shaped(input) {
        return Err(CoreError::InvalidAddress(input.to_string()));
    }

    Address::parse_checksummed(input, None)
        .map_err(|_| CoreError::InvalidChecksum(input.to_string()))
}

/// Parse an address in any letter case (wallets recovered from chain state or storage).
pub fn parse_address(input: &str) -> Result<Address> {
    let input = input.trim();
    if !is_address_shaped(input) {
        return Err(CoreError::InvalidAddress(input.to_string()));
    }

    input
        .parse::<Address>()
        .map_err(|_| CoreError::InvalidAddress(input.to_string()))
}

/// The zero address is what contract mappings return for unknown keys.
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}
