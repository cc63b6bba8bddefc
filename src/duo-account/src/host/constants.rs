//! Constants shared with the outside world.

use alloy_primitives::Address;

/// Token address denoting the native asset in the allowance ledger.
pub const NATIVE_TOKEN: Address = Address::ZERO;

/// Size of an ABI word; ERC-20 `transfer` returns a single `bool` word (or nothing).
pub const WORD: usize = 32;
