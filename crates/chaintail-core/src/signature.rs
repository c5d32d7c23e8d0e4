//! Event selector computation.
//!
//! The selector of an EVM event is the keccak256 hash of its canonical
//! signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! For raw logs, topics[0] IS the selector; this is only needed to key an
//! ABI index.

use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// Compute the keccak256 digest of a canonical signature.
/// Input: `"EventName(type1,type2,...)"`, no whitespace.
pub fn digest(canonical_signature: &str) -> B256 {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(canonical_signature.as_bytes());
    hasher.finalize(&mut output);
    B256::from(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn erc20_transfer_digest() {
        assert_eq!(
            digest("Transfer(address,address,uint256)"),
            b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
    }

    #[test]
    fn uniswap_v3_swap_digest() {
        assert_eq!(
            digest("Swap(address,address,int256,int256,uint160,uint128,int24)"),
            b256!("c42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67")
        );
    }

    #[test]
    fn digest_is_stable() {
        let sig = "Approval(address,address,uint256)";
        assert_eq!(digest(sig), digest(sig));
        assert_ne!(digest(sig), digest("Approval(address,address,uint128)"));
    }
}
