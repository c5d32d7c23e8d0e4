//! Converts alloy-core `DynSolValue` → ChainTail `AbiValue`.

use alloy_core::dyn_abi::DynSolValue;
use chaintail_core::types::AbiValue;

/// Convert a decoded `DynSolValue` into an `AbiValue`.
pub fn normalize(val: DynSolValue) -> AbiValue {
    match val {
        DynSolValue::Bool(b) => AbiValue::Bool(b),
        DynSolValue::Int(i, _bits) => AbiValue::Int(i),
        DynSolValue::Uint(u, _bits) => AbiValue::Uint(u),

        // bytesN is left-aligned in its word; keep only the declared width
        DynSolValue::FixedBytes(word, size) => AbiValue::FixedBytes(word[..size.min(32)].to_vec()),

        DynSolValue::Bytes(b) => AbiValue::Bytes(b),
        DynSolValue::String(s) => AbiValue::String(s),
        DynSolValue::Address(a) => AbiValue::Address(a),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            AbiValue::Array(vals.into_iter().map(normalize).collect())
        }

        DynSolValue::Tuple(vals) => AbiValue::Tuple(vals.into_iter().map(normalize).collect()),

        // Never produced from the supported type grammar; keep the raw selector.
        DynSolValue::Function(f) => AbiValue::FixedBytes(f.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, I256, U256};

    #[test]
    fn normalize_uint() {
        let v = normalize(DynSolValue::Uint(U256::from(42u64), 256));
        assert_eq!(v, AbiValue::Uint(U256::from(42u64)));
    }

    #[test]
    fn normalize_negative_int() {
        let v = normalize(DynSolValue::Int(I256::try_from(-7i64).unwrap(), 24));
        assert_eq!(v.to_string(), "-7");
    }

    #[test]
    fn normalize_fixed_bytes_trims_to_width() {
        let mut word = B256::ZERO;
        word[0] = 0xde;
        word[1] = 0xad;
        let v = normalize(DynSolValue::FixedBytes(word, 2));
        assert_eq!(v, AbiValue::FixedBytes(vec![0xde, 0xad]));
    }

    #[test]
    fn normalize_nested() {
        let addr = Address::repeat_byte(0xaa);
        let v = normalize(DynSolValue::Tuple(vec![
            DynSolValue::Address(addr),
            DynSolValue::Array(vec![DynSolValue::Bool(true)]),
        ]));
        assert_eq!(
            v,
            AbiValue::Tuple(vec![
                AbiValue::Address(addr),
                AbiValue::Array(vec![AbiValue::Bool(true)])
            ])
        );
    }
}
