//! Argument decoding: topic words and data payloads → `AbiValue`.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{B256, U256};
use chaintail_core::{
    error::DecodeError,
    event::{EventArgument, EventTemplate, Log},
    types::{AbiType, AbiValue},
};

use crate::normalizer;

/// Build alloy `DynSolType` from a ChainTail `AbiType`.
pub fn to_dyn(ty: &AbiType) -> DynSolType {
    match ty {
        AbiType::Uint(bits) => DynSolType::Uint(*bits as usize),
        AbiType::Int(bits) => DynSolType::Int(*bits as usize),
        AbiType::Address => DynSolType::Address,
        AbiType::Bool => DynSolType::Bool,
        AbiType::FixedBytes(n) => DynSolType::FixedBytes(*n as usize),
        AbiType::Bytes => DynSolType::Bytes,
        AbiType::String => DynSolType::String,
        AbiType::Array(elem) => DynSolType::Array(Box::new(to_dyn(elem))),
        AbiType::FixedArray(elem, len) => DynSolType::FixedArray(Box::new(to_dyn(elem)), *len),
        AbiType::Tuple(members) => DynSolType::Tuple(members.iter().map(to_dyn).collect()),
    }
}

/// Decode a single indexed topic.
///
/// # EVM ABI indexed-argument encoding rules
/// - **Value types** (uint, int, bool, address, bytes1–bytes32): padded to
///   32 bytes, stored directly; the value is recovered.
/// - **Reference types** (string, bytes, arrays, tuples): stored as the
///   `keccak256` of their encoding; the original value is
///   **unrecoverable**. The hash is returned as `AbiValue::Hash`.
///
/// A word with dirty padding or a value wider than its type is malformed.
pub fn decode_topic(ty: &AbiType, topic: B256) -> Result<AbiValue, DecodeError> {
    if ty.is_hashed_in_topic() {
        return Ok(AbiValue::Hash(topic));
    }
    let value = to_dyn(ty)
        .abi_decode(topic.as_slice())
        .map_err(|e| DecodeError::malformed(format!("topic decode as {ty}: {e}")))?;
    check_fits(&value)?;
    if value.abi_encode() != topic.as_slice() {
        return Err(DecodeError::malformed(format!(
            "topic {topic} is not a canonical {ty}"
        )));
    }
    Ok(normalizer::normalize(value))
}

/// Reject integers and `bytesN` that do not fit their declared width,
/// recursing into arrays and tuples. alloy's dynamic decoder keeps the full
/// 32-byte word for all three.
fn check_fits(value: &DynSolValue) -> Result<(), DecodeError> {
    match value {
        DynSolValue::Uint(v, bits) if v.bit_len() > *bits => Err(DecodeError::malformed(format!(
            "{v} does not fit uint{bits}"
        ))),
        DynSolValue::Int(v, bits) if *bits < 256 => {
            // Bits above the sign bit must all copy it.
            let high = v.into_raw() >> (*bits - 1);
            if high == U256::ZERO || high == U256::MAX >> (*bits - 1) {
                Ok(())
            } else {
                Err(DecodeError::malformed(format!("{v} does not fit int{bits}")))
            }
        }
        DynSolValue::FixedBytes(word, size) if word[(*size).min(32)..].iter().any(|b| *b != 0) => {
            Err(DecodeError::malformed(format!(
                "{word} has bytes past bytes{size}"
            )))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            items.iter().try_for_each(check_fits)
        }
        _ => Ok(()),
    }
}

/// Decode a data payload as the ABI-encoded tuple of `types`.
pub fn decode_data(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let tuple = DynSolType::Tuple(types.iter().map(to_dyn).collect());
    let decoded = tuple
        .abi_decode_sequence(data)
        .map_err(|e| {
            let names: Vec<_> = types.iter().map(|t| t.to_string()).collect();
            DecodeError::malformed(format!("data decode as ({}): {e}", names.join(",")))
        })?;

    check_fits(&decoded)?;
    // Re-encoding catches dirty padding in bools and addresses.
    let canonical = decoded.abi_encode_sequence().unwrap_or_default();
    if data.get(..canonical.len()) != Some(canonical.as_slice()) {
        return Err(DecodeError::malformed(
            "data payload is not canonically encoded",
        ));
    }

    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };
    if values.len() != types.len() {
        return Err(DecodeError::malformed(format!(
            "expected {} data values, decoded {}",
            types.len(),
            values.len()
        )));
    }
    Ok(values.into_iter().map(normalizer::normalize).collect())
}

/// Decode every argument of `template` from `log`.
///
/// Indexed arguments are matched positionally against `topics[1..]` and
/// their count must equal the number of those topics. Unindexed arguments
/// are decoded jointly from `data`. Declared order is preserved in the
/// returned arguments.
pub fn decode_arguments(
    template: &EventTemplate,
    log: &Log,
) -> Result<Vec<EventArgument>, DecodeError> {
    let indexed_count = template.indexed_arguments().count();
    let topic_values = log.topics.get(1..).unwrap_or_default();
    if topic_values.len() != indexed_count {
        return Err(DecodeError::malformed(format!(
            "{} declares {indexed_count} indexed arguments but the log carries {} argument topics",
            template.canonical_signature(),
            topic_values.len()
        )));
    }

    let data_types: Vec<AbiType> = template.data_arguments().map(|a| a.ty.clone()).collect();
    let mut data_values = decode_data(&data_types, &log.data)?.into_iter();
    let mut topics = topic_values.iter().copied();

    let mut arguments = Vec::with_capacity(template.arguments.len());
    for arg in &template.arguments {
        let value = if arg.indexed {
            // Counts were checked above.
            match topics.next() {
                Some(topic) => decode_topic(&arg.ty, topic)?,
                None => return Err(DecodeError::malformed("missing indexed topic")),
            }
        } else {
            match data_values.next() {
                Some(value) => value,
                None => return Err(DecodeError::malformed("missing data value")),
            }
        };
        arguments.push(EventArgument {
            name: arg.name.clone(),
            ty: arg.ty.clone(),
            indexed: arg.indexed,
            value: Some(value),
        });
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, U256};

    fn word(bytes: &[u8]) -> B256 {
        let mut w = [0u8; 32];
        w[32 - bytes.len()..].copy_from_slice(bytes);
        B256::from(w)
    }

    fn transfer() -> EventTemplate {
        EventTemplate::new(
            "Transfer",
            vec![
                EventArgument::new("from", AbiType::Address, true),
                EventArgument::new("to", AbiType::Address, true),
                EventArgument::new("value", AbiType::Uint(256), false),
            ],
        )
    }

    #[test]
    fn topic_address() {
        let addr = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");
        let value = decode_topic(&AbiType::Address, word(addr.as_slice())).unwrap();
        assert_eq!(value, AbiValue::Address(addr));
    }

    #[test]
    fn topic_uint() {
        let value = decode_topic(&AbiType::Uint(256), word(&[0x01, 0x00])).unwrap();
        assert_eq!(value, AbiValue::Uint(U256::from(256u64)));
    }

    #[test]
    fn topic_wider_than_uint_is_malformed() {
        let err = decode_topic(&AbiType::Uint(8), word(&[0x01, 0x00])).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
        assert!(decode_topic(&AbiType::Uint(8), word(&[0xff])).is_ok());
    }

    #[test]
    fn topic_int_must_be_sign_extended() {
        // 0x80 is +128, outside int8.
        assert!(decode_topic(&AbiType::Int(8), word(&[0x80])).is_err());
        // -129 is sign extended but still too wide.
        let mut minus_129 = [0xffu8; 32];
        minus_129[31] = 0x7f;
        let minus_129 = B256::from(minus_129);
        assert!(decode_topic(&AbiType::Int(8), minus_129).is_err());

        let minus_one = B256::repeat_byte(0xff);
        assert_eq!(
            decode_topic(&AbiType::Int(8), minus_one).unwrap(),
            AbiValue::Int(alloy_primitives::I256::MINUS_ONE)
        );
        assert!(decode_topic(&AbiType::Int(8), word(&[0x7f])).is_ok());
    }

    #[test]
    fn topic_bool_other_than_zero_or_one_is_malformed() {
        assert!(decode_topic(&AbiType::Bool, word(&[0x02])).is_err());
        assert_eq!(decode_topic(&AbiType::Bool, word(&[0x01])).unwrap(), AbiValue::Bool(true));
    }

    #[test]
    fn topic_address_with_dirty_high_bytes_is_malformed() {
        let mut w = [0u8; 32];
        w[0] = 0x01;
        w[31] = 0x11;
        assert!(decode_topic(&AbiType::Address, B256::from(w)).is_err());
    }

    #[test]
    fn topic_fixed_bytes_with_dirty_tail_is_malformed() {
        let mut w = [0u8; 32];
        w[0] = 0xaa;
        w[31] = 0xbb;
        assert!(decode_topic(&AbiType::FixedBytes(1), B256::from(w)).is_err());

        let mut clean = [0u8; 32];
        clean[0] = 0xaa;
        assert!(decode_topic(&AbiType::FixedBytes(1), B256::from(clean)).is_ok());
    }

    #[test]
    fn data_value_out_of_range_is_malformed() {
        let mut data = word(&[0x01, 0x00]).to_vec();
        data.extend_from_slice(word(&[0x01]).as_slice());
        let err = decode_data(&[AbiType::Uint(8), AbiType::Bool], &data).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));

        let mut dirty_bool = word(&[0x01]).to_vec();
        dirty_bool.extend_from_slice(word(&[0x02]).as_slice());
        assert!(decode_data(&[AbiType::Uint(8), AbiType::Bool], &dirty_bool).is_err());
    }

    #[test]
    fn indexed_string_decodes_to_its_hash() {
        let topic = B256::repeat_byte(0x5a);
        assert_eq!(decode_topic(&AbiType::String, topic).unwrap(), AbiValue::Hash(topic));
        assert_eq!(
            decode_topic(&AbiType::parse("uint256[]").unwrap(), topic).unwrap(),
            AbiValue::Hash(topic)
        );
    }

    #[test]
    fn data_tuple_with_dynamic_member() {
        // (uint256 7, string "hi")
        let mut data = Vec::new();
        data.extend_from_slice(word(&[7]).as_slice());
        data.extend_from_slice(word(&[0x40]).as_slice());
        data.extend_from_slice(word(&[2]).as_slice());
        let mut s = [0u8; 32];
        s[..2].copy_from_slice(b"hi");
        data.extend_from_slice(&s);

        let values = decode_data(&[AbiType::Uint(256), AbiType::String], &data).unwrap();
        assert_eq!(
            values,
            vec![AbiValue::Uint(U256::from(7u64)), AbiValue::String("hi".into())]
        );
    }

    #[test]
    fn data_too_short_is_malformed() {
        let err = decode_data(&[AbiType::Uint(256), AbiType::Uint(256)], &[0u8; 32]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
    }

    #[test]
    fn empty_type_list_ignores_data() {
        assert!(decode_data(&[], &[1, 2, 3]).unwrap().is_empty());
    }

    #[test]
    fn decode_full_transfer() {
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let template = transfer();
        let log = Log::new(
            Address::repeat_byte(0x33),
            vec![template.selector(), word(from.as_slice()), word(to.as_slice())],
            word(&[0x03, 0xe8]).to_vec(),
        );

        let args = decode_arguments(&template, &log).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].value, Some(AbiValue::Address(from)));
        assert_eq!(args[1].value, Some(AbiValue::Address(to)));
        assert_eq!(args[2].value, Some(AbiValue::Uint(U256::from(1000u64))));
        assert!(args[0].indexed && args[1].indexed && !args[2].indexed);
    }

    #[test]
    fn topic_count_mismatch_is_malformed() {
        let template = transfer();
        let log = Log::new(
            Address::ZERO,
            vec![template.selector(), B256::ZERO],
            word(&[1]).to_vec(),
        );
        let err = decode_arguments(&template, &log).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
        assert!(err.to_string().contains("declares 2 indexed arguments but the log carries 1 argument topics"));

        let extra = Log::new(
            Address::ZERO,
            vec![template.selector(), B256::ZERO, B256::ZERO, B256::ZERO],
            word(&[1]).to_vec(),
        );
        assert!(decode_arguments(&template, &extra).is_err());
    }
}
