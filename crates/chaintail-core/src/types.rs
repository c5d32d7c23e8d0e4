//! The ABI type grammar and decoded values.
//!
//! `AbiType` is a closed set: every type tag an ABI document may declare is
//! either parsed into one of these variants or rejected with
//! `DecodeError::UnsupportedType`. There is no string-dispatched fallback.

use alloy_primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::abi::AbiParam;
use crate::error::DecodeError;

/// An ABI type, as declared for an event argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AbiType {
    /// Unsigned integer, width in bits (8..=256, multiple of 8)
    Uint(u16),
    /// Signed integer, width in bits (8..=256, multiple of 8)
    Int(u16),
    Address,
    Bool,
    /// bytes1 .. bytes32, length in bytes
    FixedBytes(u8),
    /// Variable-length byte array
    Bytes,
    String,
    /// `T[]`
    Array(Box<AbiType>),
    /// `T[k]`
    FixedArray(Box<AbiType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Parse a canonical type tag such as `uint256`, `bytes32[]` or
    /// `(address,uint256)[2]`.
    pub fn parse(tag: &str) -> Result<Self, DecodeError> {
        let tag = tag.trim();
        if let Some(stripped) = tag.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| DecodeError::unsupported(tag))?;
            let elem = Self::parse(&stripped[..open])?;
            return Self::wrap_array(elem, &stripped[open + 1..], tag);
        }
        if let Some(body) = tag.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            let members = split_top_level(body)
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::Tuple(members));
        }
        Self::parse_elementary(tag)
    }

    /// Build a type from an ABI JSON parameter: `tuple` tags take their
    /// members from `components`, everything else goes through [`parse`].
    ///
    /// [`parse`]: AbiType::parse
    pub fn from_components(tag: &str, components: &[AbiParam]) -> Result<Self, DecodeError> {
        let Some(suffix) = tag.strip_prefix("tuple") else {
            return Self::parse(tag);
        };
        let members = components
            .iter()
            .map(|c| Self::from_components(&c.ty, &c.components))
            .collect::<Result<Vec<_>, _>>()?;

        // Array suffixes apply innermost-first, left to right: tuple[2][] is
        // a dynamic array of 2-element arrays.
        let mut ty = Self::Tuple(members);
        let mut rest = suffix;
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .ok_or_else(|| DecodeError::unsupported(tag))?;
            let close = inner.find(']').ok_or_else(|| DecodeError::unsupported(tag))?;
            ty = Self::wrap_array(ty, &inner[..close], tag)?;
            rest = &inner[close + 1..];
        }
        Ok(ty)
    }

    fn wrap_array(elem: AbiType, len: &str, tag: &str) -> Result<Self, DecodeError> {
        if len.is_empty() {
            return Ok(Self::Array(Box::new(elem)));
        }
        match len.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Self::FixedArray(Box::new(elem), n)),
            _ => Err(DecodeError::unsupported(tag)),
        }
    }

    fn parse_elementary(tag: &str) -> Result<Self, DecodeError> {
        match tag {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        if let Some(bits) = tag.strip_prefix("uint") {
            return int_width(bits).map(Self::Uint).ok_or_else(|| DecodeError::unsupported(tag));
        }
        if let Some(bits) = tag.strip_prefix("int") {
            return int_width(bits).map(Self::Int).ok_or_else(|| DecodeError::unsupported(tag));
        }
        if let Some(len) = tag.strip_prefix("bytes") {
            return match len.parse::<u8>() {
                Ok(n) if (1..=32).contains(&n) => Ok(Self::FixedBytes(n)),
                _ => Err(DecodeError::unsupported(tag)),
            };
        }
        Err(DecodeError::unsupported(tag))
    }

    /// Reference types are stored as the keccak256 of their encoding when
    /// they appear as an indexed event argument.
    pub fn is_hashed_in_topic(&self) -> bool {
        matches!(
            self,
            Self::Bytes | Self::String | Self::Array(_) | Self::FixedArray(..) | Self::Tuple(_)
        )
    }
}

fn int_width(bits: &str) -> Option<u16> {
    let bits = bits.parse::<u16>().ok()?;
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

/// Split a tuple body at commas that are not nested in parentheses.
fn split_top_level(body: &str) -> Vec<&str> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{bits}"),
            AbiType::Int(bits) => write!(f, "int{bits}"),
            AbiType::Address => write!(f, "address"),
            AbiType::Bool => write!(f, "bool"),
            AbiType::FixedBytes(n) => write!(f, "bytes{n}"),
            AbiType::Bytes => write!(f, "bytes"),
            AbiType::String => write!(f, "string"),
            AbiType::Array(elem) => write!(f, "{elem}[]"),
            AbiType::FixedArray(elem, len) => write!(f, "{elem}[{len}]"),
            AbiType::Tuple(members) => {
                let parts: Vec<_> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl From<AbiType> for String {
    fn from(ty: AbiType) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for AbiType {
    type Error = DecodeError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        AbiType::parse(&tag)
    }
}

/// A decoded argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    /// bytesN, exactly N bytes
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// keccak256 of an indexed reference-type argument; the original value
    /// cannot be recovered from the log
    Hash(B256),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(u) => Some(*u),
            _ => None,
        }
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint(v) => write!(f, "{v}"),
            AbiValue::Int(v) => write!(f, "{v}"),
            AbiValue::Address(a) => write!(f, "{}", a.to_checksum(None)),
            AbiValue::Bool(b) => write!(f, "{b}"),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            AbiValue::String(s) => write!(f, "{s}"),
            AbiValue::Hash(h) => write!(f, "0x{}", hex::encode(h)),
            AbiValue::Array(items) => {
                let parts: Vec<_> = items.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            AbiValue::Tuple(items) => {
                let parts: Vec<_> = items.iter().map(|x| x.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
