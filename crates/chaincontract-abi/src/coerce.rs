//! `AbiValue` → `DynSolValue` coercion with compatibility scoring.
//!
//! Every conversion is scored so overloaded functions can be ranked:
//! an exact family match scores [`EXACT`], a lossless coercion (a hex string
//! fed to `address`, short `bytes` padded into `bytes32`) scores [`COERCED`],
//! and composite values score [`EXACT`] plus the sum of their children.
//! Anything else is incompatible.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, Function, B256, I256, U256};
use chaincontract_core::AbiValue;

pub const EXACT: u32 = 2;
pub const COERCED: u32 = 1;

/// A converted value and how well it matched its target type.
#[derive(Debug, Clone)]
pub struct Coerced {
    pub value: DynSolValue,
    pub score: u32,
}

impl Coerced {
    fn exact(value: DynSolValue) -> Self {
        Self { value, score: EXACT }
    }

    fn coerced(value: DynSolValue) -> Self {
        Self { value, score: COERCED }
    }
}

/// Convert `value` to `ty`, or explain why it does not fit.
pub fn coerce(value: &AbiValue, ty: &DynSolType) -> Result<Coerced, String> {
    match (value, ty) {
        (AbiValue::Bool(b), DynSolType::Bool) => Ok(Coerced::exact(DynSolValue::Bool(*b))),

        (AbiValue::Uint(u), DynSolType::Uint(bits)) => {
            check_uint(*u, *bits)?;
            Ok(Coerced::exact(DynSolValue::Uint(*u, *bits)))
        }
        (AbiValue::Uint(u), DynSolType::Int(bits)) => {
            let (_, max) = int_bounds(*bits);
            if *u > max.into_raw() {
                return Err(format!("{u} does not fit in int{bits}"));
            }
            Ok(Coerced::coerced(DynSolValue::Int(I256::from_raw(*u), *bits)))
        }
        (AbiValue::Int(i), DynSolType::Int(bits)) => {
            let (min, max) = int_bounds(*bits);
            if *i < min || *i > max {
                return Err(format!("{i} does not fit in int{bits}"));
            }
            Ok(Coerced::exact(DynSolValue::Int(*i, *bits)))
        }
        (AbiValue::Int(i), DynSolType::Uint(bits)) => {
            if i.is_negative() {
                return Err(format!("negative value {i} for uint{bits}"));
            }
            check_uint(i.into_raw(), *bits)?;
            Ok(Coerced::coerced(DynSolValue::Uint(i.into_raw(), *bits)))
        }

        (AbiValue::Address(a), DynSolType::Address) => {
            Ok(Coerced::exact(DynSolValue::Address(*a)))
        }
        (AbiValue::Bytes(b) | AbiValue::FixedBytes(b), DynSolType::Address) if b.len() == 20 => {
            Ok(Coerced::coerced(DynSolValue::Address(Address::from_slice(b))))
        }
        (AbiValue::Str(s), DynSolType::Address) => s
            .parse::<Address>()
            .map(|a| Coerced::coerced(DynSolValue::Address(a)))
            .map_err(|e| format!("invalid address '{s}': {e}")),

        (AbiValue::Bytes(b), DynSolType::Bytes) => Ok(Coerced::exact(DynSolValue::Bytes(b.clone()))),
        (AbiValue::FixedBytes(b), DynSolType::Bytes) => {
            Ok(Coerced::coerced(DynSolValue::Bytes(b.clone())))
        }
        (AbiValue::FixedBytes(b), DynSolType::FixedBytes(n)) if b.len() == *n => {
            Ok(Coerced::exact(DynSolValue::FixedBytes(right_pad(b), *n)))
        }
        (AbiValue::Bytes(b) | AbiValue::FixedBytes(b), DynSolType::FixedBytes(n)) => {
            if b.len() > *n {
                return Err(format!("bytes{n}: got {} bytes", b.len()));
            }
            Ok(Coerced::coerced(DynSolValue::FixedBytes(right_pad(b), *n)))
        }

        (AbiValue::Str(s), DynSolType::String) => Ok(Coerced::exact(DynSolValue::String(s.clone()))),
        (AbiValue::Str(s), DynSolType::Bytes | DynSolType::FixedBytes(_)) => {
            let raw = decode_hex_str(s)?;
            coerce(&AbiValue::Bytes(raw), ty).map(|c| Coerced::coerced(c.value))
        }

        (AbiValue::Bytes(b) | AbiValue::FixedBytes(b), DynSolType::Function) if b.len() == 24 => {
            Ok(Coerced::coerced(DynSolValue::Function(Function::from_slice(b))))
        }

        (AbiValue::Array(elems), DynSolType::Array(inner)) => {
            let (values, score) = coerce_all(elems.iter(), std::iter::repeat(inner.as_ref()))?;
            Ok(Coerced { value: DynSolValue::Array(values), score })
        }
        (AbiValue::Array(elems), DynSolType::FixedArray(inner, len)) => {
            if elems.len() != *len {
                return Err(format!(
                    "fixed array length mismatch: expected {len}, got {}",
                    elems.len()
                ));
            }
            let (values, score) = coerce_all(elems.iter(), std::iter::repeat(inner.as_ref()))?;
            Ok(Coerced { value: DynSolValue::FixedArray(values), score })
        }
        (AbiValue::Tuple(fields), DynSolType::Tuple(types)) => {
            if fields.len() != types.len() {
                return Err(format!(
                    "tuple arity mismatch: expected {}, got {}",
                    types.len(),
                    fields.len()
                ));
            }
            let (values, score) = coerce_all(fields.iter().map(|(_, v)| v), types.iter())?;
            Ok(Coerced { value: DynSolValue::Tuple(values), score })
        }

        _ => Err(format!("cannot convert {} to {}", value.kind(), ty.sol_type_name())),
    }
}

/// Coerce a positional argument list. The total score is the sum of the
/// argument scores.
pub fn coerce_args(args: &[AbiValue], types: &[DynSolType]) -> Result<Coerced, String> {
    if args.len() != types.len() {
        return Err(format!(
            "argument count mismatch: expected {}, got {}",
            types.len(),
            args.len()
        ));
    }
    let mut values = Vec::with_capacity(args.len());
    let mut score = 0;
    for (i, (arg, ty)) in args.iter().zip(types).enumerate() {
        let c = coerce(arg, ty).map_err(|e| format!("argument {i}: {e}"))?;
        score += c.score;
        values.push(c.value);
    }
    Ok(Coerced { value: DynSolValue::Tuple(values), score })
}

fn coerce_all<'a>(
    values: impl Iterator<Item = &'a AbiValue>,
    types: impl Iterator<Item = &'a DynSolType>,
) -> Result<(Vec<DynSolValue>, u32), String> {
    let mut out = Vec::new();
    let mut score = EXACT;
    for (v, t) in values.zip(types) {
        let c = coerce(v, t)?;
        score += c.score;
        out.push(c.value);
    }
    Ok((out, score))
}

fn check_uint(u: U256, bits: usize) -> Result<(), String> {
    if u.bit_len() > bits {
        return Err(format!("{u} does not fit in uint{bits}"));
    }
    Ok(())
}

/// Inclusive `(min, max)` of a signed integer of `bits` width.
fn int_bounds(bits: usize) -> (I256, I256) {
    if bits >= 256 {
        return (I256::MIN, I256::MAX);
    }
    let max = I256::from_raw((U256::from(1u8) << (bits - 1)) - U256::from(1u8));
    (I256::MINUS_ONE - max, max)
}

fn right_pad(b: &[u8]) -> B256 {
    let mut word = B256::ZERO;
    word[..b.len()].copy_from_slice(b);
    word
}

fn decode_hex_str(s: &str) -> Result<Vec<u8>, String> {
    let stripped = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("expected 0x-prefixed hex, got '{s}'"))?;
    hex::decode(stripped).map_err(|e| format!("invalid hex '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> DynSolType {
        s.parse().unwrap()
    }

    #[test]
    fn uint_width_checked() {
        assert_eq!(coerce(&AbiValue::from(255u64), &ty("uint8")).unwrap().score, EXACT);
        assert!(coerce(&AbiValue::from(256u64), &ty("uint8")).is_err());
    }

    #[test]
    fn signed_bounds() {
        assert!(coerce(&AbiValue::Int(I256::try_from(-128i64).unwrap()), &ty("int8")).is_ok());
        assert!(coerce(&AbiValue::Int(I256::try_from(-129i64).unwrap()), &ty("int8")).is_err());
        assert!(coerce(&AbiValue::Int(I256::try_from(127i64).unwrap()), &ty("int8")).is_ok());
        assert!(coerce(&AbiValue::Int(I256::try_from(128i64).unwrap()), &ty("int8")).is_err());
        assert_eq!(coerce(&AbiValue::from(127u64), &ty("int8")).unwrap().score, COERCED);
        assert!(coerce(&AbiValue::from(128u64), &ty("int8")).is_err());
        assert!(coerce(&AbiValue::Int(I256::MINUS_ONE), &ty("uint256")).is_err());
    }

    #[test]
    fn address_coercions() {
        let s = AbiValue::from("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert_eq!(coerce(&s, &ty("address")).unwrap().score, COERCED);
        assert!(coerce(&AbiValue::from("vitalik.eth"), &ty("address")).is_err());
        assert!(coerce(&AbiValue::Bytes(vec![0; 20]), &ty("address")).is_ok());
        assert!(coerce(&AbiValue::Bytes(vec![0; 19]), &ty("address")).is_err());
    }

    #[test]
    fn short_bytes_padded_into_fixed() {
        let c = coerce(&AbiValue::Bytes(vec![0xab]), &ty("bytes32")).unwrap();
        assert_eq!(c.score, COERCED);
        match c.value {
            DynSolValue::FixedBytes(word, 32) => {
                assert_eq!(word[0], 0xab);
                assert_eq!(word[31], 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(coerce(&AbiValue::Bytes(vec![0; 5]), &ty("bytes4")).is_err());
        assert_eq!(
            coerce(&AbiValue::FixedBytes(vec![1; 4]), &ty("bytes4")).unwrap().score,
            EXACT
        );
    }

    #[test]
    fn hex_string_to_bytes() {
        let c = coerce(&AbiValue::from("0xdeadbeef"), &ty("bytes")).unwrap();
        assert_eq!(c.score, COERCED);
        assert!(coerce(&AbiValue::from("deadbeef"), &ty("bytes")).is_err());
    }

    #[test]
    fn composite_scores_sum_children() {
        let arr = AbiValue::array([AbiValue::from(1u64), AbiValue::from(2u64)]);
        assert_eq!(coerce(&arr, &ty("uint256[]")).unwrap().score, EXACT + 2 * EXACT);
        assert!(coerce(&arr, &ty("uint256[3]")).is_err());

        let tup = AbiValue::tuple([AbiValue::from(1u64), AbiValue::from("0x00000000000000000000000000000000000000aa")]);
        assert_eq!(coerce(&tup, &ty("(uint256,address)")).unwrap().score, EXACT + EXACT + COERCED);
        assert!(coerce(&tup, &ty("(uint256)")).is_err());
    }

    #[test]
    fn family_mismatch_rejected() {
        let err = coerce(&AbiValue::Bool(true), &ty("uint256")).unwrap_err();
        assert_eq!(err, "cannot convert bool to uint256");
        assert!(coerce_args(&[AbiValue::from(1u64)], &[ty("uint256"), ty("bool")]).is_err());
    }
}
