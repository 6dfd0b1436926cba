use core::fmt::{Debug, Formatter, Result as FmtResult};

use bitvec::{boxed::BitBox, vec::BitVec};
use derive_more::{Deref, DerefMut};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use static_assertions::assert_eq_size;

use crate::error::ReadError;

/// An SSZ bit list without a compile-time maximum length.
///
/// Callers are responsible for length checks against their own maximums.
/// The attestation path does this implicitly by requiring the bit list to be
/// exactly as long as the committee.
///
/// We rely on `bitvec::order::Lsb0` being the default bit ordering to match
/// the SSZ bit numbering within bytes.
#[derive(Clone, PartialEq, Eq, Default, Deref, DerefMut)]
pub struct BitList {
    #[deref]
    #[deref_mut]
    bits: BitBox<u8>,
}

assert_eq_size!(BitList, [usize; 2]);

impl BitList {
    #[must_use]
    pub fn with_length(length: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, length).into_boxed_bitslice(),
        }
    }

    fn measure_length(bytes: &[u8]) -> Result<usize, ReadError> {
        let (position, last_byte) = bytes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, byte)| **byte != 0)
            .ok_or(ReadError::BitListMissingDelimitingBit)?;

        let delimiting_bit = 7 - last_byte.leading_zeros() as usize;

        Ok(position * 8 + delimiting_bit)
    }

    fn from_vec_with_length(bytes: Vec<u8>, length: usize) -> Self {
        let mut bits = BitVec::from_vec(bytes);
        bits.truncate(length);

        Self {
            bits: bits.into_boxed_bitslice(),
        }
    }
}

impl From<BitList> for Vec<u8> {
    fn from(bit_list: BitList) -> Self {
        let length = bit_list.len();
        let mut bytes = bit_list.bits.into_bitvec().into_vec();
        bytes.resize(length / 8 + 1, 0);
        bytes[length / 8] |= 1 << (length % 8);
        bytes
    }
}

impl TryFrom<Vec<u8>> for BitList {
    type Error = ReadError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let length = Self::measure_length(bytes.as_slice())?;
        Ok(Self::from_vec_with_length(bytes, length))
    }
}

impl FromIterator<bool> for BitList {
    fn from_iter<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Self {
            bits: bits.into_iter().collect::<BitVec<u8>>().into_boxed_bitslice(),
        }
    }
}

impl Debug for BitList {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl Serialize for BitList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = Vec::from(self.clone());
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }
}

impl<'de> Deserialize<'de> for BitList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);
        let bytes = hex::decode(digits).map_err(D::Error::custom)?;
        bytes.try_into().map_err(D::Error::custom)
    }
}
