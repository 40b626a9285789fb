//! `Codec` for the composite variants: fixed arrays, length-prefixed
//! sequences, maps, and optional references. Records are handled by the
//! [`crate::record!`] macro rather than a blanket impl, since Rust has no
//! reflection to walk a struct's fields generically.

use std::collections::BTreeMap;

use crate::intser::{decode_u32, encode_u32};

use super::signature::{array_signature, map_signature, optional_signature, sequence_signature};
use super::Codec;

impl<T: Codec, const N: usize> Codec for [T; N] {
    fn signature() -> String {
        array_signature(N, &T::signature())
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        for item in self {
            item.encode(buf);
        }
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(buf, pos)?);
        }
        items.try_into().ok()
    }
}

impl<T: Codec> Codec for Vec<T> {
    fn signature() -> String {
        sequence_signature(&T::signature())
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&encode_u32(self.len() as u32));
        for item in self {
            item.encode(buf);
        }
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let len = decode_u32(buf.get(*pos..*pos + 4)?)?;
        *pos += 4;
        let mut items = Vec::with_capacity(len as usize);
        for _ in 0..len {
            items.push(T::decode(buf, pos)?);
        }
        Some(items)
    }
}

impl<T: Codec> Codec for Option<T> {
    fn signature() -> String {
        optional_signature(&T::signature())
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Some(value) => {
                buf.push(0xFF);
                value.encode(buf);
            }
            None => buf.push(0x00),
        }
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let discriminator = *buf.get(*pos)?;
        *pos += 1;
        match discriminator {
            0x00 => Some(None),
            _ => T::decode(buf, pos).map(Some),
        }
    }
}

/// Encoded as a deterministic, ascending-key-ordered sequence of pairs;
/// decoding reconstructs a mapping without guaranteeing iteration order
/// matches encode order. `BTreeMap` is used on both sides purely because
/// it's an ordered map already in the crate's dependency-free toolkit.
impl<K: Codec + Ord, V: Codec> Codec for BTreeMap<K, V> {
    fn signature() -> String {
        map_signature(&K::signature(), &V::signature())
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&encode_u32(self.len() as u32));
        for (key, value) in self {
            key.encode(buf);
            value.encode(buf);
        }
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let len = decode_u32(buf.get(*pos..*pos + 4)?)?;
        *pos += 4;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::decode(buf, pos)?;
            let value = V::decode(buf, pos)?;
            map.insert(key, value);
        }
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_array_round_trip() {
        let arr: [u32; 3] = [1, 2, 3];
        let mut buf = Vec::new();
        arr.encode(&mut buf);
        assert_eq!(<[u32; 3]>::decode(&buf, &mut 0), Some(arr));
        assert_eq!(<[u32; 3]>::signature(), "[3]uint32");
    }

    #[test]
    fn sequence_round_trip_including_empty() {
        let empty: Vec<u8> = vec![];
        let mut buf = Vec::new();
        empty.encode(&mut buf);
        assert_eq!(Vec::<u8>::decode(&buf, &mut 0), Some(empty));

        let v = vec![10u8, 20, 30];
        let mut buf = Vec::new();
        v.encode(&mut buf);
        assert_eq!(Vec::<u8>::decode(&buf, &mut 0), Some(v));
    }

    #[test]
    fn optional_round_trip() {
        let mut buf = Vec::new();
        Some(7u32).encode(&mut buf);
        assert_eq!(Option::<u32>::decode(&buf, &mut 0), Some(Some(7)));

        let mut buf = Vec::new();
        None::<u32>.encode(&mut buf);
        assert_eq!(Option::<u32>::decode(&buf, &mut 0), Some(None));
    }

    #[test]
    fn map_round_trip_unordered_reconstruction() {
        let mut map = BTreeMap::new();
        map.insert(3u8, 100u32);
        map.insert(1u8, 200u32);
        let mut buf = Vec::new();
        map.encode(&mut buf);
        assert_eq!(BTreeMap::<u8, u32>::decode(&buf, &mut 0), Some(map));
    }

    #[test]
    fn container_signatures() {
        assert_eq!(Vec::<u8>::signature(), "[]uint8");
        assert_eq!(Option::<u32>::signature(), "*uint32");
        assert_eq!(BTreeMap::<u8, u32>::signature(), "map[uint8]uint32");
    }
}
