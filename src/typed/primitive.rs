//! `Codec` for the scalar variants: the fixed-width integers, floats,
//! complex numbers, `bool`, and `string`.

use crate::intser::{
    decode_bool, decode_f32, decode_f64, decode_i16, decode_i32, decode_i64, decode_i8, decode_u16, decode_u32,
    decode_u64, decode_u8, encode_bool, encode_f32, encode_f64, encode_i16, encode_i32, encode_i64, encode_i8,
    encode_u16, encode_u32, encode_u64, encode_u8,
};

use super::Codec;

macro_rules! impl_codec_fixed {
    ($ty:ty, $sig:literal, $enc:path, $dec:path, $n:literal) => {
        impl Codec for $ty {
            fn signature() -> String {
                $sig.to_string()
            }
            fn encode(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&$enc(*self));
            }
            fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
                let value = $dec(buf.get(*pos..*pos + $n)?)?;
                *pos += $n;
                Some(value)
            }
        }
    };
}

impl_codec_fixed!(u8, "uint8", encode_u8, decode_u8, 1);
impl_codec_fixed!(u16, "uint16", encode_u16, decode_u16, 2);
impl_codec_fixed!(u32, "uint32", encode_u32, decode_u32, 4);
impl_codec_fixed!(u64, "uint64", encode_u64, decode_u64, 8);
impl_codec_fixed!(i8, "int8", encode_i8, decode_i8, 1);
impl_codec_fixed!(i16, "int16", encode_i16, decode_i16, 2);
impl_codec_fixed!(i32, "int32", encode_i32, decode_i32, 4);
impl_codec_fixed!(i64, "int64", encode_i64, decode_i64, 8);
impl_codec_fixed!(f32, "float32", encode_f32, decode_f32, 4);
impl_codec_fixed!(f64, "float64", encode_f64, decode_f64, 8);

impl Codec for bool {
    fn signature() -> String {
        "bool".to_string()
    }
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(encode_bool(*self));
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let byte = *buf.get(*pos)?;
        *pos += 1;
        Some(decode_bool(byte))
    }
}

impl Codec for String {
    fn signature() -> String {
        "string".to_string()
    }
    fn encode(&self, buf: &mut Vec<u8>) {
        let bytes = self.as_bytes();
        buf.extend_from_slice(&encode_u32(bytes.len() as u32));
        buf.extend_from_slice(bytes);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        let len = decode_u32(buf.get(*pos..*pos + 4)?)? as usize;
        *pos += 4;
        let bytes = buf.get(*pos..*pos + len)?;
        *pos += len;
        String::from_utf8(bytes.to_vec()).ok()
    }
}

/// A 32-bit-component complex number: real part followed by imaginary part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

/// A 64-bit-component complex number: real part followed by imaginary part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Codec for Complex32 {
    fn signature() -> String {
        "complex32".to_string()
    }
    fn encode(&self, buf: &mut Vec<u8>) {
        self.re.encode(buf);
        self.im.encode(buf);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        Some(Self { re: f32::decode(buf, pos)?, im: f32::decode(buf, pos)? })
    }
}

impl Codec for Complex64 {
    fn signature() -> String {
        "complex64".to_string()
    }
    fn encode(&self, buf: &mut Vec<u8>) {
        self.re.encode(buf);
        self.im.encode(buf);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        Some(Self { re: f64::decode(buf, pos)?, im: f64::decode(buf, pos)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0u32)]
    #[test_case(u32::MAX)]
    fn uint32_round_trip(value: u32) {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut pos = 0;
        assert_eq!(u32::decode(&buf, &mut pos), Some(value));
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn string_round_trip() {
        let s = "hello, world".to_string();
        let mut buf = Vec::new();
        s.encode(&mut buf);
        assert_eq!(String::decode(&buf, &mut 0), Some(s));
    }

    #[test]
    fn string_decode_rejects_invalid_utf8() {
        let mut buf = encode_u32(1).to_vec();
        buf.push(0xFF);
        assert_eq!(String::decode(&buf, &mut 0), None);
    }

    #[test]
    fn complex64_round_trip() {
        let c = Complex64 { re: 1.5, im: -2.25 };
        let mut buf = Vec::new();
        c.encode(&mut buf);
        assert_eq!(Complex64::decode(&buf, &mut 0), Some(c));
    }

    #[test]
    fn signatures_match_canonical_names() {
        assert_eq!(u32::signature(), "uint32");
        assert_eq!(i64::signature(), "int64");
        assert_eq!(bool::signature(), "bool");
        assert_eq!(String::signature(), "string");
    }
}
