//! A recursive binary codec over a closed set of primitive, container, and
//! user-defined record types, bound to a [`crate::database::Database`] so
//! the store can hold one typed placeholder value instead of raw bytes.
//!
//! The original design walked arbitrary structured types via runtime
//! reflection; here every encodable type implements [`Codec`] instead, so
//! dispatch is static and the variant set closed at compile time (no
//! reflection surface to keep in sync with the on-disk format).

mod container;
mod db;
mod primitive;
mod signature;

pub use db::TypedDb;

/// A type that can be written to and read from a byte stream, with a
/// canonical textual signature used to detect a mismatched binding.
pub trait Codec: Sized {
    /// Canonical signature, e.g. `"uint32"`, `"[]uint8"`, `"map[uint8]uint32"`.
    fn signature() -> String;
    fn encode(&self, buf: &mut Vec<u8>);
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self>;
}

/// Encodes `value` to a fresh byte vector.
pub fn encode<T: Codec>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.encode(&mut buf);
    buf
}

/// Decodes a `T` from the start of `bytes`; trailing bytes are ignored.
pub fn decode<T: Codec>(bytes: &[u8]) -> Option<T> {
    let mut pos = 0;
    T::decode(bytes, &mut pos)
}

/// Declares `Codec` for a struct by listing its fields in declaration
/// order, matching the `record<fields…>` variant's back-to-back encoding.
///
/// ```ignore
/// struct Point { x: i32, y: i32 }
/// lazydb::record!(Point { x: i32, y: i32 });
/// ```
#[macro_export]
macro_rules! record {
    ($name:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $crate::typed::Codec for $name {
            fn signature() -> String {
                $crate::typed::record_signature(&[$(<$fty as $crate::typed::Codec>::signature()),+])
            }
            fn encode(&self, buf: &mut Vec<u8>) {
                $( $crate::typed::Codec::encode(&self.$field, buf); )+
            }
            fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
                Some(Self { $( $field: <$fty as $crate::typed::Codec>::decode(buf, pos)?, )+ })
            }
        }
    };
}

pub use signature::record_signature;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_functions_round_trip() {
        let bytes = encode(&42u32);
        assert_eq!(decode::<u32>(&bytes), Some(42));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i64,
        tag: u8,
    }
    record!(Point { x: i32, y: i64, tag: u8 });

    #[test]
    fn record_macro_round_trips_and_signs_fields_in_order() {
        let p = Point { x: -7, y: 1_000_000, tag: 9 };
        let bytes = encode(&p);
        assert_eq!(decode::<Point>(&bytes), Some(p));
        assert_eq!(Point::signature(), "struct { int32; int64; uint8 }");
    }
}
