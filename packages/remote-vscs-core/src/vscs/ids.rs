//! Stable ids for lines and frequencies.
//!
//! Clients reference lines and frequencies by these ids, so the same host item
//! must hash to the same id across rebuilds, restarts and processes. The hash
//! is FNV-1a 32-bit over `name ‖ 0x1F ‖ discriminator`.

use crate::host::LineType;
use crate::protocol_constants::{FNV32_OFFSET_BASIS, FNV32_PRIME, ID_FIELD_SEPARATOR};

/// FNV-1a 32-bit hash.
#[must_use]
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(FNV32_PRIME)
    })
}

fn keyed(name: &str, discriminator: &str) -> u32 {
    let mut buf = Vec::with_capacity(name.len() + 1 + discriminator.len());
    buf.extend_from_slice(name.as_bytes());
    buf.push(ID_FIELD_SEPARATOR);
    buf.extend_from_slice(discriminator.as_bytes());
    fnv1a32(&buf)
}

/// Id of a line, derived from its name and type.
#[must_use]
pub fn line_id(name: &str, line_type: LineType) -> u32 {
    keyed(name, line_type.as_str())
}

/// Id of a frequency, derived from its name and value in Hz.
#[must_use]
pub fn frequency_id(name: &str, hertz: u32) -> u32 {
    keyed(name, &hertz.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn line_id_is_deterministic() {
        assert_eq!(
            line_id("ML_GND", LineType::Direct),
            line_id("ML_GND", LineType::Direct)
        );
    }

    #[test]
    fn line_type_changes_the_id() {
        assert_ne!(
            line_id("ML_GND", LineType::Direct),
            line_id("ML_GND", LineType::Hotline)
        );
    }

    #[test]
    fn frequency_value_changes_the_id() {
        assert_ne!(
            frequency_id("ML_TWR", 120_500_000),
            frequency_id("ML_TWR", 120_550_000)
        );
    }

    #[test]
    fn separator_prevents_concatenation_collisions() {
        // "AB" + "1" vs "A" + "B1" would collide without the separator.
        assert_ne!(frequency_id("AB", 1), keyed("A", "B1"));
    }

    #[test]
    fn frequency_id_hashes_decimal_hertz() {
        let mut expected = b"ML_TWR".to_vec();
        expected.push(0x1F);
        expected.extend_from_slice(b"120500000");
        assert_eq!(frequency_id("ML_TWR", 120_500_000), fnv1a32(&expected));
    }
}
