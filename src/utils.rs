//! Bounds-checked readers for fixed-offset integer fields.
//!
//! On-disk structures mix endianness: FAT fields are little-endian while file
//! magics are compared as big-endian words. None of these helpers panic; a field
//! that does not fit in the buffer yields `None`.

/// Extracts a big-endian 16-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 16-bit value starts.
pub fn u16_be_at(buffer: &[u8], offset: usize) -> Option<u16> {
    buffer
        .get(offset..offset.checked_add(2)?)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_be_bytes)
}

/// Extracts a big-endian 32-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 32-bit value starts.
pub fn u32_be_at(buffer: &[u8], offset: usize) -> Option<u32> {
    buffer
        .get(offset..offset.checked_add(4)?)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
}

/// Extracts a little-endian 16-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 16-bit value starts.
pub fn u16_le_at(buffer: &[u8], offset: usize) -> Option<u16> {
    buffer
        .get(offset..offset.checked_add(2)?)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
}

/// Converts a fixed-width, space or NUL padded text field into a `String`.
///
/// The field is not null-terminated; invalid bytes are replaced rather than
/// rejected.
pub fn fixed_text(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_endiannesses() {
        let buf = [0x89, 0x50, 0x4E, 0x47, 0x0D];
        assert_eq!(u16_be_at(&buf, 0), Some(0x8950));
        assert_eq!(u16_le_at(&buf, 0), Some(0x5089));
        assert_eq!(u32_be_at(&buf, 0), Some(0x89504E47));
        assert_eq!(u32_be_at(&buf, 1), Some(0x504E470D));
    }

    #[test]
    fn out_of_bounds_fields_are_none() {
        let buf = [0x4D, 0x5A, 0x00];
        assert_eq!(u16_be_at(&buf, 2), None);
        assert_eq!(u32_be_at(&buf, 0), None);
        assert_eq!(u16_le_at(&buf, usize::MAX), None);
    }

    #[test]
    fn fixed_text_strips_padding() {
        assert_eq!(fixed_text(b"FAT32   "), "FAT32");
        assert_eq!(fixed_text(b"NO NAME\0\0\0"), "NO NAME");
    }
}
