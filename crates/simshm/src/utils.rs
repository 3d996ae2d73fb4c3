//! Bounds-checked little-endian field access for the region layout.
//!
//! Every read returns `None` instead of panicking when the field would run
//! past the end of `bytes`; the producer is untrusted.

pub(crate) fn le_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let raw = bytes.get(offset..end)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

pub(crate) fn le_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    let raw = bytes.get(offset..end)?;
    Some(u64::from_le_bytes(raw.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let bytes = [0x53, 0x52, 0x49, 0x41, 1, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(le_u32(&bytes, 0), Some(0x4149_5253));
        assert_eq!(le_u64(&bytes, 4), Some(1));
    }

    #[test]
    fn test_out_of_range_reads_are_none() {
        let bytes = [0u8; 6];
        assert_eq!(le_u32(&bytes, 3), None);
        assert_eq!(le_u64(&bytes, 0), None);
        assert_eq!(le_u32(&bytes, usize::MAX - 1), None);
    }
}
