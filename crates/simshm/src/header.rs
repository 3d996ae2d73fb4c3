use crate::errors::ShmError;
use crate::utils::{le_u32, le_u64};

/// `'AIRS'` read as a little-endian u32.
pub const MAGIC: u32 = 0x4149_5253;

/// Bytes reserved for the header at the start of the region. Slot 0 starts here.
pub const HEADER_AREA_SIZE: usize = 4096;

/// REGION LAYOUT:
///
/// ```text
/// [0 .. 4096)                           header area, first 28 bytes used
/// [4096 + i * slot_size .. +slot_size)  slot i
/// ```
///
/// Header fields are little-endian and tightly packed:
///
/// | offset | field                 | type |
/// |--------|-----------------------|------|
/// | 0      | magic                 | u32  |
/// | 4      | slot_count            | u32  |
/// | 8      | slot_size             | u32  |
/// | 12     | write_index           | u64  |
/// | 20     | last_update_timestamp | u64  |
///
/// The producer writes the geometry once at creation. `write_index` and
/// `last_update_timestamp` keep moving afterwards and are informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHeader {
    pub magic: u32,
    pub slot_count: u32,
    pub slot_size: u32,
    pub write_index: u64,
    pub last_update_timestamp: u64,
}

impl RegionHeader {
    pub const SIZE: usize = 28;

    /// Read the header fields without validating them.
    pub fn parse(bytes: &[u8]) -> Result<Self, ShmError> {
        let too_small = || ShmError::RegionTooSmall {
            len: bytes.len(),
            required: Self::SIZE,
        };

        Ok(Self {
            magic: le_u32(bytes, 0).ok_or_else(too_small)?,
            slot_count: le_u32(bytes, 4).ok_or_else(too_small)?,
            slot_size: le_u32(bytes, 8).ok_or_else(too_small)?,
            write_index: le_u64(bytes, 12).ok_or_else(too_small)?,
            last_update_timestamp: le_u64(bytes, 20).ok_or_else(too_small)?,
        })
    }

    /// Read the header and reject anything that is not an initialized region.
    pub fn decode(bytes: &[u8]) -> Result<Self, ShmError> {
        let header = Self::parse(bytes)?;
        if header.magic != MAGIC {
            return Err(ShmError::InvalidMagic {
                found: header.magic,
            });
        }
        Ok(header)
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..8].copy_from_slice(&self.slot_count.to_le_bytes());
        out[8..12].copy_from_slice(&self.slot_size.to_le_bytes());
        out[12..20].copy_from_slice(&self.write_index.to_le_bytes());
        out[20..28].copy_from_slice(&self.last_update_timestamp.to_le_bytes());
        out
    }

    /// Byte range of slot `index` within the region, or `None` on overflow.
    pub fn slot_range(&self, index: u32) -> Option<(usize, usize)> {
        let slot_size = usize::try_from(self.slot_size).ok()?;
        let start = (index as usize)
            .checked_mul(slot_size)?
            .checked_add(HEADER_AREA_SIZE)?;
        let end = start.checked_add(slot_size)?;
        Some((start, end))
    }

    /// Total region length the header claims, or `None` on overflow.
    pub fn region_len(&self) -> Option<usize> {
        (self.slot_count as usize)
            .checked_mul(self.slot_size as usize)?
            .checked_add(HEADER_AREA_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RegionHeader {
        RegionHeader {
            magic: MAGIC,
            slot_count: 1,
            slot_size: 4096,
            write_index: 1,
            last_update_timestamp: 1000,
        }
    }

    #[test]
    fn test_magic_spells_airs() {
        assert_eq!(&MAGIC.to_le_bytes(), b"SRIA");
        assert_eq!(&MAGIC.to_be_bytes(), b"AIRS");
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode();
        assert_eq!(&bytes[0..4], &[0x53, 0x52, 0x49, 0x41]);
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &4096u32.to_le_bytes());
        assert_eq!(&bytes[12..20], &1u64.to_le_bytes());
        assert_eq!(&bytes[20..28], &1000u64.to_le_bytes());
    }

    #[test]
    fn test_decode_reencode_is_byte_identical() {
        let buffers: [[u8; RegionHeader::SIZE]; 3] = [
            sample().encode(),
            [0xAB; RegionHeader::SIZE],
            std::array::from_fn(|i| i as u8),
        ];

        for bytes in buffers {
            let header = RegionHeader::parse(&bytes).unwrap();
            assert_eq!(header.encode(), bytes);
        }
    }

    #[test]
    fn test_decode_valid_header() {
        let mut area = vec![0u8; HEADER_AREA_SIZE];
        area[..RegionHeader::SIZE].copy_from_slice(&sample().encode());

        let header = RegionHeader::decode(&area).unwrap();
        assert_eq!(header, sample());
    }

    #[test]
    fn test_wrong_magic_is_rejected_for_any_fields() {
        for (magic, slot_count, slot_size) in [
            (0xDEAD_BEEF, 1, 4096),
            (0, 0, 0),
            (MAGIC.swap_bytes(), 3, 1 << 20),
            (MAGIC + 1, u32::MAX, u32::MAX),
        ] {
            let header = RegionHeader {
                magic,
                slot_count,
                slot_size,
                ..sample()
            };
            match RegionHeader::decode(&header.encode()) {
                Err(ShmError::InvalidMagic { found }) => assert_eq!(found, magic),
                other => panic!("expected InvalidMagic, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_short_buffer_is_too_small() {
        let bytes = sample().encode();
        match RegionHeader::decode(&bytes[..20]) {
            Err(ShmError::RegionTooSmall { len, required }) => {
                assert_eq!(len, 20);
                assert_eq!(required, RegionHeader::SIZE);
            }
            other => panic!("expected RegionTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn test_slot_range() {
        let header = RegionHeader {
            slot_count: 3,
            slot_size: 8192,
            ..sample()
        };
        assert_eq!(header.slot_range(0), Some((4096, 4096 + 8192)));
        assert_eq!(header.slot_range(2), Some((4096 + 2 * 8192, 4096 + 3 * 8192)));
        assert_eq!(header.region_len(), Some(4096 + 3 * 8192));
    }
}
