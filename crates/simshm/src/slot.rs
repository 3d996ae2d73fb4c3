use crate::errors::{ShmError, SlotDefect};
use crate::header::RegionHeader;
use crate::types::{Frame, ImageKind};
use crate::utils::{le_u32, le_u64};

/// Packed RGB, one byte per channel.
pub const CHANNELS: usize = 3;

/// Per-slot header, little-endian and tightly packed, followed directly by
/// `payload_size` bytes of row-major RGB24 pixels:
///
/// | offset | field             | type |
/// |--------|-------------------|------|
/// | 0      | width             | u32  |
/// | 4      | height            | u32  |
/// | 8      | capture_timestamp | u64  |
/// | 16     | image_kind        | u32  |
/// | 20     | payload_size      | u32  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHeader {
    pub width: u32,
    pub height: u32,
    pub capture_timestamp: u64,
    pub image_kind: u32,
    pub payload_size: u32,
}

impl SlotHeader {
    pub const SIZE: usize = 24;

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            width: le_u32(bytes, 0)?,
            height: le_u32(bytes, 4)?,
            capture_timestamp: le_u64(bytes, 8)?,
            image_kind: le_u32(bytes, 16)?,
            payload_size: le_u32(bytes, 20)?,
        })
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..16].copy_from_slice(&self.capture_timestamp.to_le_bytes());
        out[16..20].copy_from_slice(&self.image_kind.to_le_bytes());
        out[20..24].copy_from_slice(&self.payload_size.to_le_bytes());
        out
    }

    /// A zero dimension means the producer has not filled this slot yet.
    pub fn is_populated(&self) -> bool {
        self.width != 0 && self.height != 0
    }

    /// `width * height * 3`, or `None` if that does not fit in `usize`.
    pub fn expected_payload_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(CHANNELS)
    }

    pub fn kind(&self) -> ImageKind {
        ImageKind::from(self.image_kind)
    }
}

/// A validated slot borrowed straight from the mapping.
///
/// The pixels alias producer memory; call [`SlotView::to_frame`] before the
/// slot is handed back.
#[derive(Debug, Clone, Copy)]
pub struct SlotView<'a> {
    pub header: SlotHeader,
    pub pixels: &'a [u8],
}

impl SlotView<'_> {
    pub fn to_frame(&self) -> Frame {
        Frame {
            width: self.header.width,
            height: self.header.height,
            capture_timestamp: self.header.capture_timestamp,
            image_kind: self.header.kind(),
            pixels: self.pixels.to_vec(),
        }
    }
}

/// Decode slot `index` out of a mapped region.
///
/// Every size the producer declares is checked against `region.len()` before
/// any pixel byte is touched. Returns `Ok(None)` for an unpopulated slot.
pub fn decode_slot<'a>(
    region: &'a [u8],
    header: &RegionHeader,
    index: u32,
) -> Result<Option<SlotView<'a>>, ShmError> {
    if index >= header.slot_count {
        return Err(ShmError::SlotOutOfBounds {
            index,
            slot_count: header.slot_count,
        });
    }

    let malformed = |defect| ShmError::MalformedSlot { index, defect };

    if (header.slot_size as usize) < SlotHeader::SIZE {
        return Err(malformed(SlotDefect::SlotTooSmall {
            slot_size: header.slot_size,
        }));
    }

    let (start, end) = header
        .slot_range(index)
        .ok_or(ShmError::SlotBeyondRegion {
            index,
            start: usize::MAX,
            end: usize::MAX,
            region_len: region.len(),
        })?;

    let slot = region.get(start..end).ok_or(ShmError::SlotBeyondRegion {
        index,
        start,
        end,
        region_len: region.len(),
    })?;

    // slot.len() >= SlotHeader::SIZE was checked above
    let Some(slot_header) = SlotHeader::parse(slot) else {
        return Err(malformed(SlotDefect::SlotTooSmall {
            slot_size: header.slot_size,
        }));
    };

    if !slot_header.is_populated() {
        return Ok(None);
    }

    let expected = slot_header
        .expected_payload_size()
        .ok_or(malformed(SlotDefect::DimensionsOverflow {
            width: slot_header.width,
            height: slot_header.height,
        }))?;

    if slot_header.payload_size as usize != expected {
        return Err(malformed(SlotDefect::PayloadMismatch {
            width: slot_header.width,
            height: slot_header.height,
            declared: slot_header.payload_size,
            expected,
        }));
    }

    let capacity = slot.len() - SlotHeader::SIZE;
    if expected > capacity {
        return Err(malformed(SlotDefect::PayloadExceedsSlot {
            payload: expected,
            capacity,
        }));
    }

    Ok(Some(SlotView {
        header: slot_header,
        pixels: &slot[SlotHeader::SIZE..SlotHeader::SIZE + expected],
    }))
}
