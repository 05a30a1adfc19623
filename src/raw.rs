//! On-media record layout.
//!
//! One slot holds `payload[S] || seq[4, LE] || crc[1]`, packed with no
//! padding. Erased cells read `0xFF`, so a never-written slot decodes to
//! `seq == 0xFFFF_FFFF`; blankness is always judged on the sequence field,
//! never on the checksum (for odd `S`, an all-ones payload checksums to
//! `0xFF` as well).

use crate::payload::Payload;
use alloc::vec;
use alloc::vec::Vec;

/// Byte state of an erased cell.
pub(crate) const BLANK: u8 = 0xFF;

/// Sequence value of a slot that has never been written.
pub(crate) const SEQ_BLANK: u32 = u32::MAX;

pub(crate) const SEQ_LEN: usize = 4;
pub(crate) const CRC_LEN: usize = 1;

/// On-media size of one wear-leveled slot.
pub(crate) const fn record_len<V: Payload>() -> usize {
    V::SIZE + SEQ_LEN + CRC_LEN
}

/// One decoded slot, as it sits on the media.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record<V> {
    /// The deserialized payload.
    pub value: V,
    /// Monotone write counter stamped when this record was written.
    /// `0xFFFF_FFFF` on a blank slot.
    pub seq: u32,
    /// Stored checksum byte: XOR over the serialized payload bytes.
    pub crc: u8,
}

pub(crate) fn crc8(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |crc, &byte| crc ^ byte)
}

pub(crate) fn encode<V: Payload>(value: &V, seq: u32) -> Vec<u8> {
    let mut buf = vec![0u8; record_len::<V>()];
    value.to_bytes(&mut buf[..V::SIZE]);
    buf[V::SIZE..V::SIZE + SEQ_LEN].copy_from_slice(&seq.to_le_bytes());
    buf[V::SIZE + SEQ_LEN] = crc8(&buf[..V::SIZE]);
    buf
}

pub(crate) fn decode<V: Payload>(buf: &[u8]) -> Record<V> {
    let mut seq = [0u8; SEQ_LEN];
    seq.copy_from_slice(&buf[V::SIZE..V::SIZE + SEQ_LEN]);
    Record {
        value: V::from_bytes(&buf[..V::SIZE]),
        seq: u32::from_le_bytes(seq),
        crc: buf[V::SIZE + SEQ_LEN],
    }
}

/// Checksum verdict on an encoded record. Judged on the raw payload bytes
/// as they came off the media; a decode/re-encode round trip could mask a
/// torn payload whose decoded form re-serializes differently.
pub(crate) fn crc_matches<V: Payload>(buf: &[u8]) -> bool {
    crc8(&buf[..V::SIZE]) == buf[V::SIZE + SEQ_LEN]
}
