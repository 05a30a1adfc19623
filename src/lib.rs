#![doc = include_str!("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
mod internal;
mod payload;
pub mod platform;
mod raw;

pub use payload::Payload;
pub use raw::Record;

extern crate alloc;

use crate::error::Error;
use crate::platform::Device;
use core::marker::PhantomData;
#[cfg(feature = "defmt")]
use defmt::trace;

/// One wear-leveled region of a byte-addressable EEPROM.
///
/// A region spans `slots` contiguous on-media records of payload type `V`,
/// starting at byte offset `base` of the device. Writes rotate through the
/// slots so each cell is touched once per `slots` updates, and [`open`]
/// recovers the newest committed value by scanning the records, including
/// after a reset mid-write.
///
/// With wear leveling disabled at construction, the region is a plain
/// indexed array of raw payloads instead (no sequence, no checksum); see
/// [`read_at`] and [`write_at`]. The mode is fixed for the lifetime of the
/// region.
///
/// Multiple regions can share one device by chaining base addresses through
/// [`end_addr`]. The region holds its device exclusively; callers that need
/// it back (for another region, or for direct access) take it out with
/// [`release`].
///
/// [`open`]: Region::open
/// [`read_at`]: Region::read_at
/// [`write_at`]: Region::write_at
/// [`end_addr`]: Region::end_addr
/// [`release`]: Region::release
pub struct Region<V, D> {
    pub(crate) device: D,
    pub(crate) base: u32,
    pub(crate) end: u32,
    pub(crate) slots: u32,
    pub(crate) head: u32,
    pub(crate) last: u32,
    pub(crate) next_seq: u32,
    pub(crate) wear_leveling: bool,
    pub(crate) blank: bool,
    _value: PhantomData<V>,
}

impl<V: Payload, D: Device> Region<V, D> {
    /// Lay a region of `slots` records over the device, starting at byte
    /// offset `base`. Performs no I/O: call [`open`](Region::open) before
    /// pushing to recover the ring state from the media.
    ///
    /// Fails if `slots < 2` (a ring needs room for a sequence break) or if
    /// the region would run past the device capacity.
    pub fn new(device: D, base: u32, slots: u32, wear_leveling: bool) -> Result<Self, Error> {
        if slots < 2 {
            return Err(Error::InvalidSlotCount);
        }

        let stride = if wear_leveling {
            raw::record_len::<V>()
        } else {
            V::SIZE
        };
        let stride = u32::try_from(stride).map_err(|_| Error::RegionOutOfBounds)?;
        let end = slots
            .checked_mul(stride)
            .and_then(|size| base.checked_add(size))
            .ok_or(Error::RegionOutOfBounds)?;
        if end as usize > device.capacity() {
            return Err(Error::RegionOutOfBounds);
        }

        #[cfg(feature = "defmt")]
        trace!(
            "region: [{:#06x}, {:#06x}), {} slots of {} bytes",
            base, end, slots, stride
        );

        Ok(Self {
            device,
            base,
            end,
            slots,
            head: 0,
            last: 0,
            next_seq: 0,
            wear_leveling,
            blank: true,
            _value: PhantomData,
        })
    }

    /// Recover `(head, last, next_seq)` by scanning the on-media records.
    ///
    /// A freshly wiped region opens as blank. A record torn by power loss
    /// during the most recent `push` is detected by its checksum and
    /// skipped; the value before it is recovered instead. Returns
    /// [`Error::Corrupted`] if no consistent state can be established, in
    /// which case the region has to be wiped.
    pub fn open(&mut self) -> Result<(), Error> {
        self.require_wear_leveling()?;
        self.scan()
    }

    /// Store `value` as the new most-recent payload.
    ///
    /// The record lands at `head`, then the ring advances. When this
    /// returns `Ok`, the value is durable: a reset at any later point
    /// recovers it through [`open`](Region::open). On a device error the
    /// ring state is left unchanged.
    pub fn push(&mut self, value: &V) -> Result<(), Error> {
        self.require_wear_leveling()?;
        self.append(value)
    }

    /// The most recently pushed payload.
    ///
    /// On a blank region (wiped and not yet written, or constructed and
    /// not yet opened) this returns `V::default()`.
    pub fn get_last(&mut self) -> Result<V, Error>
    where
        V: Default,
    {
        self.require_wear_leveling()?;
        if self.blank {
            return Ok(V::default());
        }
        let (record, _) = self.read_record(self.last)?;
        Ok(record.value)
    }

    /// Raw record at slot `index` (reduced modulo the slot count), with its
    /// stored sequence and checksum. Diagnostic.
    pub fn peek(&mut self, index: u32) -> Result<Record<V>, Error> {
        self.require_wear_leveling()?;
        Ok(self.read_record(index)?.0)
    }

    /// Read the payload at slot `index` (reduced modulo the slot count).
    /// Passthrough mode only.
    pub fn read_at(&mut self, index: u32) -> Result<V, Error> {
        self.require_passthrough()?;
        self.load_raw(index)
    }

    /// Write `value` at slot `index` (reduced modulo the slot count).
    /// Passthrough mode only.
    pub fn write_at(&mut self, index: u32, value: &V) -> Result<(), Error> {
        self.require_passthrough()?;
        self.store_raw(index, value)
    }

    /// Write the erased pattern (`0xFF`) over the first `span` bytes of the
    /// device, in 8-byte bursts.
    ///
    /// This deliberately starts at device offset 0 and ignores the region's
    /// own bounds: it is a device-wide utility, able to reach regions
    /// chained behind this one. In-memory ring state is untouched; re-open
    /// affected regions afterwards. For a bounded erase of this region
    /// only, use [`wipe_region`](Region::wipe_region).
    pub fn wipe(&mut self, span: u32) -> Result<(), Error> {
        self.fill_blank(0, span)
    }

    /// [`wipe`](Region::wipe) across the whole device capacity.
    pub fn wipe_all(&mut self) -> Result<(), Error> {
        let span = self.device.capacity() as u32;
        self.fill_blank(0, span)
    }

    /// Write the erased pattern over this region only, `[base, end_addr)`,
    /// and reset the ring state to blank. Unlike [`wipe`](Region::wipe),
    /// no re-open is needed afterwards.
    pub fn wipe_region(&mut self) -> Result<(), Error> {
        let span = self.end - self.base;
        self.fill_blank(self.base, span)?;
        self.head = 0;
        self.last = 0;
        self.next_seq = 0;
        self.blank = true;
        Ok(())
    }

    /// One past the last byte of this region. Chaining base address for the
    /// next region on the same device.
    pub fn end_addr(&self) -> u32 {
        self.end
    }

    /// Slot that receives the next push.
    pub fn head(&self) -> u32 {
        self.head
    }

    /// Slot holding the most recently committed record.
    pub fn last(&self) -> u32 {
        self.last
    }

    /// Sequence number the next push will be stamped with.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Number of slots in the ring.
    pub fn slots(&self) -> u32 {
        self.slots
    }

    /// Whether the region has seen no write since the last wipe (as
    /// established by [`open`](Region::open)).
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Whether this region wear-levels its writes.
    pub fn is_wear_leveling(&self) -> bool {
        self.wear_leveling
    }

    /// Take the device back out of the region, consuming it.
    pub fn release(self) -> D {
        self.device
    }

    fn require_wear_leveling(&self) -> Result<(), Error> {
        if self.wear_leveling {
            Ok(())
        } else {
            Err(Error::WearLevelingDisabled)
        }
    }

    fn require_passthrough(&self) -> Result<(), Error> {
        if self.wear_leveling {
            Err(Error::WearLevelingEnabled)
        } else {
            Ok(())
        }
    }
}
