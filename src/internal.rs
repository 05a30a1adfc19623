use crate::Region;
use crate::error::Error;
use crate::payload::Payload;
use crate::platform::Device;
use crate::raw::{self, Record, SEQ_BLANK};
use alloc::vec;
#[cfg(feature = "defmt")]
use defmt::{debug, trace, warn};

/// Wipe transactions are batched in the widest word common EEPROM drivers
/// move at once.
pub(crate) const WIPE_CHUNK: usize = 8;

impl<V: Payload, D: Device> Region<V, D> {
    /// Byte distance between adjacent slots for the active mode.
    pub(crate) fn stride(&self) -> u32 {
        if self.wear_leveling {
            raw::record_len::<V>() as u32
        } else {
            V::SIZE as u32
        }
    }

    /// Byte address of a slot. `index` is reduced modulo the slot count;
    /// circular addressing is enforced here, not by the device.
    pub(crate) fn slot_addr(&self, index: u32) -> u32 {
        self.base + (index % self.slots) * self.stride()
    }

    /// Read and decode one slot. The second element is the checksum
    /// verdict, judged on the raw bytes as read.
    pub(crate) fn read_record(&mut self, index: u32) -> Result<(Record<V>, bool), Error> {
        let mut buf = vec![0u8; raw::record_len::<V>()];
        let addr = self.slot_addr(index);
        self.device
            .read(addr, &mut buf)
            .map_err(|_| Error::DeviceError)?;
        Ok((raw::decode(&buf), raw::crc_matches::<V>(&buf)))
    }

    /// Append one record at `head`. Ring state only advances after the
    /// device write went through.
    pub(crate) fn append(&mut self, value: &V) -> Result<(), Error> {
        let buf = raw::encode(value, self.next_seq);
        let addr = self.slot_addr(self.head);

        #[cfg(feature = "defmt")]
        trace!("append: slot {} @{:#06x} seq {}", self.head, addr, self.next_seq);

        self.device.write(addr, &buf).map_err(|_| Error::DeviceError)?;

        self.last = self.head;
        self.head = (self.head + 1) % self.slots;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.blank = false;
        Ok(())
    }

    /// Rebuild `(head, last, next_seq)` from the media alone: shortcut out
    /// of a freshly wiped region, otherwise locate the sequence break and
    /// settle on the newest checksum-valid record.
    pub(crate) fn scan(&mut self) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("scan: {} slots from {:#06x}", self.slots, self.base);

        // A wiped region still carries the blank sequence in both probe
        // slots. The checksum is not consulted for blank detection.
        let (first, _) = self.read_record(0)?;
        let (second, _) = self.read_record(1)?;
        if first.seq == SEQ_BLANK && second.seq == SEQ_BLANK {
            self.head = 0;
            self.last = 0;
            self.next_seq = 0;
            self.blank = true;
            return Ok(());
        }
        self.blank = false;

        let brk = self.find_break()?;
        self.settle_head(brk)
    }

    /// First slot whose successor does not continue the sequence. The
    /// neighbor probe wraps modulo the slot count.
    fn find_break(&mut self) -> Result<u32, Error> {
        let (mut current, _) = self.read_record(0)?;
        for index in 0..self.slots {
            let (next, _) = self.read_record((index + 1) % self.slots)?;
            if next.seq.wrapping_sub(current.seq) != 1 || next.seq == SEQ_BLANK {
                return Ok(index);
            }
            current = next;
        }

        // A committed region carries exactly one break; its absence means
        // some other writer produced this layout.
        #[cfg(feature = "defmt")]
        warn!("scan: no sequence break across {} slots", self.slots);
        Err(Error::Corrupted)
    }

    /// Walk backwards from the break until a record passes its checksum.
    /// That record is the newest committed write; anything between it and
    /// the break was torn mid-write.
    fn settle_head(&mut self, brk: u32) -> Result<(), Error> {
        let mut candidate = brk;
        for _ in 0..self.slots {
            let (record, valid) = self.read_record(candidate)?;
            if valid {
                self.last = candidate;
                self.head = (candidate + 1) % self.slots;
                self.next_seq = record.seq.wrapping_add(1);

                #[cfg(feature = "defmt")]
                debug!(
                    "scan: head {} last {} next_seq {}",
                    self.head, self.last, self.next_seq
                );
                return Ok(());
            }

            #[cfg(feature = "defmt")]
            debug!("scan: checksum mismatch at slot {}, stepping back", candidate);
            candidate = if candidate == 0 { self.slots - 1 } else { candidate - 1 };
        }

        #[cfg(feature = "defmt")]
        warn!("scan: no checksum-valid record across {} slots", self.slots);
        Err(Error::Corrupted)
    }

    pub(crate) fn store_raw(&mut self, index: u32, value: &V) -> Result<(), Error> {
        let mut buf = vec![0u8; V::SIZE];
        value.to_bytes(&mut buf);
        let addr = self.slot_addr(index);
        self.device.write(addr, &buf).map_err(|_| Error::DeviceError)
    }

    pub(crate) fn load_raw(&mut self, index: u32) -> Result<V, Error> {
        let mut buf = vec![0u8; V::SIZE];
        let addr = self.slot_addr(index);
        self.device
            .read(addr, &mut buf)
            .map_err(|_| Error::DeviceError)?;
        Ok(V::from_bytes(&buf))
    }

    /// Write the erased-cell pattern over `[start, start + span)`.
    pub(crate) fn fill_blank(&mut self, start: u32, span: u32) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("wipe: {} bytes from {:#06x}", span, start);

        let pattern = [raw::BLANK; WIPE_CHUNK];
        let mut offset = 0u32;
        while offset < span {
            let len = (span - offset).min(WIPE_CHUNK as u32);
            self.device
                .write(start + offset, &pattern[..len as usize])
                .map_err(|_| Error::DeviceError)?;
            offset += len;
        }
        Ok(())
    }
}
