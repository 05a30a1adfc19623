use embedded_storage::Storage;

/// Byte-addressable storage the engine runs on.
///
/// Any [`embedded_storage::Storage`] implementation qualifies. The engine
/// only issues record-sized transactions plus 8-byte bursts during a wipe,
/// all within `[0, capacity)`, and never requires an erase cycle: EEPROM
/// and FRAM cells rewrite in place. See README.md for an example
/// implementation.
pub trait Device: Storage {}

impl<T: Storage> Device for T {}
