use thiserror::Error;

/// Errors that can occur during region operations. Marked as non-exhaustive
/// to allow for future additions without breaking the API. After a
/// successful `open`, a caller would normally only ever see `DeviceError`.
#[derive(Error, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A ring needs at least two slots to carry a sequence break.
    #[error("invalid slot count")]
    InvalidSlotCount,

    /// `base + slots * stride` runs past the end of the device.
    #[error("region exceeds device capacity")]
    RegionOutOfBounds,

    /// The internal error value is returned from the provided device.
    #[error("device i/o error")]
    DeviceError,

    /// The operation needs wear leveling, which this region was constructed
    /// without.
    #[error("wear leveling disabled")]
    WearLevelingDisabled,

    /// The operation needs passthrough mode; this region wear-levels its
    /// slots.
    #[error("wear leveling enabled")]
    WearLevelingEnabled,

    /// No sequence break was found, or no record passed its checksum during
    /// recovery. The region has to be wiped before it can be used again.
    #[error("region corrupted")]
    Corrupted,
}
