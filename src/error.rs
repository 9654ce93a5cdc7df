/// Stage of the wake-up sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeFailure {
    /// The sensor's output drivers never disengaged (SCL was not pulled low
    /// within the poll budget).
    OutputsStillDriven,
    /// The sensor did not acknowledge the eight clock pulses (SDA was not
    /// pulled high within the poll budget).
    NotAcknowledged,
}

/// Error type for MLX90381 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the sensor, passed through from the bus
    /// unchanged. A NACK from the sensor surfaces here as the transport's
    /// no-acknowledge error.
    Communication(E),
    /// The target address lies in the wrong memory space for the requested
    /// operation. Detected before any bus traffic.
    AddressSpace(u16),
    /// The wake-up sequence did not observe the expected line transitions.
    /// Both lines are handed back to the bus controller before this is
    /// returned, so the driver remains usable for a retry.
    WakeFailed(WakeFailure),
    /// Programming an MTP word failed. Words at lower addresses were already
    /// committed and are not rolled back.
    MtpProgramming {
        /// Address of the word that failed to program.
        address: u16,
        /// The transport error reported for that word.
        source: E,
    },
    /// The requested transfer does not fit the driver's transaction buffer.
    TransferTooLong,
}
