//! Memory map and command opcodes for the MLX90381 sensor.

/// 7-bit I2C device address of the sensor.
pub const DEVICE_ADDRESS: u8 = 0x32;

/// First address of the volatile register space.
///
/// Everything below this address is MTP memory; everything at or above it is
/// register memory. No write may cross the boundary.
pub const REGISTER_SPACE_START: u16 = 0x0020;

/// Number of 16-bit words in the MTP array.
pub const MTP_WORDS: usize = 16;

/// Number of 16-bit words in the customer register file.
pub const CUSTOMER_REGISTER_WORDS: usize = 8;

/// Largest register batch accepted by the sensor in one write transaction.
pub const REG_MAX_BATCH_WORDS: usize = 6;

/// Key programmed into [`Register::MtpLock`] to permanently disable MTP
/// writes.
pub const MTP_LOCK_KEY: u16 = 0x0003;

/// Settle time after programming one MTP word, in milliseconds. The cells
/// need at least 10 ms to erase and write.
pub(crate) const MTP_SETTLE_MS: u32 = 11;

/// Word addresses in the MLX90381 memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u16)]
pub enum Register {
    /// MTP lock word. Programming [`MTP_LOCK_KEY`] here is irreversible.
    MtpLock = 0x000C,
    /// Customer register file start.
    Customer = 0x0020,
    /// Command register: selects the sensor's operating mode.
    Command = 0x0044,
    /// MTP controller register.
    MtpControl = 0x0046,
}

impl From<Register> for u16 {
    fn from(reg: Register) -> u16 {
        reg as u16
    }
}

/// Operating mode selected through the command register.
///
/// The discriminant is the opcode the sensor expects in the command
/// register for that mode, so a transition is fully described by the
/// variant itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Mode {
    /// Calibration mode: registers are writable, outputs follow the
    /// register configuration.
    Calibration = 0x544E,
    /// Normal application mode with the MTP configuration applied.
    NormalApplication = 0x944C,
    /// Application mode that keeps the calibration session valid, running
    /// from the register configuration.
    CalibrationApplication = 0x744C,
}

impl Mode {
    /// Opcode written to the command register for this mode.
    #[must_use]
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Register targeted by this transition.
    #[must_use]
    pub const fn register(self) -> Register {
        Register::Command
    }
}

/// MTP controller sub-mode selected through the MTP control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum MtpMode {
    /// Arm the MTP cells for programming.
    Write = 0x0077,
    /// Route MTP contents to the read path.
    Read = 0x0007,
    /// Deactivate the MTP controller and leave write mode.
    Reset = 0x0006,
}

impl MtpMode {
    /// Opcode written to the MTP control register for this sub-mode.
    #[must_use]
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Register targeted by this transition.
    #[must_use]
    pub const fn register(self) -> Register {
        Register::MtpControl
    }
}
