//! Driver for the MLX90381 magnetic position sensor

use embedded_hal::{delay::DelayNs, digital::PinState, i2c::I2c};

use crate::{
    error::{Error, WakeFailure},
    line::{FlexLine, LineRole, Pull},
    register::{
        DEVICE_ADDRESS, MTP_LOCK_KEY, MTP_SETTLE_MS, Mode, MtpMode, REG_MAX_BATCH_WORDS,
        REGISTER_SPACE_START, Register,
    },
};

/// Poll budget for the output drivers to disengage. The drivers switch off
/// within 250 µs when the overcurrent sink is effective.
const WAKE_DRIVER_OFF_POLLS: u8 = 25;
/// Clock pulses the sensor counts before re-enabling its I2C interface.
const WAKE_CLOCK_PULSES: u8 = 8;
/// Poll budget for the acknowledge pull-up, which engages within 50 µs.
const WAKE_ACK_POLLS: u8 = 10;
/// Gap between acknowledge polls in µs, fixed independently of the bus rate.
const WAKE_ACK_POLL_US: u32 = 5;

/// Floor for the derived wake-up unit delay in µs.
const MIN_UNIT_DELAY_US: u32 = 5;

/// Largest read transfer in words. The sensor's whole memory map is smaller
/// than this.
const READ_BUF_WORDS: usize = 32;

/// Bus timing parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    baud_rate: u32,
    instruction_overhead_us: u32,
    unit_delay_us: u32,
}

impl TimingProfile {
    /// Derive the wake-up timing from the target bus rate and the host's
    /// per-instruction overhead.
    ///
    /// The unit delay is half the bus period minus the overhead, floored at
    /// 5 µs: for a 25 kHz bus and 5 µs overhead, 20 - 5 = 15 µs.
    #[must_use]
    pub const fn new(baud_rate: u32, instruction_overhead_us: u32) -> Self {
        let half_period = 1_000_000 / baud_rate / 2;
        let unit_delay_us = if half_period > instruction_overhead_us {
            half_period - instruction_overhead_us
        } else {
            MIN_UNIT_DELAY_US
        };
        Self {
            baud_rate,
            instruction_overhead_us,
            unit_delay_us,
        }
    }

    /// Target bus rate in Hz.
    #[must_use]
    pub const fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Per-instruction overhead subtracted from the half bus period, in µs.
    #[must_use]
    pub const fn instruction_overhead_us(&self) -> u32 {
        self.instruction_overhead_us
    }

    /// The unit delay every wake-up wait is a multiple of, in µs.
    #[must_use]
    pub const fn unit_delay_us(&self) -> u32 {
        self.unit_delay_us
    }
}

impl Default for TimingProfile {
    /// 25 kHz bus with 5 µs instruction overhead.
    fn default() -> Self {
        Self::new(25_000, 5)
    }
}

/// MLX90381 driver instance
///
/// Owns the I2C transport, the two bus lines and the delay provider. Every
/// operation takes `&mut self` and blocks until it completes or fails, so a
/// second in-flight operation on the same handle is unrepresentable; wrap
/// the driver in a mutex if it has to be shared across contexts.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mlx90381<I2C, SCL, SDA, D> {
    i2c: I2C,
    scl: SCL,
    sda: SDA,
    delay: D,
    timing: TimingProfile,
    mode: Option<Mode>,
    mtp_mode: Option<MtpMode>,
}

impl<I2C, SCL, SDA, D, E> Mlx90381<I2C, SCL, SDA, D>
where
    I2C: I2c<Error = E>,
    SCL: FlexLine,
    SDA: FlexLine,
    D: DelayNs,
{
    /// Create a new MLX90381 driver instance with the default timing.
    pub fn new(i2c: I2C, scl: SCL, sda: SDA, delay: D) -> Self {
        Self::with_timing(i2c, scl, sda, delay, TimingProfile::default())
    }

    /// Create a driver instance with an explicit timing profile.
    pub fn with_timing(i2c: I2C, scl: SCL, sda: SDA, delay: D, timing: TimingProfile) -> Self {
        Self {
            i2c,
            scl,
            sda,
            delay,
            timing,
            mode: None,
            mtp_mode: None,
        }
    }

    /// Release the bus, lines and delay provider, consuming the driver
    pub fn release(self) -> (I2C, SCL, SDA, D) {
        (self.i2c, self.scl, self.sda, self.delay)
    }

    /// The timing profile this instance was constructed with.
    #[must_use]
    pub fn timing(&self) -> &TimingProfile {
        &self.timing
    }

    /// Operating mode of the last confirmed command-register write, `None`
    /// before the first successful transition.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// MTP sub-mode of the last confirmed MTP-control write, `None` before
    /// the first successful transition.
    #[must_use]
    pub fn mtp_mode(&self) -> Option<MtpMode> {
        self.mtp_mode
    }

    /// Wake the sensor's I2C interface (PTC entry).
    ///
    /// The sensor's output stage cannot be queried over the bus, so the
    /// sequence forces it off electrically: sinking more than 500 µA
    /// through SDA disengages the output drivers, eight clock pulses on SCL
    /// arm the interface, and the sensor acknowledges by engaging its
    /// internal pull-up on SDA. Both lines are bit-banged throughout and
    /// handed back to the bus controller before returning, on success and
    /// on failure alike.
    ///
    /// The pulse train and acknowledge window are timing-critical; run this
    /// with interrupts masked if the host cannot otherwise keep the
    /// sequence from being stretched by preemption.
    ///
    /// # Errors
    ///
    /// [`Error::WakeFailed`] if the output drivers never disengaged or the
    /// sensor never acknowledged the clock pulses. The driver remains
    /// usable; the caller may retry or fall back to normal bus use.
    pub fn ptc_entry(&mut self) -> Result<(), Error<E>> {
        let unit = self.timing.unit_delay_us();

        // Sink the overcurrent through SDA; the sensor's 100 kOhm
        // pull-downs then take SCL low once its drivers let go.
        self.sda.set_role(LineRole::Output, Pull::None);
        self.sda.write_level(PinState::Low);
        self.scl.set_role(LineRole::Input, Pull::Down);

        self.delay.delay_us(unit * 2);

        let mut drivers_off = false;
        for _ in 0..WAKE_DRIVER_OFF_POLLS {
            if self.scl.read_level() == PinState::Low {
                drivers_off = true;
                break;
            }
            self.delay.delay_us(unit);
        }
        if !drivers_off {
            #[cfg(feature = "defmt")]
            defmt::warn!("wake-up: output drivers still active after {} polls", WAKE_DRIVER_OFF_POLLS);
            self.rearm_bus();
            return Err(Error::WakeFailed(WakeFailure::OutputsStillDriven));
        }

        // Take over the clock for the pulse train; SDA floats so the
        // sensor can answer on it.
        self.scl.set_role(LineRole::Output, Pull::None);
        self.scl.write_level(PinState::Low);
        self.sda.set_role(LineRole::Input, Pull::None);

        self.delay.delay_us(unit);

        for _ in 0..WAKE_CLOCK_PULSES {
            self.scl.write_level(PinState::High);
            self.delay.delay_us(unit);
            // Dummy sample, keeps both clock phases bus-read length
            let _ = self.sda.read_level();
            self.scl.write_level(PinState::Low);
            self.delay.delay_us(unit);
            let _ = self.sda.read_level();
        }

        // The internal 10 kOhm pull-up engages once all eight pulses are
        // counted.
        self.scl.write_level(PinState::High);
        self.delay.delay_us(unit);

        let mut acknowledged = false;
        for _ in 0..WAKE_ACK_POLLS {
            if self.sda.read_level() == PinState::High {
                acknowledged = true;
                break;
            }
            self.delay.delay_us(WAKE_ACK_POLL_US);
        }
        if !acknowledged {
            #[cfg(feature = "defmt")]
            defmt::warn!("wake-up: no acknowledge within {} polls", WAKE_ACK_POLLS);
            self.delay.delay_us(unit * 10);
            self.rearm_bus();
            return Err(Error::WakeFailed(WakeFailure::NotAcknowledged));
        }

        self.scl.write_level(PinState::Low);
        self.delay.delay_us(unit);

        // STOP condition: SDA low-to-high while SCL is high.
        self.scl.write_level(PinState::High);
        self.delay.delay_us(unit);
        self.sda.set_role(LineRole::Output, Pull::None);
        self.sda.write_level(PinState::High);
        self.delay.delay_us(unit);

        self.rearm_bus();

        #[cfg(feature = "defmt")]
        defmt::debug!("wake-up: interface active");

        Ok(())
    }

    /// Hand both lines back to the bus controller.
    fn rearm_bus(&mut self) {
        self.scl.set_role(LineRole::Peripheral, Pull::None);
        self.sda.set_role(LineRole::Peripheral, Pull::None);
    }

    /// Park both lines as high-impedance inputs.
    ///
    /// Call this after a programming session so the sensor's pins are not
    /// contended while the driver sits idle.
    pub fn release_outputs(&mut self) {
        self.scl.set_role(LineRole::Input, Pull::None);
        self.sda.set_role(LineRole::Input, Pull::None);
    }

    /// Read `words.len()` 16-bit words starting at `addr`.
    ///
    /// Reads are legal anywhere in the map, MTP and register space alike.
    /// One addressed transaction with a repeated start; each word arrives
    /// big-endian. Either every word is filled in or the slice is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`Error::TransferTooLong`] if the slice exceeds the transaction
    /// buffer (32 words), [`Error::Communication`] if the transfer fails.
    pub fn read_memory(&mut self, addr: u16, words: &mut [u16]) -> Result<(), Error<E>> {
        if words.len() > READ_BUF_WORDS {
            return Err(Error::TransferTooLong);
        }
        let mut buf = [0u8; READ_BUF_WORDS * 2];
        let buf = &mut buf[..words.len() * 2];

        self.i2c
            .write_read(DEVICE_ADDRESS, &addr.to_be_bytes(), buf)
            .map_err(Error::Communication)?;

        for (word, bytes) in words.iter_mut().zip(buf.chunks_exact(2)) {
            *word = u16::from_be_bytes([bytes[0], bytes[1]]);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("read {} words at 0x{:04X}", words.len(), addr);

        Ok(())
    }

    /// Write a batch of words to the register space in one transaction.
    ///
    /// `addr` must be at or above the register-space boundary. Slices
    /// longer than the sensor's register batch limit are clamped to
    /// [`REG_MAX_BATCH_WORDS`] words. Words are packed big-endian.
    ///
    /// # Errors
    ///
    /// [`Error::AddressSpace`] if `addr` falls in MTP space (nothing is
    /// transferred), [`Error::Communication`] if the transfer fails.
    pub fn write_registers(&mut self, addr: u16, words: &[u16]) -> Result<(), Error<E>> {
        if addr < REGISTER_SPACE_START {
            return Err(Error::AddressSpace(addr));
        }
        let words = &words[..words.len().min(REG_MAX_BATCH_WORDS)];

        let mut buf = [0u8; 2 + REG_MAX_BATCH_WORDS * 2];
        buf[..2].copy_from_slice(&addr.to_be_bytes());
        for (chunk, word) in buf[2..].chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        let frame = &buf[..2 + words.len() * 2];

        if let Err(e) = self.i2c.write(DEVICE_ADDRESS, frame) {
            #[cfg(feature = "defmt")]
            defmt::warn!("register write failed at 0x{:04X}", addr);
            return Err(Error::Communication(e));
        }

        Ok(())
    }

    /// Program MTP words one at a time, settling after each.
    ///
    /// `addr` must be below the register-space boundary and the whole run
    /// must stay there. MTP cells cannot be batch-programmed: every word is
    /// its own addressed transaction (addresses advance by 2), followed by
    /// the mandatory erase/write settle time. The first failing word aborts
    /// the run; words already programmed stay programmed.
    ///
    /// # Errors
    ///
    /// [`Error::AddressSpace`] if the run touches register space (nothing
    /// is transferred), [`Error::MtpProgramming`] carrying the failing
    /// word's address if a transfer fails partway.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_mtp(&mut self, addr: u16, words: &[u16]) -> Result<(), Error<E>> {
        let end = u32::from(addr) + words.len() as u32 * 2;
        if addr >= REGISTER_SPACE_START || end > u32::from(REGISTER_SPACE_START) {
            return Err(Error::AddressSpace(addr));
        }

        for (i, &word) in words.iter().enumerate() {
            let word_addr = addr + (i as u16) * 2;

            let mut frame = [0u8; 4];
            frame[..2].copy_from_slice(&word_addr.to_be_bytes());
            frame[2..].copy_from_slice(&word.to_be_bytes());

            if let Err(e) = self.i2c.write(DEVICE_ADDRESS, &frame) {
                #[cfg(feature = "defmt")]
                defmt::warn!("MTP write failed at 0x{:04X} (word {})", word_addr, i);
                return Err(Error::MtpProgramming {
                    address: word_addr,
                    source: e,
                });
            }

            #[cfg(feature = "defmt")]
            defmt::trace!("MTP[0x{:04X}] = 0x{:04X}", word_addr, word);

            // Erase/write cycle per word; the cells need at least 10 ms.
            self.delay.delay_ms(MTP_SETTLE_MS);
        }

        Ok(())
    }

    /// Permanently lock the MTP array against further programming.
    ///
    /// Programs the lock key into the lock word through the single-word MTP
    /// path. This is irreversible: once the lock word is set the sensor
    /// never accepts another MTP write.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_mtp`].
    pub fn lock_mtp(&mut self) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("programming MTP lock");
        self.write_mtp(Register::MtpLock.into(), &[MTP_LOCK_KEY])
    }

    /// Switch the sensor's operating mode.
    ///
    /// One write of the mode's opcode to the command register. The cached
    /// [`Self::mode`] only changes once the sensor has acknowledged the
    /// write; on failure it keeps its previous value and the write's error
    /// is returned unmodified. There is no automatic retry.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_registers`].
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("command register <- 0x{:04X}", mode.opcode());
        self.write_registers(mode.register().into(), &[mode.opcode()])?;
        self.mode = Some(mode);
        Ok(())
    }

    /// Switch the MTP controller's sub-mode.
    ///
    /// One write of the sub-mode's opcode to the MTP control register; the
    /// cached [`Self::mtp_mode`] commits only on success, like
    /// [`Self::set_mode`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_registers`].
    pub fn set_mtp_mode(&mut self, mode: MtpMode) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("MTP control register <- 0x{:04X}", mode.opcode());
        self.write_registers(mode.register().into(), &[mode.opcode()])?;
        self.mtp_mode = Some(mode);
        Ok(())
    }
}
