#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

//! Programming driver for the MLX90381 Triaxis magnetic position sensor.
//!
//! The MLX90381 powers up with its analog output drivers active and its I2C
//! interface dormant. Before any register or MTP access the interface has to
//! be woken through a bit-banged sequence on the shared SCL/SDA lines (the
//! vendor's "PTC entry"), after which the sensor behaves as a regular
//! 16-bit-addressed I2C peripheral. This crate implements the wake-up
//! sequence, the command/MTP mode transitions and the register and MTP
//! programming paths on top of [`embedded-hal`] 1.0 traits.
//!
//! The driver needs three capabilities from the host:
//!
//! - an [`embedded_hal::i2c::I2c`] bus for the addressed transfers,
//! - two [`FlexLine`] implementations for SCL and SDA, able to hand the
//!   pins back and forth between the I2C controller and plain GPIO,
//! - an [`embedded_hal::delay::DelayNs`] with microsecond resolution
//!   ([`CounterDelay`] adapts a free-running cycle counter if the HAL
//!   delay is too coarse).
//!
//! ```ignore
//! use mlx90381::{Mlx90381, Mode, MtpMode};
//!
//! let mut sensor = Mlx90381::new(i2c, scl, sda, delay);
//!
//! sensor.ptc_entry()?;
//! sensor.set_mode(Mode::Calibration)?;
//! sensor.set_mtp_mode(MtpMode::Write)?;
//! sensor.write_mtp(0x0000, &calibration_words)?;
//! sensor.set_mtp_mode(MtpMode::Reset)?;
//! sensor.release_outputs();
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

mod delay;
mod driver;
mod error;
mod line;
mod register;

pub use delay::CounterDelay;
pub use driver::{Mlx90381, TimingProfile};
pub use error::{Error, WakeFailure};
pub use line::{FlexLine, LineRole, Pull};
pub use register::{
    CUSTOMER_REGISTER_WORDS, DEVICE_ADDRESS, MTP_LOCK_KEY, MTP_WORDS, Mode, MtpMode,
    REG_MAX_BATCH_WORDS, REGISTER_SPACE_START, Register,
};
