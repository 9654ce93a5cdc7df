//! Electrical role control for the two shared bus lines.

use embedded_hal::digital::PinState;

/// Electrical role of a bus line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineRole {
    /// Routed to the I2C controller (alternate function).
    Peripheral,
    /// Push-pull digital output.
    Output,
    /// High-impedance digital input.
    Input,
}

/// Pull resistor applied to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating.
    None,
    /// Pulled up.
    Up,
    /// Pulled down.
    Down,
}

/// A bus line whose electrical role can be switched at run time.
///
/// The wake-up sequence has to drive and sample SCL and SDA as plain GPIOs
/// while the I2C controller is quiesced, then hand them back. HALs express
/// this very differently (pin modes, alternate functions, pad registers), so
/// the driver only asks for this minimal capability and the board support
/// code implements it for the two pins wired to the sensor.
///
/// Contract:
///
/// - `set_role` applies immediately and synchronously; switching a line's
///   role while a bus transaction is in flight is a caller error.
/// - Switching a line out of [`LineRole::Peripheral`] detaches it from the
///   I2C controller; switching back re-attaches it, re-initializing the
///   controller if the HAL requires that.
/// - `write_level` is only meaningful in [`LineRole::Output`], `read_level`
///   only in [`LineRole::Input`].
///
/// Pad reconfiguration cannot fail on real silicon, so the methods are
/// infallible.
pub trait FlexLine {
    /// Switch the line's electrical role.
    fn set_role(&mut self, role: LineRole, pull: Pull);

    /// Drive the line to `level`.
    fn write_level(&mut self, level: PinState);

    /// Sample the line.
    fn read_level(&mut self) -> PinState;
}
