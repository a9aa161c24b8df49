//! Per-channel views over the ON/OFF tick registers.
//!
//! A channel is a pair of 12-bit timestamps within the 4096-tick PWM
//! period: the ON tick, where the output rises, and the OFF tick, where it
//! falls. [`Channel`] exposes the pair raw; [`Servo`] and [`Pwm`] are two
//! interpretations layered over the same registers: hobby-servo angle and
//! duty-cycle/phase respectively. All three borrow the driver mutably and
//! own nothing, so they are free to create and discard.

use embedded_hal::i2c::I2c;

use crate::driver::Pca9685;
use crate::error::Error;
use crate::registers::{channel_off, channel_on};

/// Raw view of one output channel's 12-bit ON/OFF tick pair.
#[derive(Debug)]
pub struct Channel<'a, I2C> {
    driver: &'a mut Pca9685<I2C>,
    index: u8,
}

impl<'a, I2C: I2c> Channel<'a, I2C> {
    pub(crate) fn new(driver: &'a mut Pca9685<I2C>, index: u8) -> Self {
        Self { driver, index }
    }

    /// The channel index this view is bound to.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Read the tick at which the output goes high.
    pub fn on(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.driver.bus().read_long(channel_on(self.index))
    }

    /// Set the tick at which the output goes high.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] if `ticks` does not fit in 12 bits.
    pub fn set_on(&mut self, ticks: u16) -> Result<(), Error<I2C::Error>> {
        self.driver.bus().write_long(channel_on(self.index), ticks)
    }

    /// Read the tick at which the output goes low.
    pub fn off(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.driver.bus().read_long(channel_off(self.index))
    }

    /// Set the tick at which the output goes low.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] if `ticks` does not fit in 12 bits.
    pub fn set_off(&mut self, ticks: u16) -> Result<(), Error<I2C::Error>> {
        self.driver.bus().write_long(channel_off(self.index), ticks)
    }
}

/// Hobby-servo view of one output channel.
///
/// Maps an angle in degrees onto the conventional 1–2 ms servo pulse,
/// assuming the chip runs at the 50 Hz frame rate (20 ms period) servos
/// expect (set that with [`Pca9685::set_frequency`] first). The mapping is
/// purely arithmetic; the driver does not check the configured frame rate.
#[derive(Debug)]
pub struct Servo<'a, I2C> {
    channel: Channel<'a, I2C>,
}

impl<'a, I2C: I2c> Servo<'a, I2C> {
    pub(crate) fn new(channel: Channel<'a, I2C>) -> Self {
        Self { channel }
    }

    /// The channel index this view is bound to.
    pub fn index(&self) -> u8 {
        self.channel.index()
    }

    /// Read the position in degrees, derived from the programmed pulse.
    ///
    /// Inverts the pulse-width mapping of [`Servo::set_position`]:
    /// a 1 ms pulse reads as 0°, a 2 ms pulse as 180°. Ticks written by
    /// other means (raw [`Channel`] access, a [`Pwm`] view) still produce
    /// an answer, which may land outside 0..=180.
    pub fn position(&mut self) -> Result<f32, Error<I2C::Error>> {
        let on = self.channel.on()?;
        let off = self.channel.off()?;
        Ok(((f32::from(off) - f32::from(on)) / 4095.0 * 20.0 - 1.0) * 180.0)
    }

    /// Move the servo to a position in degrees.
    ///
    /// Writes an ON tick of 0 and an OFF tick of
    /// `⌊4095 / 20 · (1 + angle / 180)⌋`: 1 ms of a 20 ms frame at 0°,
    /// 2 ms at 180°. Every servo pulse therefore starts at the top of the
    /// PWM period; pulses of multiple servos on one chip overlap rather
    /// than stagger, which the supply rail has to tolerate.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] unless `degrees` is in 0..=180. Nothing is
    /// written in that case.
    pub fn set_position(&mut self, degrees: f32) -> Result<(), Error<I2C::Error>> {
        if !(0.0..=180.0).contains(&degrees) {
            return Err(Error::OutOfRange);
        }
        let off = (4095.0 / 20.0 * (1.0 + degrees / 180.0)) as u16;
        self.channel.set_on(0)?;
        self.channel.set_off(off)
    }
}

/// Duty-cycle and phase view of one output channel.
///
/// Duty is the fraction of the period the output is held high; phase is
/// the fractional offset of the rising edge within the period. Both are
/// derived from the ON/OFF tick pair on every read (nothing is cached),
/// and each setter leaves the other quantity untouched: [`Pwm::set_duty`]
/// moves the falling edge only, [`Pwm::set_phase`] shifts both edges
/// together.
#[derive(Debug)]
pub struct Pwm<'a, I2C> {
    channel: Channel<'a, I2C>,
}

impl<'a, I2C: I2c> Pwm<'a, I2C> {
    pub(crate) fn new(channel: Channel<'a, I2C>) -> Self {
        Self { channel }
    }

    /// The channel index this view is bound to.
    pub fn index(&self) -> u8 {
        self.channel.index()
    }

    /// Read the duty cycle as a fraction of the period.
    ///
    /// Computed as `((off - on) mod 4095) / 4095` from the current tick
    /// pair.
    pub fn duty(&mut self) -> Result<f32, Error<I2C::Error>> {
        let on = self.channel.on()?;
        let off = self.channel.off()?;
        Ok(f32::from(Self::width(on, off)) / 4095.0)
    }

    /// Set the duty cycle as a fraction of the period.
    ///
    /// Moves the OFF tick to `(on + ⌊fraction · 4095⌋) mod 4095`; the ON
    /// tick, and with it the phase, is preserved.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] unless `fraction` is in 0..=1. Nothing is
    /// written in that case.
    pub fn set_duty(&mut self, fraction: f32) -> Result<(), Error<I2C::Error>> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::OutOfRange);
        }
        let on = self.channel.on()?;
        let off = (on + (fraction * 4095.0) as u16) % 4095;
        self.channel.set_off(off)
    }

    /// Read the phase, the rising edge's offset, as a fraction of the
    /// period (`on / 4095`).
    pub fn phase(&mut self) -> Result<f32, Error<I2C::Error>> {
        Ok(f32::from(self.channel.on()?) / 4095.0)
    }

    /// Set the phase as a fraction of the period.
    ///
    /// Shifts the rising edge to `⌊fraction · 4095⌋` and moves the falling
    /// edge with it, so the pulse width (the duty cycle) is preserved.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] unless `fraction` is in 0..=1. Nothing is
    /// written in that case.
    pub fn set_phase(&mut self, fraction: f32) -> Result<(), Error<I2C::Error>> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::OutOfRange);
        }
        let on = self.channel.on()?;
        let off = self.channel.off()?;
        let width = Self::width(on, off);
        let new_on = (fraction * 4095.0) as u16 % 4095;
        self.channel.set_on(new_on)?;
        self.channel.set_off((new_on + width) % 4095)
    }

    /// Pulse width in ticks, modulo the period convention of the setters.
    fn width(on: u16, off: u16) -> u16 {
        (off + 4095 - on) % 4095
    }
}
