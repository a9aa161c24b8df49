//! Byte-level register access over the I2C bus.
//!
//! Everything the driver does to the chip funnels through [`RegisterIo`]:
//! single-byte reads and writes, the 12-bit two-register pairs used by the
//! channel timing registers, and read-modify-write access to individual
//! mode bits.

use bit_field::BitField;
use embedded_hal::i2c::I2c;

use crate::error::Error;

/// Register transport for one PCA9685 at a fixed 7-bit address.
///
/// Owns the bus handle; the device address is set at construction and never
/// changes. One `RegisterIo` serialises all register traffic for its device
/// through the single bus handle, with no internal locking. The compound
/// operations ([`write_long`], [`read_long`], [`write_bit`]) issue more than
/// one bus transaction and are not atomic; see the method docs.
///
/// [`write_long`]: RegisterIo::write_long
/// [`read_long`]: RegisterIo::read_long
/// [`write_bit`]: RegisterIo::write_bit
#[derive(Debug)]
pub struct RegisterIo<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> RegisterIo<I2C> {
    /// Create a transport for the device at `address`.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit device address this transport talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Write one byte to a register. One bus transaction.
    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Error::I2c)
    }

    /// Read one byte from a register. One bus transaction.
    pub fn read_byte(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    /// Write a 12-bit value to a two-register pair.
    ///
    /// The low byte goes to `register` and the three significant bits of the
    /// high byte to `register + 1`, in that order.
    ///
    /// <div class="warning">
    ///
    /// This is two bus transactions, not one. A bus failure between them
    /// leaves the low byte written and the high byte stale, and a concurrent
    /// reader of the pair can observe a torn value.
    ///
    /// </div>
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] if `value` does not fit in 12 bits; nothing
    /// is written in that case.
    pub fn write_long(&mut self, register: u8, value: u16) -> Result<(), Error<I2C::Error>> {
        if value > 0x0FFF {
            return Err(Error::InvalidValue);
        }
        self.write_byte(register, (value & 0xFF) as u8)?;
        self.write_byte(register + 1, ((value >> 8) & 0x07) as u8)
    }

    /// Read a 12-bit value from a two-register pair.
    ///
    /// Reads `register` then `register + 1` and combines them as
    /// `((high & 0b111) << 8) | low`. Two bus transactions, with the same
    /// tearing caveat as [`RegisterIo::write_long`].
    pub fn read_long(&mut self, register: u8) -> Result<u16, Error<I2C::Error>> {
        let low = self.read_byte(register)?;
        let high = self.read_byte(register + 1)?;
        Ok(u16::from(high & 0b111) << 8 | u16::from(low))
    }

    /// Set or clear a single bit of a register, leaving the rest untouched.
    ///
    /// <div class="warning">
    ///
    /// This is a read-modify-write: a concurrent writer to the same register
    /// between the read and the write-back loses its update.
    ///
    /// </div>
    ///
    /// # Panics
    ///
    /// If `bit` is not in `0..=7`.
    pub fn write_bit(
        &mut self,
        register: u8,
        bit: usize,
        state: bool,
    ) -> Result<(), Error<I2C::Error>> {
        let mut value = self.read_byte(register)?;
        value.set_bit(bit, state);
        self.write_byte(register, value)
    }

    /// Consume the transport and hand back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
