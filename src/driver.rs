use bit_field::BitField;
use embedded_hal::i2c::I2c;

use crate::bus::RegisterIo;
use crate::channel::{Channel, Pwm, Servo};
use crate::error::Error;
use crate::registers::{
    CHANNEL_COUNT, DEFAULT_ADDRESS, MODE1, MODE2, OSCILLATOR_HZ, PRE_SCALE, RESTART_BIT, SLEEP_BIT,
};

/// Driver for the PCA9685.
///
/// # Quick start
///
/// Create the driver over any bus implementing [`embedded_hal::i2c::I2c`]
/// with [`Pca9685::new`] (factory-default address 0x40), or
/// [`Pca9685::with_address`] if your board straps the address pins.
///
/// Wake the chip with [`Pca9685::set_active`], pick an update rate with
/// [`Pca9685::set_frequency`], then drive outputs through the per-channel
/// views returned by [`Pca9685::servo`] and [`Pca9685::pwm`] (or the raw
/// tick pair via [`Pca9685::channel`]).
///
/// # Overview
///
/// The driver is a thin register protocol layer: it validates arguments,
/// encodes them into the chip's byte-oriented register space, and issues
/// blocking bus transactions. It keeps no shadow of the hardware state
/// (every getter is a bus read) and holds nothing but the bus handle and
/// the device address, so one instance per physical device for the life of
/// the process is the expected shape.
#[derive(Debug)]
pub struct Pca9685<I2C> {
    bus: RegisterIo<I2C>,
}

impl<I2C: I2c> Pca9685<I2C> {
    ////////////////////////////////////////////////////////////////////////////////
    // Constructors
    ////////////////////////////////////////////////////////////////////////////////

    /// Create a driver for the device at the factory-default address (0x40).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a driver for the device at the given 7-bit address.
    ///
    /// Use this constructor if the chip's address pins are strapped to
    /// something other than the factory default.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            bus: RegisterIo::new(i2c, address),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Global device state
    ////////////////////////////////////////////////////////////////////////////////

    /// Read the PWM update frequency in Hz.
    ///
    /// Computed from the prescale register as
    /// `25 MHz / 4096 / (prescale + 1)`.
    ///
    /// # Datasheet
    ///
    /// See section 7.3.5 for the prescaler and equation 1 for the mapping
    /// between prescale value and update rate.
    pub fn frequency(&mut self) -> Result<f32, Error<I2C::Error>> {
        let prescale = self.bus.read_byte(PRE_SCALE)?;
        Ok(OSCILLATOR_HZ as f32 / 4096.0 / (f32::from(prescale) + 1.0))
    }

    /// Set the PWM update frequency in Hz.
    ///
    /// The requested rate is quantised to `prescale = ⌊25 MHz / 4096 / hz⌋ - 1`;
    /// read back [`Pca9685::frequency`] for the value actually in effect.
    /// The hardware only latches the prescaler while the oscillator is in
    /// sleep, so the write is bracketed internally: the current MODE1 byte
    /// is saved, sleep is entered (with the restart flag cleared), the
    /// prescaler is written, and the saved MODE1 byte is restored.
    ///
    /// <div class="warning">
    ///
    /// Restoring MODE1 does not restart the outputs. After the oscillator
    /// wakes the chip needs 500 µs before the restart bit may be pulsed;
    /// delays are out of scope here, so that sequencing is left to the
    /// caller.
    ///
    /// </div>
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the implied prescale value leaves 3..=255;
    /// with the 25 MHz oscillator that is roughly everything outside
    /// 24 Hz..=1526 Hz. Nothing is written in that case.
    ///
    /// # Datasheet
    ///
    /// See section 7.3.5, including the note that PRE_SCALE can only be set
    /// while the SLEEP bit of MODE1 is 1.
    pub fn set_frequency(&mut self, hz: f32) -> Result<(), Error<I2C::Error>> {
        let prescale = (f64::from(OSCILLATOR_HZ) / 4096.0 / f64::from(hz)) as i32 - 1;
        if !(0x03..=0xFF).contains(&prescale) {
            return Err(Error::OutOfRange);
        }

        let saved = self.bus.read_byte(MODE1)?;
        let mut sleeping = saved;
        sleeping.set_bit(RESTART_BIT, false);
        sleeping.set_bit(SLEEP_BIT, true);

        self.bus.write_byte(MODE1, sleeping)?;
        self.bus.write_byte(PRE_SCALE, prescale as u8)?;
        self.bus.write_byte(MODE1, saved)
    }

    /// Read both mode registers as one 16-bit word.
    ///
    /// MODE1 forms the high byte and MODE2 the low byte. This is a
    /// read-only view; individual control bits are changed through
    /// [`RegisterIo::write_bit`] on the [`Pca9685::bus`] escape hatch.
    pub fn mode(&mut self) -> Result<u16, Error<I2C::Error>> {
        let mode1 = self.bus.read_byte(MODE1)?;
        let mode2 = self.bus.read_byte(MODE2)?;
        Ok(u16::from(mode1) << 8 | u16::from(mode2))
    }

    /// Start (`true`) or stop (`false`) the PWM oscillator.
    ///
    /// Clears or sets the SLEEP bit of MODE1, leaving the rest of the
    /// register untouched.
    ///
    /// <div class="warning">
    ///
    /// Waking the oscillator does not resume previously running outputs;
    /// the chip wants 500 µs of settle time followed by a restart-bit pulse
    /// for that. Only the sleep bit is flipped here; restart sequencing is
    /// the caller's, as this layer performs no delays.
    ///
    /// </div>
    ///
    /// # Datasheet
    ///
    /// See section 7.3.1.1 for the restart sequence requirements.
    pub fn set_active(&mut self, active: bool) -> Result<(), Error<I2C::Error>> {
        self.bus.write_bit(MODE1, SLEEP_BIT, !active)
    }

    /// Whether the PWM oscillator is running (SLEEP bit clear).
    pub fn is_active(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(!self.bus.read_byte(MODE1)?.get_bit(SLEEP_BIT))
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Per-channel views
    ////////////////////////////////////////////////////////////////////////////////

    /// Borrow a raw tick-pair view of one output channel.
    ///
    /// The view holds a mutable borrow of the driver for its lifetime and
    /// owns no hardware state, so it can be created and dropped freely. The
    /// hardware keeps no notion of a channel's role: nothing stops a caller
    /// from later taking a [`Servo`] or [`Pwm`] view of the same index, and
    /// the last writer wins.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] unless `index` is in 0..=15.
    pub fn channel(&mut self, index: u8) -> Result<Channel<'_, I2C>, Error<I2C::Error>> {
        if index >= CHANNEL_COUNT {
            return Err(Error::InvalidChannel);
        }
        Ok(Channel::new(self, index))
    }

    /// Borrow a servo (angle) view of one output channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] unless `index` is in 0..=15.
    pub fn servo(&mut self, index: u8) -> Result<Servo<'_, I2C>, Error<I2C::Error>> {
        Ok(Servo::new(self.channel(index)?))
    }

    /// Borrow a duty-cycle/phase view of one output channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] unless `index` is in 0..=15.
    pub fn pwm(&mut self, index: u8) -> Result<Pwm<'_, I2C>, Error<I2C::Error>> {
        Ok(Pwm::new(self.channel(index)?))
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Low-level access
    ////////////////////////////////////////////////////////////////////////////////

    /// The underlying register transport.
    ///
    /// Escape hatch for register-level work the typed surface does not
    /// cover (MODE2 output configuration, the all-call registers, and so
    /// on).
    pub fn bus(&mut self) -> &mut RegisterIo<I2C> {
        &mut self.bus
    }

    /// Consume the driver and hand back the bus.
    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const ADDR: u8 = 0x40;

    #[test]
    fn frequency_derives_from_prescale_register() {
        let expectations = [I2cTransaction::write_read(
            ADDR,
            [PRE_SCALE].to_vec(),
            [121].to_vec(),
        )];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        let hz = dev.frequency().unwrap();
        assert!((hz - 25e6 / 4096.0 / 122.0).abs() < 1e-3);

        dev.release().done();
    }

    #[test]
    fn set_frequency_sleeps_writes_prescale_and_restores_mode() {
        // 50 Hz maps to prescale 121. MODE1 starts with auto-increment set;
        // the sleep write adds bit 4 and the final write restores the
        // original byte.
        let expectations = [
            I2cTransaction::write_read(ADDR, [MODE1].to_vec(), [0b0010_0000].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b0011_0000].to_vec()),
            I2cTransaction::write(ADDR, [PRE_SCALE, 121].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b0010_0000].to_vec()),
        ];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        dev.set_frequency(50.0).unwrap();

        dev.release().done();
    }

    #[test]
    fn set_frequency_clears_restart_while_sleeping() {
        // A pending restart flag must not be written back together with the
        // sleep bit; the restore still reinstates the byte that was read.
        let expectations = [
            I2cTransaction::write_read(ADDR, [MODE1].to_vec(), [0b1010_0001].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b0011_0001].to_vec()),
            I2cTransaction::write(ADDR, [PRE_SCALE, 121].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b1010_0001].to_vec()),
        ];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        dev.set_frequency(50.0).unwrap();

        dev.release().done();
    }

    #[test]
    fn set_frequency_rejects_rates_outside_the_prescaler_range() {
        let mut dev = Pca9685::new(I2cMock::new(&[]));

        // Too fast: prescale would fall below 3.
        assert_eq!(dev.set_frequency(10_000.0).unwrap_err(), Error::OutOfRange);
        // Too slow: prescale would exceed 255.
        assert_eq!(dev.set_frequency(20.0).unwrap_err(), Error::OutOfRange);
        // Nonsense input maps out of range rather than panicking.
        assert_eq!(dev.set_frequency(0.0).unwrap_err(), Error::OutOfRange);
        assert_eq!(dev.set_frequency(f32::NAN).unwrap_err(), Error::OutOfRange);

        dev.release().done();
    }

    #[test]
    fn mode_word_puts_mode1_in_the_high_byte() {
        let expectations = [
            I2cTransaction::write_read(ADDR, [MODE1].to_vec(), [0xA1].to_vec()),
            I2cTransaction::write_read(ADDR, [MODE2].to_vec(), [0x04].to_vec()),
        ];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        assert_eq!(dev.mode().unwrap(), 0xA104);

        dev.release().done();
    }

    #[test]
    fn set_active_true_clears_only_the_sleep_bit() {
        let expectations = [
            I2cTransaction::write_read(ADDR, [MODE1].to_vec(), [0b0011_0001].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b0010_0001].to_vec()),
        ];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        dev.set_active(true).unwrap();

        dev.release().done();
    }

    #[test]
    fn set_active_false_sets_only_the_sleep_bit() {
        let expectations = [
            I2cTransaction::write_read(ADDR, [MODE1].to_vec(), [0b0000_0001].to_vec()),
            I2cTransaction::write(ADDR, [MODE1, 0b0001_0001].to_vec()),
        ];

        let mut dev = Pca9685::new(I2cMock::new(&expectations));
        dev.set_active(false).unwrap();

        dev.release().done();
    }

    #[test]
    fn channel_factories_validate_the_index() {
        let mut dev = Pca9685::new(I2cMock::new(&[]));

        assert!(dev.channel(0).is_ok());
        assert!(dev.channel(15).is_ok());
        assert_eq!(dev.channel(16).unwrap_err(), Error::InvalidChannel);
        assert_eq!(dev.servo(16).unwrap_err(), Error::InvalidChannel);
        assert_eq!(dev.pwm(255).unwrap_err(), Error::InvalidChannel);

        dev.release().done();
    }

    #[test]
    fn with_address_talks_to_the_given_device() {
        let expectations = [I2cTransaction::write_read(
            0x41,
            [PRE_SCALE].to_vec(),
            [0x1E].to_vec(),
        )];

        let mut dev = Pca9685::with_address(I2cMock::new(&expectations), 0x41);
        dev.frequency().unwrap();

        dev.release().done();
    }
}
