//! PCA9685 register map.
//!
//! Register numbering follows section 7.3 of the datasheet. The sixteen
//! output channels each own a block of four registers starting at
//! [`LED0_ON_L`]: ON low byte, ON high byte, OFF low byte, OFF high byte.
//! Only the low three bits of each high byte are significant, giving the
//! 12-bit tick values.

/// Mode register 1.
///
/// Holds the SLEEP, RESTART, EXTCLK, AI and ALLCALL control bits. See table 5
/// in section 7.3.1 of the datasheet.
pub const MODE1: u8 = 0x00;

/// Mode register 2 (output driver configuration).
///
/// See table 6 in section 7.3.2 of the datasheet.
pub const MODE2: u8 = 0x01;

/// Channel 0 ON-tick low byte. Subsequent channels follow at a stride of 4.
pub const LED0_ON_L: u8 = 0x06;

/// PWM frequency prescaler.
///
/// Writable only while the oscillator is in sleep. See section 7.3.5 of the
/// datasheet.
pub const PRE_SCALE: u8 = 0xFE;

/// MODE1 restart bit. Writing 1 while the oscillator runs restarts all PWM.
pub const RESTART_BIT: usize = 7;

/// MODE1 external-clock bit.
pub const EXTCLK_BIT: usize = 6;

/// MODE1 register auto-increment bit.
pub const AUTO_INCREMENT_BIT: usize = 5;

/// MODE1 sleep bit. Set halts the oscillator; cleared the chip responds to
/// PWM programming.
pub const SLEEP_BIT: usize = 4;

/// MODE1 all-call bit. Set means the chip also answers the all-call address.
pub const ALLCALL_BIT: usize = 0;

/// Number of PWM output channels.
pub const CHANNEL_COUNT: u8 = 16;

/// Factory-default 7-bit device address (all address pins low).
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Internal oscillator frequency in Hz.
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Address of the ON-tick low byte for the given channel.
pub const fn channel_on(channel: u8) -> u8 {
    LED0_ON_L + 4 * channel
}

/// Address of the OFF-tick low byte for the given channel.
pub const fn channel_off(channel: u8) -> u8 {
    LED0_ON_L + 4 * channel + 2
}
