#![doc = include_str!("../README.md")]
#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod bus;
mod channel;
mod driver;
mod error;
pub mod registers;

pub use bus::RegisterIo;
pub use channel::{Channel, Pwm, Servo};
pub use driver::Pca9685;
pub use error::Error;
