/// Wrapper for problems when talking to the PCA9685.
///
/// Every validation failure is reported before the first bus transaction of
/// the rejected call, so an `Err` from an argument check implies no register
/// was touched.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// A value does not fit the register it is destined for.
    ///
    /// The ON/OFF tick registers are 12 bits wide; any value above 4095 is
    /// rejected. (Single-byte writes take `u8` and cannot produce this.)
    InvalidValue,
    /// An argument lies outside its valid semantic range.
    ///
    /// Produced for update frequencies whose prescale value falls outside
    /// 3..=255, servo angles outside 0..=180 degrees, and duty-cycle or
    /// phase fractions outside 0..=1.
    OutOfRange,
    /// A channel index outside 0..=15.
    InvalidChannel,
    /// The underlying I2C bus reported a failure.
    ///
    /// The bus error is propagated unchanged; no retries are performed at
    /// this layer. A multi-byte operation interrupted by a bus failure may
    /// have completed some of its writes (see the crate-level notes on
    /// atomicity).
    I2c(E),
}
