//! Clock tree synthesis errors.

use thiserror::Error;

/// A fatal clock-tree synthesis problem.
#[derive(Debug, Error)]
pub enum CtsError {
    /// The design has no placed flip-flops to serve.
    #[error("clock tree synthesis has no sinks: the design contains no flip-flops")]
    NoSinks,

    /// A flip-flop reached synthesis without a slot binding.
    #[error(
        "clock sink `{instance}` has no slot binding; run placement before clock tree synthesis"
    )]
    UnplacedSink {
        /// The unbound flip-flop.
        instance: String,
    },

    /// The fabric ran out of slots for an inserted buffer.
    #[error(
        "no fabric slot left for a clock buffer near ({x}, {y}); \
         the fabric is too full to host the clock tree"
    )]
    NoBufferSlot {
        /// Ideal x coordinate of the buffer that could not be hosted.
        x: i64,
        /// Ideal y coordinate of the buffer that could not be hosted.
        y: i64,
    },
}
