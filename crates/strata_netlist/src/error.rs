//! Netlist construction errors.

use thiserror::Error;

/// A fatal problem with the mapped design description.
#[derive(Debug, Error)]
pub enum NetlistError {
    /// Two instances share a name.
    #[error("invalid netlist: duplicate instance name `{name}`; instance names must be unique")]
    DuplicateInstance {
        /// The repeated instance name.
        name: String,
    },

    /// A net references a pin that does not exist.
    #[error(
        "invalid netlist: net `{net}` references unknown pin `{reference}`; \
         check the design file for stale connections"
    )]
    DanglingRef {
        /// The net holding the stale reference.
        net: String,
        /// The `instance.pin` reference that failed to resolve.
        reference: String,
    },

    /// A net has sinks but no driver.
    #[error("invalid netlist: net `{net}` has no driver; every net needs exactly one source")]
    NoDriver {
        /// The undriven net name.
        net: String,
    },

    /// A net lists more than one driver pin.
    #[error("invalid netlist: net `{net}` has multiple drivers; every net needs exactly one source")]
    MultipleDrivers {
        /// The multiply-driven net name.
        net: String,
    },

    /// The requested clock net does not exist.
    #[error("invalid netlist: clock net `{name}` not found; pass the clock net's exact name")]
    ClockNotFound {
        /// The requested clock name.
        name: String,
    },

    /// The design file could not be read or parsed.
    #[error("invalid netlist: {0}")]
    Load(String),
}
