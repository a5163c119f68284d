//! Top-level facade crate for statreg.
//!
//! Re-exports the registry core and the host library so users can depend on a single crate.

pub mod core {
    pub use statreg_core::*;
}

pub mod host {
    pub use statreg_host::*;
}
