//! Script binding surface.
//!
//! Mirrors what a scripting VM's marshaling layer would expose: loosely
//! typed arguments in, a handle / boolean / nil out, never an error for a
//! malformed call.

pub mod functions;
pub mod table;
pub mod value;

pub use functions::BindingFn;
pub use table::Bindings;
pub use value::ScriptValue;
