//! WebSynth D-77 engine for synthbridge.
//!
//! [`CoreDriver`] loads the `d77_coredrv` library at runtime and implements
//! [`SynthEngine`](synthbridge_core::SynthEngine) on top of it. All memory
//! the driver sees is allocated through the driver's own allocator.
//!
//! ```ignore
//! let driver = synthbridge_d77::CoreDriver::load_default()?;
//! ```

mod error;
pub use error::{DriverError, Result};

mod ffi;
mod memory;

mod driver;
pub use driver::{default_library_path, CoreDriver, LIBRARY_NAME};
