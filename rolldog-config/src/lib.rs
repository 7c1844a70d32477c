// Submodules
pub mod core;
pub mod error;
pub mod general;

pub use core::Config;
pub use error::Error;
pub use general::General;
