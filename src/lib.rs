#[macro_use]
extern crate log;

mod batch;
mod error;
mod fsutil;
mod tool;

pub mod cancel;
pub mod convert;
pub mod dimensions;
pub mod normalize;
pub mod resize;

pub use batch::{BatchError, Failure};
pub use error::{Error, ErrorKind, Result};
pub use normalize::{normalize_file, normalize_name, Normalized, Removal};
pub use tool::{Tool, Tools};
