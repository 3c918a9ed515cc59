//! Common types shared by the dispatcher workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
