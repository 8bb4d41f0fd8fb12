//! Common imports used throughout the crate.
pub use anyhow::{anyhow, bail, Context, Result};
pub use log::{debug, error, info, trace, warn};
