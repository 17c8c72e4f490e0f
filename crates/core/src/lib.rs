#![forbid(unsafe_code)]

pub mod aggregate;
pub mod model;
pub mod settings;
pub mod stats;
pub mod time;

pub use settings::{ProgressSettings, ProgressSettingsError};
pub use time::Clock;
