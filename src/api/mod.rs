//! Contains the high level API: the options builder and the halftoning session.

mod halftoner;
mod options;

pub use halftoner::{halftone, Halftoner};
pub use options::{
    HalftoneOptions, NoiseParams, RunConfiguration, DEFAULT_HYSTERESIS, DEFAULT_INK_ORDER,
};
