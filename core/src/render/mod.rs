//! Per-LED render resolution - pure functions from configuration + stock
//! state to controller instructions

pub mod color;
pub mod resolver;

pub use color::{Color, ColorParseError};
pub use resolver::{resolve, LedRender, PHASE_DELAY_STEP};
