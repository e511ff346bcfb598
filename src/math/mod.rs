pub mod fixed;

pub use fixed::{Codepoint, Duty, Fixed32, FULL_SCALE, HALF_SCALE};
