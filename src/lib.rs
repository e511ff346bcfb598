#![cfg_attr(not(test), no_std)]

// fmt must come first so the logging macros are visible to every module below
mod fmt;

pub mod config;
pub mod drivers;
pub mod dual;
pub mod math;
pub mod pwm;
pub mod regulator;
pub mod sampling;
pub mod shared;
