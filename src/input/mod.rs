//! Controller input sources

pub mod gamepad;
