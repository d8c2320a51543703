#![cfg_attr(target_os = "none", no_std)]

pub mod design_parameters;
#[cfg(target_os = "none")]
pub mod hardware;
