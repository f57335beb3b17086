// src/lib.rs

pub mod platforms;
pub mod presence;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;

pub use livecord_common::Error;
