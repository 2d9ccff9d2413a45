#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

pub mod cache;
pub mod cache_keys;
pub mod configuration;
pub mod controller;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod model;
pub mod provider;
pub mod registry;
pub mod rolling_window;
pub mod server;

#[cfg(test)]
mod testing;
