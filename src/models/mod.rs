// src/models/mod.rs

pub mod client;
pub mod equipment;
pub mod training;

pub use client::*;
pub use equipment::*;
pub use training::*;
