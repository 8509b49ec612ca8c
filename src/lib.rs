pub mod artifacts;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod errors;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod slot;
pub mod ux;
