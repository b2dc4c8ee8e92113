pub mod config;
pub mod controller;
pub mod render;
pub mod server;
pub mod state;

#[cfg(test)]
mod testing;
