pub mod client;
pub mod file;
pub mod preview;
pub mod state;
