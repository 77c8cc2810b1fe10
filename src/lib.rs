pub mod cli;
pub mod client;
pub mod logging;
pub mod protocol;
pub mod simulation;
