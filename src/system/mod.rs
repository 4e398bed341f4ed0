//! Core system components shared between tasks
pub mod channel;
pub mod hardware;
pub mod state;
