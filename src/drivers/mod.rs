//! Device drivers behind the hardware traits
pub mod bno055;
pub mod motor;
pub mod quadrature;
