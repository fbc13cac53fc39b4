pub mod error;
pub mod gateway;
pub mod net;
pub mod telemetry;
