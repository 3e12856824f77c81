pub mod digest;
pub mod gateway;

pub use digest::DigestAlgorithm;
pub use gateway::{GateDecision, GatewayGate, SubversionAttempt};
