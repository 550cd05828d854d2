// Core energy quantities
pub mod energy;

// Bounded storage entity
pub mod storage;

// Decision output types
pub mod recommendation;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
