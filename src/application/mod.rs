// Trade decision policies
pub mod policy;

// Multi-hour forecast rollout
pub mod rollout;

// Session loop and handle
pub mod session;

// Forecast perturbation models
pub mod uncertainty;
