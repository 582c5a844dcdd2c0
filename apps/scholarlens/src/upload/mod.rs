pub mod validation;
pub mod workflow;
