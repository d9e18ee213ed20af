//! Row models and DTOs, one module per table.

pub mod deployment;
pub mod router;
pub mod subscriber;
pub mod subscription;
