//! Core callable types.

pub mod descriptor;
pub mod function;
