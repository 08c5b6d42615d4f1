//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod donation_dto;

pub use common_dto::*;
pub use donation_dto::*;
