//! Client for the BCT admin backend.
//!
//! Requests are built by [`AdminClient`] and sent through
//! [`AuthorizeRequestLayer`], which attaches the session's bearer token and
//! refreshes it when it has less than [`MIN_TOKEN_VALIDITY`] left.

mod authorizer;
mod client;
mod declaration_types;
mod dto;
mod error;
mod roles;
mod users;

pub use authorizer::{Anonymous, AuthorizeRequest, AuthorizeRequestLayer, MIN_TOKEN_VALIDITY};
pub use client::{AdminClient, AdminClientBuilder};
pub use dto::{
    ApiMessage, CreateDeclarationTypeRequest, CreateUserRequest, DeclarationType, KeycloakUser,
    RoleDto, UpdateUserRequest,
};
pub use error::{ApiError, ApiResult};
