//! Cashier identity.
//!
//! Authentication happens in the proxy in front of this server; it forwards
//! the operator as plain headers:
//!
//! | Header | Required | Meaning |
//! |--------|----------|---------|
//! | `x-cashier-id` | yes | Operator id recorded on sales |
//! | `x-cashier-name` | no | Display name frozen into sales (defaults to the id) |
//! | `x-cashier-role` | no | `admin` unlocks catalog writes and purges |

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use tally_core::Cashier;

pub const CASHIER_ID_HEADER: &str = "x-cashier-id";
pub const CASHIER_NAME_HEADER: &str = "x-cashier-name";
pub const CASHIER_ROLE_HEADER: &str = "x-cashier-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Cashier,
    Admin,
}

impl Role {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(r) if r.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Cashier,
        }
    }
}

/// The operator behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub cashier: Cashier,
    pub role: Role,
}

impl Identity {
    /// Fails with 403 unless the operator is an admin.
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Cashier => Err(ApiError::forbidden(action)),
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, CASHIER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let name = header(parts, CASHIER_NAME_HEADER).unwrap_or(id);
        let role = Role::parse(header(parts, CASHIER_ROLE_HEADER));

        Ok(Identity {
            cashier: Cashier::new(id, name),
            role,
        })
    }
}
