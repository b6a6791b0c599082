//! Customer profile attached one-to-one to a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{User, UserResponse};

/// Customer entity
#[derive(Debug, Clone)]
pub struct Customer {
    pub user_id: i64,
    pub telefono: String,
    pub fecha_registro: DateTime<Utc>,
}

/// Profile as returned by `/perfil` and the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub user: UserResponse,
    pub telefono: String,
    pub fecha_registro: DateTime<Utc>,
}

impl CustomerResponse {
    pub fn new(user: &User, customer: &Customer) -> Self {
        Self {
            user: UserResponse::from(user),
            telefono: customer.telefono.clone(),
            fecha_registro: customer.fecha_registro,
        }
    }
}

/// Profile update payload; only the phone number is writable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub telefono: Option<String>,
}
