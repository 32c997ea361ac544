use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles issued by the identity service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Retailer,
    Supplier,
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Retailer => "retailer",
            Role::Supplier => "supplier",
            Role::Customer => "customer",
        };
        f.write_str(name)
    }
}

/// The authenticated caller as supplied by the identity collaborator.
///
/// Nothing in the core authorizes against this; it is carried for auditing
/// and for role checks performed by outer middleware.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}
