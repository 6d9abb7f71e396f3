use serde::{Deserialize, Serialize};

/// Platform roles, widest capability set first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Analyst,
}

impl Role {
    /// Parse the role string stored on a user row.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "analyst" => Some(Role::Analyst),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Analyst => "analyst",
        }
    }
}

/// Verified caller identity, produced once per request by the
/// authentication seam and treated as immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: i64,
    pub role: Role,
    pub organization_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_stored_string() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Analyst] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn unknown_role_string_does_not_parse() {
        assert_eq!(Role::parse("operator"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("Admin"), None);
    }
}
