/// Role checks
///
/// Roles are ordered `user < technician < admin`; every check asks for a
/// minimum role. Some actions are also open to the owner of a resource, such
/// as a requestor updating their own ticket.
///
/// # Example
///
/// ```
/// use helpdesk_shared::auth::authorization::require_role;
/// use helpdesk_shared::auth::middleware::AuthContext;
/// use helpdesk_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let tech = AuthContext { user_id: Uuid::new_v4(), role: UserRole::Technician };
/// assert!(require_role(&tech, UserRole::Technician).is_ok());
/// assert!(require_role(&tech, UserRole::Admin).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// Caller neither owns the resource nor has the role that overrides ownership
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller's role to be at least `min`
pub fn require_role(auth: &AuthContext, min: UserRole) -> Result<(), AuthzError> {
    if auth.role.at_least(min) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: min,
            actual: auth.role,
        })
    }
}

/// Passes for the owner of a resource or anyone with at least `min`
pub fn require_owner_or_role(
    auth: &AuthContext,
    owner_id: Uuid,
    min: UserRole,
) -> Result<(), AuthzError> {
    if auth.user_id == owner_id || auth.role.at_least(min) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_require_role_hierarchy() {
        for (role, min, allowed) in [
            (UserRole::User, UserRole::User, true),
            (UserRole::User, UserRole::Technician, false),
            (UserRole::User, UserRole::Admin, false),
            (UserRole::Technician, UserRole::User, true),
            (UserRole::Technician, UserRole::Technician, true),
            (UserRole::Technician, UserRole::Admin, false),
            (UserRole::Admin, UserRole::Technician, true),
            (UserRole::Admin, UserRole::Admin, true),
        ] {
            assert_eq!(require_role(&ctx(role), min).is_ok(), allowed, "{role} vs {min}");
        }
    }

    #[test]
    fn test_insufficient_role_message() {
        let err = require_role(&ctx(UserRole::User), UserRole::Admin).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient permissions: requires admin, has user");
    }

    #[test]
    fn test_owner_or_role() {
        let requestor = ctx(UserRole::User);
        assert!(require_owner_or_role(&requestor, requestor.user_id, UserRole::Technician).is_ok());
        assert_eq!(
            require_owner_or_role(&requestor, Uuid::new_v4(), UserRole::Technician),
            Err(AuthzError::NotAuthorized)
        );

        let tech = ctx(UserRole::Technician);
        assert!(require_owner_or_role(&tech, Uuid::new_v4(), UserRole::Technician).is_ok());
    }
}
