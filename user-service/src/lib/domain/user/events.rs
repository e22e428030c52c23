use user_facts::FactChange;
use user_facts::FactKind;
use user_facts::UserFact;

use crate::domain::user::models::User;

/// Fact describing `user` exactly as committed.
///
/// `occurred_at` is the commit timestamp of the change. Credential-carrying
/// kinds ship the stored hash, never a plaintext password.
pub fn user_fact(user: &User, kind: FactKind) -> UserFact {
    let change = match kind {
        FactKind::Created => FactChange::Created {
            password_hash: user.password_hash.clone(),
        },
        FactKind::FullNameChanged => FactChange::FullNameChanged,
        FactKind::EmailChanged => FactChange::EmailChanged,
        FactKind::PasswordChanged => FactChange::PasswordChanged {
            password_hash: user.password_hash.clone(),
        },
        FactKind::StatusChanged => FactChange::StatusChanged,
    };

    UserFact {
        user_id: user.id,
        occurred_at: user.updated_at,
        email: user.email.as_str().to_string(),
        full_name: user.full_name.as_str().to_string(),
        standing: user.standing(),
        change,
    }
}

#[cfg(test)]
mod tests {
    use auth::Role;
    use chrono::Utc;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::FullName;
    use crate::domain::user::models::UserId;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: EmailAddress::new("ada@example.com".to_string()).unwrap(),
            full_name: FullName::new("Ada".to_string()).unwrap(),
            password_hash: "$argon2id$stored".to_string(),
            role: Role::Seller,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fact_carries_complete_values() {
        let user = user();
        let fact = user_fact(&user, FactKind::FullNameChanged);

        assert_eq!(fact.user_id, user.id);
        assert_eq!(fact.occurred_at, user.updated_at);
        assert_eq!(fact.email, "ada@example.com");
        assert_eq!(fact.full_name, "Ada");
        assert_eq!(fact.standing, user.standing());
        assert_eq!(fact.password_hash(), None);
    }

    #[test]
    fn test_credential_facts_carry_hash() {
        let user = user();
        for kind in [FactKind::Created, FactKind::PasswordChanged] {
            assert_eq!(user_fact(&user, kind).password_hash(), Some("$argon2id$stored"));
            assert_eq!(user_fact(&user, kind).kind(), kind);
        }
    }
}
