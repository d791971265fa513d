//! User model, roles and JWT claims

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

/// Something a caller may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, update and delete books
    ManageCatalog,
    /// Create, update and inspect borrowing requests
    ManageBorrowing,
}

impl Capability {
    fn describe(&self) -> &'static str {
        match self {
            Capability::ManageCatalog => "manage the catalog",
            Capability::ManageBorrowing => "manage borrowing requests",
        }
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperUser,
    NormalUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperUser => "super_user",
            Role::NormalUser => "normal_user",
        }
    }

    /// Capabilities granted by this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::SuperUser => &[Capability::ManageCatalog, Capability::ManageBorrowing],
            Role::NormalUser => &[],
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super_user" | "superuser" => Ok(Role::SuperUser),
            "normal_user" | "normaluser" => Ok(Role::NormalUser),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User record, as known to the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub login: String,
    pub role: Role,
}

/// JWT Claims for authenticated callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    /// Identifier of the user record; tokens issued for service accounts carry none
    #[serde(default)]
    pub user_id: Option<i32>,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Fail with `Authorization` unless the caller's role grants `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.grants(capability) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Insufficient rights to {}",
                capability.describe()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        let now = chrono::Utc::now().timestamp();
        UserClaims {
            sub: "tester".to_string(),
            user_id: Some(7),
            role,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_super_user_has_every_capability() {
        let c = claims(Role::SuperUser);
        assert!(c.require(Capability::ManageCatalog).is_ok());
        assert!(c.require(Capability::ManageBorrowing).is_ok());
    }

    #[test]
    fn test_normal_user_is_denied() {
        let c = claims(Role::NormalUser);
        assert!(matches!(
            c.require(Capability::ManageBorrowing),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_token_round_trip() {
        let c = claims(Role::SuperUser);
        let token = c.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, Some(7));
        assert_eq!(parsed.role, Role::SuperUser);
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("SuperUser".parse::<Role>(), Ok(Role::SuperUser));
        assert_eq!("normal_user".parse::<Role>(), Ok(Role::NormalUser));
        assert!("guest".parse::<Role>().is_err());
    }
}
