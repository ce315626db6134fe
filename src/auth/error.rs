use super::hasher::HashError;
use super::store::{StoreError, UniqueField};
use super::token::TokenError;
use super::validator::ValidationError;

/// Outcome of a failed register or login.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Only a taken username is named in the message; ID and account number
    /// collisions share one text so responses do not confirm which is on file.
    #[error("{}", duplicate_message(.0))]
    DuplicateUser(UniqueField),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Failures the client cannot act on. Only [`InternalError::category`] leaves
/// the process.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("credential store failed")]
    Store(#[source] StoreError),
    #[error("password hashing failed")]
    Hash(#[from] HashError),
    #[error("token issuance failed")]
    Token(#[from] TokenError),
}

impl InternalError {
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Store(_) => "storage",
            Self::Hash(_) => "hashing",
            Self::Token(_) => "token",
        }
    }
}

fn duplicate_message(field: &UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already taken",
        UniqueField::IdNumber | UniqueField::AccountNumber => "User already exists",
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(field) => Self::DuplicateUser(field),
            StoreError::Backend(_) => Self::Internal(InternalError::Store(err)),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_username_is_taken() {
        let err = AuthError::from(StoreError::DuplicateKey(UniqueField::Username));
        assert!(matches!(err, AuthError::DuplicateUser(UniqueField::Username)));
        assert_eq!(err.to_string(), "Username already taken");
    }

    #[test]
    fn duplicate_identifiers_are_duplicate_user() {
        for field in [UniqueField::IdNumber, UniqueField::AccountNumber] {
            let err = AuthError::from(StoreError::DuplicateKey(field));
            assert!(matches!(err, AuthError::DuplicateUser(reported) if reported == field));
            assert_eq!(err.to_string(), "User already exists");
        }
    }

    #[test]
    fn backend_failure_is_internal_storage() {
        let err = AuthError::from(StoreError::Backend(sqlx::Error::PoolTimedOut));
        match err {
            AuthError::Internal(internal) => assert_eq!(internal.category(), "storage"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validation_displays_client_message() {
        let err = AuthError::from(ValidationError::IdNumber);
        assert_eq!(err.to_string(), "ID Number must be 13 digits");
    }

    #[test]
    fn token_failure_is_internal_token() {
        let err = AuthError::from(TokenError::EmptySecret);
        assert!(matches!(
            err,
            AuthError::Internal(InternalError::Token(TokenError::EmptySecret))
        ));
    }
}
