//! Session token issuance and verification.
//!
//! A session token is a signed, self-contained credential: it is set as a
//! cookie and also returned in the log-in/sign-up response bodies. There is no
//! server-side revocation list, so a token stays valid until its expiry.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// How long a session token stays valid after it is issued.
pub const TOKEN_DURATION: Duration = Duration::days(7);

/// The claims encoded into a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The ID of the authenticated user.
    sub: i64,
    /// When the token was issued, as a unix timestamp.
    iat: i64,
    /// When the token expires, as a unix timestamp.
    exp: i64,
}

/// Create a signed session token for `user_id` that expires
/// [TOKEN_DURATION] from now.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn create_token(user_id: UserId, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp(),
        exp: (now + TOKEN_DURATION).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify a session token and extract the user ID it was issued for.
///
/// # Errors
/// Returns an [Error::InvalidToken] if the token is expired, was signed with a
/// different key, or is otherwise malformed.
pub fn verify_token(token: &str, decoding_key: &DecodingKey) -> Result<UserId, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| UserId::new(token_data.claims.sub))
        .map_err(|_| Error::InvalidToken)
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use time::OffsetDateTime;

    use crate::{Error, app_state::JwtKeys, user::UserId};

    use super::{Claims, create_token, verify_token};

    #[test]
    fn token_round_trip() {
        let keys = JwtKeys::from_secret("foobar");
        let user_id = UserId::new(42);

        let token = create_token(user_id, &keys.encoding_key).unwrap();
        let verified = verify_token(&token, &keys.decoding_key).unwrap();

        assert_eq!(verified, user_id);
    }

    #[test]
    fn rejects_token_signed_with_different_key() {
        let keys = JwtKeys::from_secret("foobar");
        let other_keys = JwtKeys::from_secret("not foobar");

        let token = create_token(UserId::new(1), &other_keys.encoding_key).unwrap();

        assert_eq!(
            verify_token(&token, &keys.decoding_key),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn rejects_tampered_token() {
        let keys = JwtKeys::from_secret("foobar");

        let mut token = create_token(UserId::new(1), &keys.encoding_key).unwrap();
        token.pop();

        assert_eq!(
            verify_token(&token, &keys.decoding_key),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn rejects_expired_token() {
        let keys = JwtKeys::from_secret("foobar");
        let issued_at = OffsetDateTime::now_utc().unix_timestamp() - 7200;
        let claims = Claims {
            sub: 1,
            iat: issued_at,
            exp: issued_at + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("foobar".as_ref()),
        )
        .unwrap();

        assert_eq!(
            verify_token(&token, &keys.decoding_key),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn rejects_garbage() {
        let keys = JwtKeys::from_secret("foobar");

        assert_eq!(
            verify_token("not-a-token", &keys.decoding_key),
            Err(Error::InvalidToken)
        );
    }
}
