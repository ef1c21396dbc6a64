//! Defines functions for handling the session token cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::token::TOKEN_DURATION};

/// The name of the cookie holding the session token.
pub(crate) const COOKIE_TOKEN: &str = "auth-token";

/// Add the session token cookie to the cookie jar, indicating that a user is
/// logged in and authenticated.
///
/// The cookie is HTTP-only, same-site strict, scoped to the whole site and
/// expires together with the token it holds. `secure` controls the `Secure`
/// attribute and should be on outside local development.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_auth_cookie(jar: CookieJar, token: String, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .path("/")
            .max_age(TOKEN_DURATION)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(secure),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(secure),
    )
}

/// Read the session token from the cookie jar.
pub(crate) fn get_token_from_cookies(jar: &CookieJar) -> Result<String, Error> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .ok_or(Error::CookieMissing)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{CookieJar, cookie::SameSite};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, auth::token::TOKEN_DURATION};

    use super::{COOKIE_TOKEN, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie};

    #[test]
    fn can_set_cookie() {
        let jar = set_auth_cookie(CookieJar::new(), "token-value".to_owned(), true);

        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(TOKEN_DURATION));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn secure_flag_is_off_for_local_development() {
        let jar = set_auth_cookie(CookieJar::new(), "token-value".to_owned(), false);

        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn get_token_from_cookies_succeeds() {
        let jar = set_auth_cookie(CookieJar::new(), "token-value".to_owned(), true);

        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token, "token-value");
    }

    #[test]
    fn get_token_fails_with_empty_jar() {
        assert_eq!(
            get_token_from_cookies(&CookieJar::new()),
            Err(Error::CookieMissing)
        );
    }

    #[test]
    fn invalidate_auth_cookie_succeeds() {
        let jar = set_auth_cookie(CookieJar::new(), "token-value".to_owned(), true);

        let jar = invalidate_auth_cookie(jar, true);
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
