//! This file defines a user of the application, its supporting types and
//! database queries.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, password::PasswordHash};

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user ID from an integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// To create a `User` use [create_user], otherwise use [get_user_by_id] or
/// [get_user_by_email] to retrieve an existing user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the database.
    pub id: UserId,
    /// The email address used as the log-in key.
    pub email: EmailAddress,
    /// The user's password hash. Never serialized into a response body.
    pub password_hash: PasswordHash,
    /// The user's display name, if they gave one.
    pub name: Option<String>,
    /// When the user row was created.
    pub created_at: OffsetDateTime,
    /// When the user row was last updated.
    pub updated_at: OffsetDateTime,
}

impl User {
    /// The view of the user that is safe to send to clients.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The user shape that crosses the API boundary.
///
/// This is the only user representation that is ever serialized, so the
/// password hash cannot leak into a response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID in the database.
    pub id: UserId,
    /// The email address used as the log-in key.
    pub email: EmailAddress,
    /// The user's display name, if they gave one.
    pub name: Option<String>,
    /// When the user row was created.
    pub created_at: OffsetDateTime,
    /// When the user row was last updated.
    pub updated_at: OffsetDateTime,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                name TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if the given email address is already in use,
/// - [Error::SqlError] if there was an unexpected SQL error.
pub fn create_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    name: Option<String>,
    connection: &Connection,
) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (email, password, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &email.to_string(),
            password_hash.to_string(),
            &name,
            now,
            now,
        ),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        password_hash,
        name,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user from the database that has the specified `id`, or return
/// [Error::NotFound] if such user does not exist.
pub fn get_user_by_id(id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password, name, created_at, updated_at FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &id.as_i64())], map_user_row)
        .map_err(|e| e.into())
}

/// Get the user from the database that has the specified `email` address, or
/// return [Error::NotFound] if such user does not exist.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password, name, created_at, updated_at
             FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &email.to_string())], map_user_row)
        .map_err(|e| e.into())
}

/// Map a database row to a [User].
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let name = row.get(3)?;
    let created_at = row.get(4)?;
    let updated_at = row.get(5)?;

    let id = UserId::new(raw_id);
    let email = EmailAddress::new_unchecked(raw_email);
    let password_hash = PasswordHash::new_unchecked(&raw_password_hash);

    Ok(User {
        id,
        email,
        password_hash,
        name,
        created_at,
        updated_at,
    })
}
