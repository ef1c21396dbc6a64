//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, user::UserId};

mod created_at_format {
    //! Specifies how to serialize the creation timestamp in a custom format
    //! that avoids serialisations with datetimes containing midnight.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the creation timestamp, e.g. "2025-04-22 09:30:00 +00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour \
             sign:mandatory]:[offset_minute]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction records money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the ledger.
    Income,
    /// Money going out of the ledger.
    Expense,
}

impl TransactionKind {
    /// The lowercase wire representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The description to use when the user did not enter one.
    pub fn default_description(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::InvalidTransactionKind(other.to_owned())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(std::io::Error::other(error.to_string()))))
    }
}

/// A single dated income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: i64,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money earned or spent, always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// A display string derived from `date`. Cached presentation data, not
    /// authoritative.
    pub formatted_date: String,
    /// The ID of the user that owns this transaction.
    pub user_id: UserId,
    /// When the row was created. Used for the newest-first default ordering.
    #[serde(
        serialize_with = "created_at_format::serialize",
        deserialize_with = "created_at_format::deserialize"
    )]
    pub created_at: OffsetDateTime,
}

/// The data needed to create a [Transaction].
///
/// Optional fields are filled in with their documented defaults by
/// [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money earned or spent. Must be positive.
    pub amount: f64,
    /// A text description. Defaults to "Income" or "Expense" when empty.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: Date,
    /// A display string for `date`. Derived from `date` when absent.
    pub formatted_date: Option<String>,
    /// The ID of the user that owns this transaction.
    pub user_id: UserId,
}

/// Display format for transaction dates, e.g. "Tue, 22 Apr 2025".
const DISPLAY_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[weekday repr:short], [day padding:none] [month repr:short] [year]");

/// Derive the cached display string for a transaction date.
pub fn format_display_date(date: Date) -> String {
    // The short weekday/month formats cannot fail for a valid date.
    date.format(DISPLAY_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL CHECK(kind IN ('income', 'expense')),
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                formatted_date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    Ok(())
}

/// Create a new transaction in the database.
///
/// An empty description defaults to "Income"/"Expense" and a missing display
/// date is derived from the transaction date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !(new_transaction.amount > 0.0) {
        return Err(Error::InvalidAmount(new_transaction.amount));
    }

    let description = match new_transaction.description {
        Some(description) if !description.trim().is_empty() => description,
        _ => new_transaction.kind.default_description().to_owned(),
    };
    let formatted_date = new_transaction
        .formatted_date
        .filter(|formatted_date| !formatted_date.trim().is_empty())
        .unwrap_or_else(|| format_display_date(new_transaction.date));

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (kind, amount, description, date, formatted_date, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, kind, amount, description, date, formatted_date, user_id, created_at",
        )?
        .query_row(
            (
                new_transaction.kind,
                new_transaction.amount,
                description,
                new_transaction.date,
                formatted_date,
                new_transaction.user_id.as_i64(),
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all transactions owned by `user_id`, ordered newest-created first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions(user_id: UserId, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, kind, amount, description, date, formatted_date, user_id, created_at
             FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Delete every transaction owned by `user_id` and return how many rows were
/// removed. Deleting for a user with no transactions is not an error.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transactions(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    let deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE user_id = :user_id",
        &[(":user_id", &user_id.as_i64())],
    )?;

    Ok(deleted)
}

/// The running balance over `transactions`: the sum of income amounts minus
/// the sum of expense amounts.
pub fn balance(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| match transaction.kind {
            TransactionKind::Income => transaction.amount,
            TransactionKind::Expense => -transaction.amount,
        })
        .sum()
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let kind = row.get(1)?;
    let amount = row.get(2)?;
    let description = row.get(3)?;
    let date = row.get(4)?;
    let formatted_date = row.get(5)?;
    let user_id = UserId::new(row.get(6)?);
    let created_at = row.get(7)?;

    Ok(Transaction {
        id,
        kind,
        amount,
        description,
        date,
        formatted_date,
        user_id,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        password::PasswordHash,
        user::{UserId, create_user},
    };

    use super::{
        NewTransaction, TransactionKind, balance, create_transaction, delete_transactions,
        get_transactions,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            EmailAddress::from_str("foo@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter22"),
            None,
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn new_transaction(kind: TransactionKind, amount: f64, user_id: UserId) -> NewTransaction {
        NewTransaction {
            kind,
            amount,
            description: Some("test transaction".to_owned()),
            date: date!(2025 - 04 - 22),
            formatted_date: None,
            user_id,
        }
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let amount = 12.3;

        let transaction = create_transaction(
            new_transaction(TransactionKind::Income, amount, user_id),
            &conn,
        )
        .expect("Could not create transaction");

        assert!(transaction.id > 0);
        assert_eq!(transaction.kind, TransactionKind::Income);
        assert_eq!(transaction.amount, amount);
        assert_eq!(transaction.description, "test transaction");
        assert_eq!(transaction.date, date!(2025 - 04 - 22));
        assert_eq!(transaction.user_id, user_id);
    }

    #[test]
    fn create_derives_display_date() {
        let (conn, user_id) = get_test_connection();

        let transaction = create_transaction(
            new_transaction(TransactionKind::Expense, 5.0, user_id),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.formatted_date, "Tue, 22 Apr 2025");
    }

    #[test]
    fn create_defaults_empty_description() {
        let (conn, user_id) = get_test_connection();
        let mut new_income = new_transaction(TransactionKind::Income, 100.0, user_id);
        new_income.description = Some("   ".to_owned());
        let mut new_expense = new_transaction(TransactionKind::Expense, 100.0, user_id);
        new_expense.description = None;

        let income = create_transaction(new_income, &conn).unwrap();
        let expense = create_transaction(new_expense, &conn).unwrap();

        assert_eq!(income.description, "Income");
        assert_eq!(expense.description, "Expense");
    }

    #[test]
    fn create_fails_on_non_positive_amount() {
        let (conn, user_id) = get_test_connection();

        for amount in [0.0, -12.3] {
            let result = create_transaction(
                new_transaction(TransactionKind::Expense, amount, user_id),
                &conn,
            );

            assert_eq!(result, Err(Error::InvalidAmount(amount)));
        }

        let transactions = get_transactions(user_id, &conn).unwrap();
        assert!(
            transactions.is_empty(),
            "no rows should be persisted for rejected amounts, got {}",
            transactions.len()
        );
    }

    #[test]
    fn list_returns_newest_first() {
        let (conn, user_id) = get_test_connection();
        for amount in [1.0, 2.0, 3.0] {
            create_transaction(
                new_transaction(TransactionKind::Income, amount, user_id),
                &conn,
            )
            .unwrap();
        }

        let transactions = get_transactions(user_id, &conn).unwrap();

        let amounts: Vec<f64> = transactions
            .iter()
            .map(|transaction| transaction.amount)
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn list_does_not_return_other_users_transactions() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            EmailAddress::from_str("other@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter33"),
            None,
            &conn,
        )
        .unwrap();

        create_transaction(
            new_transaction(TransactionKind::Income, 100.0, user_id),
            &conn,
        )
        .unwrap();

        let transactions = get_transactions(other_user.id, &conn).unwrap();

        assert!(transactions.is_empty());
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let (conn, user_id) = get_test_connection();
        create_transaction(
            new_transaction(TransactionKind::Income, 1000.0, user_id),
            &conn,
        )
        .unwrap();
        create_transaction(
            new_transaction(TransactionKind::Expense, 300.0, user_id),
            &conn,
        )
        .unwrap();
        create_transaction(
            new_transaction(TransactionKind::Income, 50.0, user_id),
            &conn,
        )
        .unwrap();

        let transactions = get_transactions(user_id, &conn).unwrap();

        assert_eq!(balance(&transactions), 750.0);
        assert_eq!(balance(&[]), 0.0);
    }

    #[test]
    fn delete_all_is_idempotent() {
        let (conn, user_id) = get_test_connection();
        for _ in 0..3 {
            create_transaction(
                new_transaction(TransactionKind::Expense, 10.0, user_id),
                &conn,
            )
            .unwrap();
        }

        let first = delete_transactions(user_id, &conn).unwrap();
        let second = delete_transactions(user_id, &conn).unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert!(get_transactions(user_id, &conn).unwrap().is_empty());
    }
}
