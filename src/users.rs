use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{named_params, OptionalExtension, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::AlertDeskError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Faculty,
    Security,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Faculty => "faculty",
            Role::Security => "security",
        }
    }
}

impl FromStr for Role {
    type Err = AlertDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faculty" => Ok(Role::Faculty),
            "security" => Ok(Role::Security),
            _ => Err(AlertDeskError::Error(format!("Invalid role: '{}'", s))),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_: AlertDeskError| FromSqlError::InvalidType)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. Only the auth module reads `password_hash`.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    user_id: i64,
    email: String,
    password_hash: String,
    name: String,
    role: Role,
}

impl User {
    const COLUMNS: &str = "id, email, password, name, role";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            user_id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            role: row.get(4)?,
        })
    }

    pub fn get_by_id(db: &Database, user_id: i64) -> Result<Option<Self>, AlertDeskError> {
        let conn = db.conn()?;
        let sql = format!("SELECT {} FROM user WHERE id = ?", Self::COLUMNS);

        conn.query_row(&sql, [user_id], Self::from_row)
            .optional()
            .map_err(AlertDeskError::DatabaseError)
    }

    pub fn get_by_email(db: &Database, email: &str) -> Result<Option<Self>, AlertDeskError> {
        let conn = db.conn()?;
        let sql = format!("SELECT {} FROM user WHERE email = ?", Self::COLUMNS);

        conn.query_row(&sql, [email], Self::from_row)
            .optional()
            .map_err(AlertDeskError::DatabaseError)
    }

    /// Inserts a new user. A duplicate email trips the UNIQUE constraint and is
    /// reported as `EmailTaken`.
    pub fn create(
        db: &Database,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> Result<Self, AlertDeskError> {
        let conn = db.conn()?;

        let result = conn.query_row(
            "INSERT INTO user (email, password, name, role)
            VALUES (:email, :password, :name, :role)
            RETURNING id",
            named_params! {
                ":email":    email,
                ":password": password_hash,
                ":name":     name,
                ":role":     role,
            },
            |row| row.get::<_, i64>(0),
        );

        let user_id = match result {
            Ok(id) => id,
            Err(rusqlite::Error::SqliteFailure(sqlite_err, _))
                if sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(AlertDeskError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(User {
            user_id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            name: name.to_owned(),
            role,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
