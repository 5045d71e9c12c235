use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use log::info;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{named_params, Connection, OptionalExtension, Row, ToSql, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::AlertDeskError;
use crate::users::User;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = AlertDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "resolved" => Ok(AlertStatus::Resolved),
            _ => Err(AlertDeskError::Error(format!("Invalid alert status: '{}'", s))),
        }
    }
}

impl ToSql for AlertStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AlertStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_: AlertDeskError| FromSqlError::InvalidType)
    }
}

/// An alert row joined with the names of its creator and, once
/// acknowledged, its acknowledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertView {
    pub alert_id: i64,
    pub user_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by_name: Option<String>,
}

impl AlertView {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AlertView {
            alert_id: row.get(0)?,
            user_name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            timestamp: row.get(4)?,
            status: row.get(5)?,
            acknowledged: row.get(6)?,
            acknowledged_at: row.get(7)?,
            acknowledged_by_name: row.get(8)?,
        })
    }
}

const SELECT_VIEW_SQL: &str = r#"
    SELECT
        a.id,
        creator.name,
        a.latitude,
        a.longitude,
        a.timestamp,
        a.status,
        a.acknowledged,
        a.acknowledged_at,
        acker.name
    FROM alert a
    JOIN user creator ON creator.id = a.user_id
    LEFT JOIN user acker ON acker.id = a.acknowledged_by
"#;

/// Stored timestamps are UTC, truncated to microseconds.
fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub struct Alerts;

impl Alerts {
    /// Records a new active alert raised by `creator` and returns its id.
    /// The caller is responsible for checking that `creator` is faculty.
    pub fn create_alert(
        db: &Database,
        creator: &User,
        latitude: f64,
        longitude: f64,
    ) -> Result<i64, AlertDeskError> {
        let conn = db.conn()?;

        let sql = r#"
            INSERT INTO alert (
                user_id,
                latitude,
                longitude,
                timestamp,
                status,
                acknowledged
            )
            VALUES (
                :user_id,
                :latitude,
                :longitude,
                :timestamp,
                :status,
                0
            )
            RETURNING id
        "#;

        let alert_id: i64 = conn.query_row(
            sql,
            named_params! {
                ":user_id":   creator.user_id(),
                ":latitude":  latitude,
                ":longitude": longitude,
                ":timestamp": now_utc(),
                ":status":    AlertStatus::Active,
            },
            |row| row.get(0),
        )?;

        info!(
            "Alert {} raised by {} at ({}, {})",
            alert_id,
            creator.email(),
            latitude,
            longitude
        );

        Ok(alert_id)
    }

    /// All alerts, newest first. Any storage failure fails the whole call.
    pub fn list_alerts(db: &Database) -> Result<Vec<AlertView>, AlertDeskError> {
        Self::query_all(db).map_err(|e| AlertDeskError::internal("fetch alerts", e))
    }

    fn query_all(db: &Database) -> Result<Vec<AlertView>, AlertDeskError> {
        let conn = db.conn()?;
        let sql = format!("{} ORDER BY a.timestamp DESC, a.id DESC", SELECT_VIEW_SQL);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], AlertView::from_row)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }

        Ok(alerts)
    }

    /// Marks the alert resolved by `acknowledger`. Acknowledging an already
    /// resolved alert is allowed and replaces the earlier acknowledgment.
    ///
    /// Runs in one transaction; anything short of a successful commit leaves
    /// the row as it was.
    pub fn acknowledge_alert(
        db: &Database,
        alert_id: i64,
        acknowledger: &User,
    ) -> Result<AlertView, AlertDeskError> {
        match Self::acknowledge_in_tx(db, alert_id, acknowledger) {
            Ok(view) => {
                info!("Alert {} acknowledged by {}", alert_id, acknowledger.email());
                Ok(view)
            }
            Err(e @ AlertDeskError::AlertNotFound(_)) => Err(e),
            Err(e) => Err(AlertDeskError::internal("acknowledge alert", e)),
        }
    }

    fn acknowledge_in_tx(
        db: &Database,
        alert_id: i64,
        acknowledger: &User,
    ) -> Result<AlertView, AlertDeskError> {
        let mut conn = db.conn()?;
        // Take the write lock up front so a concurrent acknowledgment waits on
        // the busy timeout. Dropping without commit rolls back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM alert WHERE id = ?)",
            [alert_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AlertDeskError::AlertNotFound(alert_id));
        }

        let sql = r#"
            UPDATE alert
            SET acknowledged = 1,
                acknowledged_at = :acknowledged_at,
                acknowledged_by = :acknowledged_by,
                status = :status
            WHERE id = :alert_id
        "#;

        tx.execute(
            sql,
            named_params! {
                ":acknowledged_at": now_utc(),
                ":acknowledged_by": acknowledger.user_id(),
                ":status":          AlertStatus::Resolved,
                ":alert_id":        alert_id,
            },
        )?;

        let view = Self::get_view(&tx, alert_id)?.ok_or(AlertDeskError::AlertNotFound(alert_id))?;

        tx.commit()?;

        Ok(view)
    }

    fn get_view(conn: &Connection, alert_id: i64) -> Result<Option<AlertView>, AlertDeskError> {
        let sql = format!("{} WHERE a.id = ?", SELECT_VIEW_SQL);

        conn.query_row(&sql, [alert_id], AlertView::from_row)
            .optional()
            .map_err(AlertDeskError::DatabaseError)
    }
}
