pub const SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,     -- PHC-format Argon2 hash
    name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('faculty', 'security'))
);

CREATE TABLE IF NOT EXISTS alert (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    timestamp TEXT NOT NULL,    -- UTC
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'resolved')),
    acknowledged BOOLEAN NOT NULL DEFAULT 0,
    acknowledged_at TEXT,       -- UTC
    acknowledged_by INTEGER,
    FOREIGN KEY (user_id) REFERENCES user(id),
    FOREIGN KEY (acknowledged_by) REFERENCES user(id)
);

CREATE INDEX IF NOT EXISTS idx_alert_timestamp ON alert (timestamp);

COMMIT;
"#;
