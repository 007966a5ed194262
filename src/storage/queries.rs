//! SQL query builders.
//!
//! Generates the schema and statements for the `messages` table.

/// Get the list of columns for the messages table.
///
/// Returns tuples of (column_name, parameter_placeholder). `seq` is not
/// listed; SQLite assigns it on every insert.
pub fn get_message_columns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("message_id", "?1"),
        ("sender", "?2"),
        ("recipient", "?3"),
        ("title", "?4"),
        ("body", "?5"),
        ("image_url", "?6"),
        // Raw event attributes as a JSON object
        ("data", "?7"),
        ("collapse_key", "?8"),
        ("message_type", "?9"),
        // Delivery metadata
        ("sent_time", "?10"),
        ("ttl", "?11"),
        ("priority", "?12"),
        ("original_priority", "?13"),
        // Tagged payload JSON, NULL when none was decoded
        ("payload", "?14"),
    ]
}

/// Schema for the messages table.
///
/// `seq` orders records that share a `sent_time`; a replaced record gets a
/// fresh `seq` because `INSERT OR REPLACE` deletes the old row first.
pub fn build_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        seq               INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id        TEXT NOT NULL UNIQUE,
        sender            TEXT,
        recipient         TEXT,
        title             TEXT,
        body              TEXT,
        image_url         TEXT NOT NULL DEFAULT '',
        data              TEXT NOT NULL DEFAULT '{}',
        collapse_key      TEXT,
        message_type      TEXT,
        sent_time         INTEGER NOT NULL,
        ttl               INTEGER NOT NULL DEFAULT 0,
        priority          INTEGER NOT NULL DEFAULT 0,
        original_priority INTEGER NOT NULL DEFAULT 0,
        payload           TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_messages_sent_time ON messages (sent_time DESC, seq ASC);
    "#
}

/// Build the upsert for one message.
pub fn build_message_insert() -> String {
    let columns = get_message_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<&str> = columns.iter().map(|(_, ph)| *ph).collect();

    format!(
        "INSERT OR REPLACE INTO messages ({}) VALUES ({})",
        col_names.join(", "),
        placeholders.join(", ")
    )
}

/// Build the ordered read of every message, newest first.
pub fn build_message_select() -> String {
    let columns = get_message_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

    format!(
        "SELECT {} FROM messages ORDER BY sent_time DESC, seq ASC",
        col_names.join(", ")
    )
}

/// Build the lookup of a single message by id.
pub fn build_message_lookup() -> String {
    let columns = get_message_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

    format!(
        "SELECT {} FROM messages WHERE message_id = ?1",
        col_names.join(", ")
    )
}

/// Build the delete of one message by id.
pub fn build_message_delete() -> &'static str {
    "DELETE FROM messages WHERE message_id = ?1"
}
