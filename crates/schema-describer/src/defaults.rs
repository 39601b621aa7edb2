//! Small parsing helpers shared by the back-ends when a catalog driver
//! hands back a numeric or boolean catalog column as text.

/// Whether `default` looks like a PostgreSQL identity/serial default, i.e.
/// begins with `nextval`.
pub fn looks_like_postgres_identity(default: &str) -> bool {
    default.trim_start().to_lowercase().starts_with("nextval")
}

/// Whether a MySQL `COLUMNS.EXTRA` value marks the column auto-increment.
pub fn looks_like_mysql_auto_increment(extra: &str) -> bool {
    extra.to_lowercase().contains("auto_increment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_postgres_identity_default() {
        assert!(looks_like_postgres_identity("nextval('users_id_seq'::regclass)"));
        assert!(!looks_like_postgres_identity("'active'::text"));
    }

    #[test]
    fn detects_mysql_auto_increment() {
        assert!(looks_like_mysql_auto_increment("auto_increment"));
        assert!(looks_like_mysql_auto_increment("AUTO_INCREMENT"));
        assert!(!looks_like_mysql_auto_increment(""));
    }
}
