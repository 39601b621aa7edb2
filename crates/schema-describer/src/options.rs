//! Read-time configuration for introspection back-ends.

/// Controls which objects a [`crate::SchemaDescriber`] retains.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOptions {
    /// If non-empty, only these fully-qualified table names are retained.
    pub include_tables: Vec<String>,
    /// Fully-qualified table names (or simple glob patterns) to drop.
    pub exclude_tables: Vec<String>,
    /// Namespace whitelist; `None` means all non-system namespaces.
    pub include_schemas: Option<Vec<String>>,
    /// Whether to read views.
    pub include_views: bool,
    /// Whether to read indexes.
    pub include_indexes: bool,
    /// Whether to read foreign key constraints.
    pub include_foreign_keys: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            include_schemas: None,
            include_views: true,
            include_indexes: true,
            include_foreign_keys: true,
        }
    }
}

impl ReadOptions {
    /// Whether a fully-qualified table name should be kept under these
    /// options.
    pub fn retains_table(&self, full_name: &str) -> bool {
        if !self.include_tables.is_empty() && !self.include_tables.iter().any(|t| t == full_name) {
            return false;
        }

        !self.exclude_tables.iter().any(|t| t == full_name)
    }

    /// Whether a namespace should be read at all.
    pub fn retains_schema(&self, schema: &str) -> bool {
        match &self.include_schemas {
            Some(allowed) => allowed.iter().any(|s| s == schema),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reads_everything() {
        let opts = ReadOptions::default();
        assert!(opts.retains_table("public.users"));
        assert!(opts.retains_schema("public"));
        assert!(opts.include_views);
        assert!(opts.include_indexes);
        assert!(opts.include_foreign_keys);
    }

    #[test]
    fn include_list_is_a_whitelist() {
        let opts = ReadOptions {
            include_tables: vec!["public.users".into()],
            ..ReadOptions::default()
        };
        assert!(opts.retains_table("public.users"));
        assert!(!opts.retains_table("public.products"));
    }

    #[test]
    fn exclude_list_drops_matches() {
        let opts = ReadOptions {
            exclude_tables: vec!["public.audit_log".into()],
            ..ReadOptions::default()
        };
        assert!(!opts.retains_table("public.audit_log"));
        assert!(opts.retains_table("public.users"));
    }
}
