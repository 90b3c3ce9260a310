use std::sync::OnceLock;
use regex::Regex;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// This parser uses regex patterns to extract structured information from
/// database constraint violation messages, with caching for performance.
/// Constraint names are resolved against the known table names of this schema
/// first, since several tables here are multi-word (`automation_events`,
/// `automation_email_links`) and a naive underscore split would misattribute
/// the entity.
pub struct ConstraintParser;

/// Schema tables, longest name first so prefix matching is unambiguous.
const KNOWN_TABLES: &[&str] = &[
    "automation_email_links",
    "automation_events",
    "automations",
    "emails",
    "users",
];

/// Compiled regex patterns for constraint parsing, cached for performance
struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // Matches "Key (field)=(value)" pattern in PostgreSQL messages
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").unwrap(),
            // Matches column names in quotes
            column_name: Regex::new(r#"column "([^"]+)""#).unwrap(),
            // Matches table names in quotes
            table_name: Regex::new(r#"table "([^"]+)""#).unwrap(),
        }
    }
}

/// Global regex patterns cache
static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    /// Gets the cached regex patterns, initializing them if necessary
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Parses a unique constraint violation message to extract structured information.
    ///
    /// Attempts to extract entity, field, and value from PostgreSQL unique constraint
    /// violation messages using regex patterns and constraint name analysis.
    ///
    /// # Arguments
    /// * `message` - The database error message
    /// * `constraint_name` - Optional constraint name from the database
    ///
    /// # Returns
    /// Optional tuple of (entity, field, value) if parsing succeeds
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        // Try to parse from constraint name first (e.g., "users_email_key")
        if let Some(constraint) = constraint_name {
            if let Some((entity, field)) = Self::parse_constraint_name(constraint) {
                // Extract value from message using regex
                if let Some(value) = Self::extract_value_from_message(message) {
                    return Some((entity, field, value));
                }
                // Fallback to generic value if we can't parse it
                return Some((entity, field, "duplicate_value".to_string()));
            }
        }

        // Fallback: try to parse from the error message directly
        if let Some((field, value)) = Self::extract_key_value_from_message(message) {
            let entity = Self::extract_table_from_message(message)
                .unwrap_or_else(|| "resource".to_string());
            return Some((entity, field, value));
        }

        None
    }

    /// Parses a not null constraint violation message.
    ///
    /// # Arguments
    /// * `message` - The database error message
    /// * `constraint_name` - Optional constraint name from the database
    ///
    /// # Returns
    /// Optional tuple of (entity, field) if parsing succeeds
    pub fn parse_not_null_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        // Try to extract field from message using regex
        if let Some(field) = Self::extract_column_from_message(message) {
            let entity = Self::extract_table_from_message(message)
                .or_else(|| {
                    constraint_name.and_then(|c| Self::parse_constraint_name(c).map(|(e, _)| e))
                })
                .unwrap_or_else(|| "resource".to_string());
            return Some((entity, field));
        }

        None
    }

    /// Parses a foreign key constraint violation message.
    ///
    /// # Arguments
    /// * `message` - The database error message
    /// * `constraint_name` - Optional constraint name from the database
    ///
    /// # Returns
    /// Optional tuple of (entity, field, referenced_value) if parsing succeeds
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        // Try to parse from constraint name (e.g., "automation_email_links_email_id_fkey")
        if let Some(constraint) = constraint_name {
            if let Some((entity, field)) = Self::parse_foreign_key_constraint_name(constraint) {
                if let Some(value) = Self::extract_value_from_message(message) {
                    return Some((entity, field, value));
                }
                return Some((entity, field, "invalid_reference".to_string()));
            }
        }

        // Fallback: parse from message
        if let Some((field, value)) = Self::extract_key_value_from_message(message) {
            let entity = Self::extract_table_from_message(message)
                .unwrap_or_else(|| "resource".to_string());
            return Some((entity, field, value));
        }

        None
    }

    /// Parses a check constraint violation message.
    ///
    /// # Arguments
    /// * `message` - The database error message
    /// * `constraint_name` - Optional constraint name from the database
    ///
    /// # Returns
    /// Optional tuple of (entity, field) if parsing succeeds
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        // Try to parse from constraint name
        if let Some(constraint) = constraint_name {
            if let Some((entity, field)) = Self::parse_constraint_name(constraint) {
                return Some((entity, field));
            }
        }

        // Fallback: try to extract from message
        if let Some(field) = Self::extract_column_from_message(message) {
            let entity = Self::extract_table_from_message(message)
                .unwrap_or_else(|| "resource".to_string());
            return Some((entity, field));
        }

        None
    }

    /// Parses a constraint name to extract entity and field information.
    ///
    /// Known table names are matched as prefixes before falling back to a
    /// plain underscore split:
    /// - "users_email_key" -> ("users", "email")
    /// - "automation_events_enrollment_key" -> ("automation_events", "enrollment")
    /// - "automation_email_links_delay_hours_check" -> ("automation_email_links", "delay_hours")
    ///
    /// # Arguments
    /// * `constraint_name` - The constraint name to parse
    ///
    /// # Returns
    /// Optional tuple of (entity, field) if parsing succeeds
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        if let Some((entity, rest)) = Self::split_known_table_prefix(constraint_name) {
            let field = Self::strip_constraint_suffix(rest);
            if !field.is_empty() {
                return Some((entity.to_string(), field.to_string()));
            }
        }

        // Unknown table: best-effort split like "<table>_<field>_<suffix>"
        let parts: Vec<&str> = constraint_name.split('_').collect();
        if parts.len() >= 3 {
            let entity = parts[0].to_string();
            let field = parts[1].to_string();
            return Some((entity, field));
        }
        None
    }

    /// Parses a foreign key constraint name to extract entity and field information.
    ///
    /// Handles patterns like "automation_email_links_email_id_fkey"
    /// -> ("automation_email_links", "email_id")
    ///
    /// # Arguments
    /// * `constraint_name` - The foreign key constraint name to parse
    ///
    /// # Returns
    /// Optional tuple of (entity, field) if parsing succeeds
    pub fn parse_foreign_key_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let without_suffix = constraint_name.strip_suffix("_fkey")?;

        if let Some((entity, field)) = Self::split_known_table_prefix(without_suffix) {
            if !field.is_empty() {
                return Some((entity.to_string(), field.to_string()));
            }
        }

        let parts: Vec<&str> = without_suffix.split('_').collect();
        if parts.len() >= 2 {
            let entity = parts[0].to_string();
            // Handle multi-part field names like "user_id"
            let field = parts[1..].join("_");
            return Some((entity, field));
        }
        None
    }

    /// Splits "<table>_<rest>" on the longest matching known table name.
    fn split_known_table_prefix(name: &str) -> Option<(&'static str, &str)> {
        for table in KNOWN_TABLES {
            if let Some(rest) = name.strip_prefix(table) {
                if let Some(rest) = rest.strip_prefix('_') {
                    return Some((table, rest));
                }
            }
        }
        None
    }

    /// Removes trailing "_key"/"_idx"/"_check"/"_unique" markers from a field part.
    fn strip_constraint_suffix(rest: &str) -> &str {
        for suffix in ["_key", "_idx", "_check", "_unique"] {
            if let Some(stripped) = rest.strip_suffix(suffix) {
                return stripped;
            }
        }
        rest
    }

    /// Extracts a column name from a database error message using regex.
    ///
    /// Looks for patterns like "column \"field_name\"" in PostgreSQL messages.
    pub fn extract_column_from_message(message: &str) -> Option<String> {
        let patterns = Self::patterns();
        patterns.column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts a table name from a database error message using regex.
    ///
    /// Looks for patterns like "table \"table_name\"" in PostgreSQL messages.
    pub fn extract_table_from_message(message: &str) -> Option<String> {
        let patterns = Self::patterns();
        patterns.table_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts key-value pairs from database error messages using regex.
    ///
    /// Looks for patterns like "Key (field)=(value)" in PostgreSQL messages;
    /// composite keys come back as comma-joined lists.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let patterns = Self::patterns();
        patterns.key_value
            .captures(message)
            .and_then(|caps| {
                let field = caps.get(1)?.as_str().to_string();
                let value = caps.get(2)?.as_str().to_string();
                Some((field, value))
            })
    }

    /// Extracts a value from a database error message.
    ///
    /// First tries the Key (field)=(value) pattern, then falls back to the
    /// first quoted string.
    pub fn extract_value_from_message(message: &str) -> Option<String> {
        if let Some((_, value)) = Self::extract_key_value_from_message(message) {
            return Some(value);
        }

        if let Some(start) = message.find('"') {
            if let Some(end) = message[start + 1..].find('"') {
                return Some(message[start + 1..start + 1 + end].to_string());
            }
        }

        None
    }
}
