//! Per-record-type table binding.
//!
//! # Responsibility
//! - Name the table (and optional schema) a record type maps to.
//! - Derive default table names from Rust type names.

use once_cell::sync::Lazy;
use regex::Regex;

static LOWER_TO_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex is valid"));
static ACRONYM_TO_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex is valid"));

/// Maps a CamelCase type name to its snake_case table name.
///
/// `UserProfile` -> `user_profile`, `HTTPLog` -> `http_log`.
pub fn smallcase(type_name: &str) -> String {
    let spaced = ACRONYM_TO_WORD.replace_all(type_name, "${1}_${2}");
    let spaced = LOWER_TO_UPPER.replace_all(&spaced, "${1}_${2}");
    spaced.to_lowercase()
}

/// Unqualified, non-generic name of `T` (`app::models::User<X>` -> `User`).
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Table binding for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    table: String,
    schema: Option<String>,
    aliases: Vec<(String, String)>,
}

impl TableDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            aliases: Vec::new(),
        }
    }

    /// Descriptor whose table is the snake-cased name of `T`.
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(smallcase(short_type_name::<T>()))
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Registers a human-readable label for `field`.
    pub fn with_alias(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.aliases.push((field.into(), label.into()));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// `schema.table` when a schema is set, otherwise `table`.
    pub fn source(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }

    /// Label registered for `field`, or the field name itself.
    pub fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(name, _)| name == field)
            .map_or(field, |(_, label)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{short_type_name, smallcase, TableDescriptor};

    struct UserProfile;

    #[test]
    fn smallcase_handles_words_and_acronyms() {
        assert_eq!(smallcase("User"), "user");
        assert_eq!(smallcase("UserProfile"), "user_profile");
        assert_eq!(smallcase("HTTPLog"), "http_log");
        assert_eq!(smallcase("Order2Item"), "order2_item");
        assert_eq!(smallcase("already_snake"), "already_snake");
    }

    #[test]
    fn for_type_uses_short_type_name() {
        assert_eq!(short_type_name::<UserProfile>(), "UserProfile");
        assert_eq!(short_type_name::<Vec<UserProfile>>(), "Vec");
        assert_eq!(TableDescriptor::for_type::<UserProfile>().table(), "user_profile");
    }

    #[test]
    fn source_is_schema_qualified_when_schema_present() {
        let plain = TableDescriptor::new("users");
        assert_eq!(plain.source(), "users");
        assert_eq!(plain.schema(), None);

        let qualified = TableDescriptor::new("users").in_schema("main");
        assert_eq!(qualified.source(), "main.users");
    }

    #[test]
    fn label_falls_back_to_field_name() {
        let descriptor = TableDescriptor::new("users").with_alias("email", "E-mail address");
        assert_eq!(descriptor.label("email"), "E-mail address");
        assert_eq!(descriptor.label("name"), "name");
    }
}
