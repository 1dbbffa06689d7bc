//! Schema model
//!
//! A schema is an ordered list of fields. Each field names a key, says
//! whether it is required, and carries the predicate its value must satisfy.
//! Predicates form a closed set so the validator can walk them exhaustively.

/// Constraint a configuration value must satisfy
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    String,
    /// JSON integer; floats are rejected
    Integer,
    Boolean,
    /// Any JSON object
    Mapping,
    /// JSON object whose values are all strings
    StringMap,
    /// JSON array whose items all satisfy the inner predicate
    ListOf(Box<Predicate>),
    /// JSON object validated against a nested schema
    Nested(Schema),
    /// Any value at all
    Any,
}

impl Predicate {
    pub fn list_of(item: Predicate) -> Self {
        Predicate::ListOf(Box::new(item))
    }

    pub fn nested(schema: Schema) -> Self {
        Predicate::Nested(schema)
    }

    /// Human readable form used in error messages
    pub fn expected(&self) -> &'static str {
        match self {
            Predicate::String => "a string",
            Predicate::Integer => "an integer",
            Predicate::Boolean => "a boolean",
            Predicate::Mapping | Predicate::Nested(_) => "a mapping",
            Predicate::StringMap => "a mapping of strings",
            Predicate::ListOf(_) => "a list",
            Predicate::Any => "any value",
        }
    }
}

/// One key of a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub required: bool,
    pub predicate: Predicate,
}

/// Ordered set of fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field
    ///
    /// # Panics
    /// Panics if the key is already declared
    pub fn required(self, key: &str, predicate: Predicate) -> Self {
        self.field(key, true, predicate)
    }

    /// Adds an optional field
    ///
    /// # Panics
    /// Panics if the key is already declared
    pub fn optional(self, key: &str, predicate: Predicate) -> Self {
        self.field(key, false, predicate)
    }

    fn field(mut self, key: &str, required: bool, predicate: Predicate) -> Self {
        if self.fields.iter().any(|f| f.key == key) {
            panic!("Field '{}' is already declared", key);
        }
        self.fields.push(Field {
            key: key.to_string(),
            required,
            predicate,
        });
        self
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by key
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let schema = Schema::new()
            .required("queue_name", Predicate::String)
            .optional("queue_delivery_delay", Predicate::Integer);

        let keys: Vec<_> = schema.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["queue_name", "queue_delivery_delay"]);
        assert!(schema.get("queue_name").unwrap().required);
        assert!(!schema.get("queue_delivery_delay").unwrap().required);
    }

    #[test]
    #[should_panic(expected = "already declared")]
    fn test_duplicate_field() {
        let _ = Schema::new()
            .required("name", Predicate::String)
            .optional("name", Predicate::String);
    }

    #[test]
    fn test_expected_descriptions() {
        assert_eq!(Predicate::list_of(Predicate::String).expected(), "a list");
        assert_eq!(Predicate::nested(Schema::new()).expected(), "a mapping");
    }
}
