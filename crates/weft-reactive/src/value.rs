#![forbid(unsafe_code)]

//! Dynamic property payloads.
//!
//! [`Value`] is what an [`Entity`](crate::entity::Entity) property holds and
//! what property-change notifications carry. Reading an unset property
//! yields [`Value::Null`] — "no value yet" is a defined state, never an
//! error, and the path binder resolves through it the same way.
//!
//! Equality is structural for scalars and handle identity for entities: two
//! `Value::Entity` values are equal only when they refer to the same
//! underlying entity.

use crate::entity::Entity;

/// A dynamically-typed property value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent / not-yet-set. The default for any unset property.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A nested entity, enabling dotted-path traversal.
    Entity(Entity),
}

impl Value {
    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The contained entity, if this value is one. Scalars and `Null`
    /// return `None` — for path walking they behave identically: no
    /// onward properties.
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Self::Entity(e)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert_eq!(Value::default(), Value::Null);
        assert!(Value::default().is_null());
    }

    #[test]
    fn scalar_equality_is_structural() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("abc"), Value::Str("abc".to_string()));
        assert_ne!(Value::Int(3), Value::Float(3.0));
    }

    #[test]
    fn entity_equality_is_identity() {
        let a = Entity::new();
        let b = Entity::new();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Int(5));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(9).as_int(), Some(9));
        assert_eq!(Value::Str("x".into()).as_str(), Some("x"));
        assert!(Value::Null.as_entity().is_none());
        assert!(Value::Int(1).as_entity().is_none());
    }
}
