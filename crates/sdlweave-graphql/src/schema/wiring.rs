//! Runtime wiring: which resolver serves which field.
//!
//! Applications wire resolvers for the fields they compute; every other field
//! falls back to a property resolver that reads the same-named key from the
//! parent object value (or from the root value for root fields).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::{Name, Value};

/// A shareable field resolver.
pub type ResolverFn = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Key under which objects may name their concrete type, for interface and
/// union fields served by the property resolver.
pub const TYPENAME_KEY: &str = "__typename";

/// The value root fields are read from when they have no wired resolver.
#[derive(Debug, Clone)]
pub struct RootValue(pub Value);

/// Field resolvers keyed by `(type, field)`, plus an optional root value.
#[derive(Clone, Default)]
pub struct RuntimeWiring {
    resolvers: HashMap<(String, String), ResolverFn>,
    root_value: Option<Value>,
}

impl RuntimeWiring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `resolver` to `type_name.field_name`.
    #[must_use]
    pub fn resolver<F>(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: F,
    ) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.resolvers
            .insert((type_name.into(), field_name.into()), Arc::new(resolver));
        self
    }

    /// Sets the object root fields are read from.
    #[must_use]
    pub fn with_root_value(mut self, value: Value) -> Self {
        self.root_value = Some(value);
        self
    }

    #[must_use]
    pub fn root_value(&self) -> Option<&Value> {
        self.root_value.as_ref()
    }

    /// Returns `true` if a resolver is wired for `type_name.field_name`.
    #[must_use]
    pub fn is_wired(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers
            .contains_key(&(type_name.to_string(), field_name.to_string()))
    }

    /// The resolver serving `type_name.field_name`.
    ///
    /// `abstract_type` tells the property fallback that the field returns an
    /// interface or union, so values carrying `__typename` get tagged.
    pub(crate) fn field_resolver(
        &self,
        type_name: &str,
        field_name: &str,
        abstract_type: bool,
    ) -> ResolverFn {
        self.resolvers
            .get(&(type_name.to_string(), field_name.to_string()))
            .cloned()
            .unwrap_or_else(|| property_resolver(field_name, abstract_type))
    }
}

impl fmt::Debug for RuntimeWiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wired: Vec<String> = self
            .resolvers
            .keys()
            .map(|(t, field)| format!("{t}.{field}"))
            .collect();
        wired.sort();

        f.debug_struct("RuntimeWiring")
            .field("resolvers", &wired)
            .field("root_value", &self.root_value.is_some())
            .finish()
    }
}

/// Resolver reading `field_name` from the parent object value.
pub fn property_resolver(field_name: &str, abstract_type: bool) -> ResolverFn {
    let key = Name::new(field_name);

    Arc::new(move |ctx: ResolverContext<'_>| {
        let key = key.clone();
        FieldFuture::new(async move {
            let from_parent = match ctx.parent_value.as_value() {
                Some(Value::Object(object)) => Some(object.get(&key).cloned()),
                _ => None,
            };

            // Root fields have no parent object; fall back to the wired root value.
            let value = match from_parent {
                Some(value) => value,
                None => match ctx.data_opt::<RootValue>() {
                    Some(RootValue(Value::Object(root))) => root.get(&key).cloned(),
                    _ => None,
                },
            };

            Ok(value
                .filter(|v| !matches!(v, Value::Null))
                .map(|v| to_field_value(v, abstract_type)))
        })
    })
}

/// Converts a plain value into a field value, tagging objects that name their
/// concrete type when the field is abstract.
pub fn to_field_value(value: Value, abstract_type: bool) -> FieldValue<'static> {
    if !abstract_type {
        return FieldValue::value(value);
    }

    match value {
        Value::List(items) => {
            FieldValue::list(items.into_iter().map(|item| to_field_value(item, true)))
        }
        Value::Object(object) => {
            let concrete = match object.get(TYPENAME_KEY) {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            };
            match concrete {
                Some(name) => FieldValue::value(Value::Object(object)).with_type(name),
                None => FieldValue::value(Value::Object(object)),
            }
        }
        other => FieldValue::value(other),
    }
}
