//! Compiled query documents.

use async_graphql::dynamic::Schema;
use async_graphql::parser::types::{
    BaseType, DocumentOperations, ExecutableDocument, OperationDefinition, Type,
};
use async_graphql::{Name, Number, Request, Value, Variables};
use indexmap::IndexMap;

use super::entry::QueryError;
use super::validation::ValidateOnly;

/// A parsed executable document together with the text it was parsed from.
///
/// This is what the query cache stores: executing a cached document skips
/// the parse step.
#[derive(Debug, Clone)]
pub struct PreparsedDocument {
    pub query: String,
    pub document: ExecutableDocument,
}

impl PreparsedDocument {
    /// Parses `query` without checking it against any schema.
    ///
    /// # Errors
    ///
    /// Returns the parser error for text that is not a valid executable document.
    pub fn parse(query: &str) -> Result<Self, async_graphql::parser::Error> {
        let document = async_graphql::parser::parse_query(query)?;
        Ok(Self {
            query: query.to_string(),
            document,
        })
    }

    /// Parses `query` and validates it against `schema`; the compute
    /// function of the HTTP handlers.
    ///
    /// `schema` must carry the [`ValidationGate`](super::ValidationGate)
    /// extension, otherwise the validation run also executes the query.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error holding the parser error, or every
    /// validation error joined into one message.
    pub async fn compile(schema: &Schema, query: String) -> Result<Self, QueryError> {
        let document = Self::parse(&query).map_err(|e| QueryError::validation(e.to_string()))?;

        let mut request = Request::new(query).data(ValidateOnly);
        request.set_parsed_query(document.document.clone());
        let response = schema.execute(request).await;

        if response.errors.is_empty() {
            return Ok(document);
        }

        let message = response
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(QueryError::validation(message))
    }

    /// The operation selected by `operation_name`, or the only operation of
    /// the document when no name is given.
    #[must_use]
    pub fn operation(&self, operation_name: Option<&str>) -> Option<&OperationDefinition> {
        match (&self.document.operations, operation_name) {
            (DocumentOperations::Single(operation), _) => Some(&operation.node),
            (DocumentOperations::Multiple(operations), Some(name)) => {
                operations.get(name).map(|operation| &operation.node)
            }
            (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => {
                operations.values().next().map(|operation| &operation.node)
            }
            (DocumentOperations::Multiple(_), None) => None,
        }
    }

    /// Turns string parameters (URL query parameters) into variables.
    ///
    /// A parameter given once becomes a single value, one given more than
    /// once a list. Values are coerced to the type the selected operation
    /// declares for the variable of the same name: `Int`, `Float` and
    /// `Boolean` are parsed, list types always produce a list, and anything
    /// else (or anything that fails to parse) stays a string.
    #[must_use]
    pub fn coerce_parameters(
        &self,
        operation_name: Option<&str>,
        parameters: &[(String, String)],
    ) -> Variables {
        let mut grouped: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (name, value) in parameters {
            grouped.entry(name.as_str()).or_default().push(value.as_str());
        }

        let operation = self.operation(operation_name);

        let variables: IndexMap<Name, Value> = grouped
            .into_iter()
            .map(|(name, values)| {
                let value = coerce_values(declared_type(operation, name), &values);
                (Name::new(name), value)
            })
            .collect();

        Variables::from_value(Value::Object(variables))
    }
}

fn declared_type<'a>(operation: Option<&'a OperationDefinition>, name: &str) -> Option<&'a Type> {
    operation?
        .variable_definitions
        .iter()
        .find(|definition| definition.node.name.node.as_str() == name)
        .map(|definition| &definition.node.var_type.node)
}

fn coerce_values(declared: Option<&Type>, values: &[&str]) -> Value {
    match declared.map(|ty| &ty.base) {
        Some(BaseType::List(inner)) => Value::List(
            values
                .iter()
                .map(|value| coerce_scalar(base_name(inner), value))
                .collect(),
        ),
        Some(BaseType::Named(name)) => match values {
            [single] => coerce_scalar(Some(name.as_str()), single),
            many => Value::List(
                many.iter()
                    .map(|value| coerce_scalar(Some(name.as_str()), value))
                    .collect(),
            ),
        },
        None => match values {
            [single] => Value::String((*single).to_string()),
            many => Value::List(many.iter().map(|v| Value::String((*v).to_string())).collect()),
        },
    }
}

fn base_name(ty: &Type) -> Option<&str> {
    match &ty.base {
        BaseType::Named(name) => Some(name.as_str()),
        BaseType::List(_) => None,
    }
}

fn coerce_scalar(type_name: Option<&str>, value: &str) -> Value {
    let parsed = match type_name {
        Some("Int") => value.parse::<i64>().ok().map(|n| Value::Number(n.into())),
        Some("Float") => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some("Boolean") => value.parse::<bool>().ok().map(Value::Boolean),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(value.to_string()))
}
