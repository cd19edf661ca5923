//! The `@connection` schema directive.
//!
//! A field declared as
//!
//! ```graphql
//! getItems(first: Int, after: String): ItemConnection @connection(for: "Item")
//! ```
//!
//! makes the schema loader synthesize the relay cursor-pagination family
//! named after the field's return type:
//!
//! ```graphql
//! type ItemConnection { edges: [ItemConnectionEdge] pageInfo: PageInfo }
//! type ItemConnectionEdge { cursor: String node: Item }
//! type PageInfo {
//!     hasPreviousPage: Boolean!
//!     hasNextPage: Boolean!
//!     startCursor: String!
//!     endCursor: String!
//! }
//! ```

use async_graphql_value::ConstValue;

use super::ast::{DirectiveUsage, FieldDefinition, ObjectTypeDefinition, TypeRef};

/// Name of the pagination directive.
pub const CONNECTION_DIRECTIVE: &str = "connection";

/// The directive's only argument: the node type name.
pub const FOR_ARGUMENT: &str = "for";

/// Name of the shared page-info type.
pub const PAGE_INFO: &str = "PageInfo";

/// Suffix appended to the connection type name to form the edge type name.
pub const EDGE_SUFFIX: &str = "Edge";

/// SDL declaration of the directive, for schema authors to include.
pub const CONNECTION_DIRECTIVE_SDL: &str =
    "directive @connection(for: String!) on FIELD_DEFINITION";

/// A validated `@connection` usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUsage {
    /// Base name of the declaring field's return type (`C`).
    pub connection_type: String,
    /// Value of the `for` argument (`N`).
    pub node_type: String,
}

impl ConnectionUsage {
    /// Extracts a usage from a directive applied to `field`.
    ///
    /// Returns `Ok(None)` for directives other than `@connection`.
    ///
    /// # Errors
    ///
    /// Returns a message describing a missing or non-string `for` argument.
    pub fn from_directive(
        field: &FieldDefinition,
        directive: &DirectiveUsage,
    ) -> Result<Option<Self>, String> {
        if directive.name != CONNECTION_DIRECTIVE {
            return Ok(None);
        }

        let node_type = match directive.argument(FOR_ARGUMENT) {
            Some(ConstValue::String(name)) => name.clone(),
            Some(other) => {
                return Err(format!(
                    "argument '{FOR_ARGUMENT}' must be a string, got {other}"
                ));
            }
            None => return Err(format!("missing required argument '{FOR_ARGUMENT}'")),
        };

        Ok(Some(Self {
            connection_type: field.ty.base_name().to_string(),
            node_type,
        }))
    }

    /// Name of the synthesized edge type (`C` + `"Edge"`).
    #[must_use]
    pub fn edge_type(&self) -> String {
        format!("{}{EDGE_SUFFIX}", self.connection_type)
    }

    /// The three synthesized definitions, in registration order.
    #[must_use]
    pub fn synthesize(&self) -> [ObjectTypeDefinition; 3] {
        [
            connection_definition(&self.connection_type, &self.edge_type()),
            edge_definition(&self.edge_type(), &self.node_type),
            page_info_definition(),
        ]
    }
}

fn connection_definition(name: &str, edge_type: &str) -> ObjectTypeDefinition {
    ObjectTypeDefinition::new(name)
        .field(FieldDefinition::new(
            "edges",
            TypeRef::list(TypeRef::named(edge_type)),
        ))
        .field(FieldDefinition::new("pageInfo", TypeRef::named(PAGE_INFO)))
}

fn edge_definition(name: &str, node_type: &str) -> ObjectTypeDefinition {
    ObjectTypeDefinition::new(name)
        .field(FieldDefinition::new("cursor", TypeRef::named("String")))
        .field(FieldDefinition::new("node", TypeRef::named(node_type)))
}

/// The shared `PageInfo` shape.
#[must_use]
pub fn page_info_definition() -> ObjectTypeDefinition {
    let required = |name: &str| TypeRef::non_null(TypeRef::named(name));

    ObjectTypeDefinition::new(PAGE_INFO)
        .field(FieldDefinition::new("hasPreviousPage", required("Boolean")))
        .field(FieldDefinition::new("hasNextPage", required("Boolean")))
        .field(FieldDefinition::new("startCursor", required("String")))
        .field(FieldDefinition::new("endCursor", required("String")))
}
