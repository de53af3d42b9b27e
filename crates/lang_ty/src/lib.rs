mod schema;

use std::collections::BTreeMap;
use std::fmt;

use derive_more::Debug;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

pub use schema::{SchemaError, SchemaIndex};

/// Shape of a resource body, property or module body as far as completion
/// cares: enough structure to list members and build skeletons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TypeDescriptor {
    Any,
    String,
    Int,
    Bool,
    #[debug("Array({items:?})")]
    Array { items: Box<TypeDescriptor> },
    #[debug("Object({name:?}, {properties:?})")]
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<SmolStr>,
        #[serde(default)]
        properties: BTreeMap<SmolStr, PropertyDescriptor>,
    },
    /// A closed set of string values.
    #[debug("Enum({values:?})")]
    Enum { values: Vec<SmolStr> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    #[serde(flatten)]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl TypeDescriptor {
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyDescriptor)>,
        K: Into<SmolStr>,
    {
        TypeDescriptor::Object {
            name: None,
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn array(items: TypeDescriptor) -> Self {
        TypeDescriptor::Array {
            items: Box::new(items),
        }
    }

    /// The body every `module` declaration shares.
    pub fn module_body() -> Self {
        TypeDescriptor::Object {
            name: Some("module".into()),
            properties: [
                (
                    SmolStr::new("name"),
                    PropertyDescriptor::new(TypeDescriptor::String)
                        .required()
                        .with_description("The name of the deployment."),
                ),
                (
                    SmolStr::new("params"),
                    PropertyDescriptor::new(TypeDescriptor::object::<_, SmolStr>([]))
                        .with_description("Values for the parameters of the module."),
                ),
                (
                    SmolStr::new("scope"),
                    PropertyDescriptor::new(TypeDescriptor::Any)
                        .with_description("The scope the module is deployed to."),
                ),
                (
                    SmolStr::new("dependsOn"),
                    PropertyDescriptor::new(TypeDescriptor::array(TypeDescriptor::Any))
                        .with_description("Explicit dependencies of the deployment."),
                ),
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeDescriptor::Object { .. })
    }

    /// Objects and arrays: their values span more than a token.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeDescriptor::Object { .. } | TypeDescriptor::Array { .. })
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        match self {
            TypeDescriptor::Object { properties, .. } => properties.get(name),
            _ => None,
        }
    }

    pub fn members(&self) -> Vec<Member> {
        let TypeDescriptor::Object { properties, .. } = self else {
            return Vec::new();
        };
        properties
            .iter()
            .map(|(name, prop)| Member {
                name: name.clone(),
                ty: prop.ty.clone(),
                required: prop.required,
                description: prop.description.clone(),
            })
            .collect()
    }

    /// Names of the required properties, in name order.
    pub fn required_properties(&self) -> Vec<SmolStr> {
        match self {
            TypeDescriptor::Object { properties, .. } => properties
                .iter()
                .filter(|(_, p)| p.required)
                .map(|(name, _)| name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Any => write!(f, "any"),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::Int => write!(f, "int"),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Array { items } => write!(f, "{items}[]"),
            TypeDescriptor::Object { name: Some(name), .. } => write!(f, "{name}"),
            TypeDescriptor::Object { name: None, .. } => write!(f, "object"),
            TypeDescriptor::Enum { values } => {
                let quoted: Vec<_> = values.iter().map(|v| format!("'{v}'")).collect();
                write!(f, "{}", quoted.join(" | "))
            }
        }
    }
}

/// One property of an object type, as handed to the completion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("{name}: {ty}")]
pub struct Member {
    pub name: SmolStr,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LookupError {
    #[error("unknown resource type `{0}`")]
    #[diagnostic(code(lang_ty::unknown_type))]
    UnknownType(SmolStr),

    #[error("no type information available for `{0}`")]
    #[diagnostic(code(lang_ty::not_found))]
    NotFound(SmolStr),
}

/// Read-only access to resource type information.
pub trait TypeProvider {
    /// Body type of a resource type id such as
    /// `Microsoft.Storage/storageAccounts@2023-01-01`.
    fn lookup_type(&self, id: &str) -> Result<TypeDescriptor, LookupError>;

    /// Known type ids matching `prefix`. Providers may return a superset;
    /// callers filter again.
    fn available_types(&self, prefix: &str) -> Vec<SmolStr>;

    fn members_of(&self, ty: &TypeDescriptor) -> Vec<Member> {
        ty.members()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(TypeDescriptor::String.to_string(), "string");
        assert_eq!(TypeDescriptor::array(TypeDescriptor::Int).to_string(), "int[]");
        assert_eq!(TypeDescriptor::object::<_, SmolStr>([]).to_string(), "object");
        assert_eq!(TypeDescriptor::module_body().to_string(), "module");
        let e = TypeDescriptor::Enum {
            values: vec!["Hot".into(), "Cool".into()],
        };
        assert_eq!(e.to_string(), "'Hot' | 'Cool'");
    }

    #[test]
    fn members_are_sorted_by_name() {
        let ty = TypeDescriptor::object([
            ("sku", PropertyDescriptor::new(TypeDescriptor::String).required()),
            ("kind", PropertyDescriptor::new(TypeDescriptor::String)),
        ]);
        let names: Vec<_> = ty.members().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["kind", "sku"]);
        assert_eq!(ty.required_properties(), vec![SmolStr::new("sku")]);
    }

    #[test]
    fn non_objects_have_no_members() {
        assert!(TypeDescriptor::String.members().is_empty());
        assert!(TypeDescriptor::array(TypeDescriptor::Any).property("x").is_none());
    }

    #[test]
    fn module_body_shape() {
        let body = TypeDescriptor::module_body();
        assert_eq!(body.required_properties(), vec![SmolStr::new("name")]);
        assert!(body.property("params").is_some_and(|p| p.ty.is_object()));
        assert!(body.property("dependsOn").is_some_and(|p| p.ty.is_composite()));
    }

    #[test]
    fn lookup_errors_are_diagnostics() {
        let err = LookupError::UnknownType("Foo/bar@1".into());
        assert_eq!(err.to_string(), "unknown resource type `Foo/bar@1`");
        let diag: &dyn Diagnostic = &err;
        assert_eq!(
            diag.code().map(|c| c.to_string()).as_deref(),
            Some("lang_ty::unknown_type")
        );
    }
}
