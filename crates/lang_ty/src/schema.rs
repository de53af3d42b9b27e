// ==============================================================================
// In-memory schema index
// ==============================================================================
//
// A `TypeProvider` backed by a JSON document that maps resource type ids to
// their body types:
//
//   {
//     "resourceTypes": {
//       "Microsoft.Storage/storageAccounts@2023-01-01": {
//         "type": "object",
//         "properties": { "name": { "type": "string", "required": true } }
//       },
//       "Microsoft.Web/sites@2022-09-01": null
//     }
//   }
//
// A `null` body lists the type id for completion without providing its
// shape; looking it up reports `LookupError::NotFound`.

use std::collections::BTreeMap;

use miette::Diagnostic;
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

use crate::{LookupError, TypeDescriptor, TypeProvider};

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("failed to parse schema JSON")]
    #[diagnostic(code(lang_ty::schema_json))]
    Json(#[from] serde_json::Error),

    #[error("resource type `{0}` is missing an `@version` suffix")]
    #[diagnostic(
        code(lang_ty::schema_missing_version),
        help("resource type ids look like `Namespace/type@2023-01-01`")
    )]
    MissingVersion(SmolStr),

    #[error("resource type `{0}` must have an object body")]
    #[diagnostic(code(lang_ty::schema_body_not_object))]
    BodyNotObject(SmolStr),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaFile {
    #[serde(default)]
    resource_types: BTreeMap<SmolStr, Option<TypeDescriptor>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaIndex {
    types: BTreeMap<SmolStr, Option<TypeDescriptor>>,
}

impl SchemaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(json)?;
        let mut index = Self::new();
        for (id, body) in file.resource_types {
            index.validate(&id, body.as_ref())?;
            index.insert(id, body);
        }
        log::debug!("loaded schema index with {} resource types", index.len());
        Ok(index)
    }

    fn validate(&self, id: &SmolStr, body: Option<&TypeDescriptor>) -> Result<(), SchemaError> {
        if !id.contains('@') {
            return Err(SchemaError::MissingVersion(id.clone()));
        }
        if body.is_some_and(|b| !b.is_object()) {
            return Err(SchemaError::BodyNotObject(id.clone()));
        }
        Ok(())
    }

    /// Register `id` with the given body type, or as listed-only with `None`.
    pub fn insert(&mut self, id: impl Into<SmolStr>, body: Option<TypeDescriptor>) {
        self.types.insert(id.into(), body);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Exact match first, then a case-insensitive one (type ids are not case
    /// sensitive).
    fn entry(&self, id: &str) -> Option<(&SmolStr, &Option<TypeDescriptor>)> {
        self.types.get_key_value(id).or_else(|| {
            self.types
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(id))
        })
    }
}

impl TypeProvider for SchemaIndex {
    fn lookup_type(&self, id: &str) -> Result<TypeDescriptor, LookupError> {
        match self.entry(id) {
            Some((_, Some(body))) => Ok(body.clone()),
            Some((key, None)) => Err(LookupError::NotFound(key.clone())),
            None => Err(LookupError::UnknownType(id.into())),
        }
    }

    fn available_types(&self, prefix: &str) -> Vec<SmolStr> {
        let prefix = prefix.to_ascii_lowercase();
        self.types
            .keys()
            .filter(|id| id.to_ascii_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const SCHEMA: &str = indoc! {r#"
        {
          "resourceTypes": {
            "Microsoft.Storage/storageAccounts@2023-01-01": {
              "type": "object",
              "name": "storageAccounts",
              "properties": {
                "name": { "type": "string", "required": true },
                "location": { "type": "string", "required": true, "description": "Geo location" },
                "kind": { "type": "enum", "values": ["StorageV2", "BlobStorage"] },
                "tags": { "type": "object" },
                "properties": {
                  "type": "object",
                  "properties": {
                    "accessTier": { "type": "enum", "values": ["Hot", "Cool"], "required": true },
                    "supportsHttpsTrafficOnly": { "type": "bool" }
                  }
                }
              }
            },
            "Microsoft.Web/sites@2022-09-01": null
          }
        }
    "#};

    #[test]
    fn parses_nested_properties() {
        let index = SchemaIndex::from_json(SCHEMA).unwrap();
        assert_eq!(index.len(), 2);

        let body = index
            .lookup_type("Microsoft.Storage/storageAccounts@2023-01-01")
            .unwrap();
        assert_eq!(body.to_string(), "storageAccounts");
        assert_eq!(body.required_properties(), vec!["location", "name"]);

        let location = body.property("location").unwrap();
        assert_eq!(location.description.as_deref(), Some("Geo location"));

        let nested = &body.property("properties").unwrap().ty;
        assert_eq!(nested.required_properties(), vec!["accessTier"]);
        assert_eq!(
            nested.property("supportsHttpsTrafficOnly").map(|p| &p.ty),
            Some(&TypeDescriptor::Bool)
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let index = SchemaIndex::from_json(SCHEMA).unwrap();
        assert!(index
            .lookup_type("microsoft.storage/storageaccounts@2023-01-01")
            .is_ok());
    }

    #[test]
    fn lookup_errors() {
        let index = SchemaIndex::from_json(SCHEMA).unwrap();
        assert_eq!(
            index.lookup_type("Microsoft.Web/sites@2022-09-01"),
            Err(LookupError::NotFound("Microsoft.Web/sites@2022-09-01".into()))
        );
        assert_eq!(
            index.lookup_type("Foo/bar@1"),
            Err(LookupError::UnknownType("Foo/bar@1".into()))
        );
    }

    #[test]
    fn available_types_by_prefix() {
        let index = SchemaIndex::from_json(SCHEMA).unwrap();
        assert_eq!(index.available_types("").len(), 2);
        assert_eq!(
            index.available_types("microsoft.st"),
            vec![SmolStr::new("Microsoft.Storage/storageAccounts@2023-01-01")]
        );
        assert!(index.available_types("Contoso").is_empty());
    }

    #[test]
    fn rejects_invalid_schemas() {
        let err = SchemaIndex::from_json(r#"{"resourceTypes": {"Foo/bar": null}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::MissingVersion(id) if id == "Foo/bar"));

        let err = SchemaIndex::from_json(r#"{"resourceTypes": {"Foo/bar@1": {"type": "string"}}}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::BodyNotObject(_)));

        assert!(matches!(
            SchemaIndex::from_json("{").unwrap_err(),
            SchemaError::Json(_)
        ));
    }

    #[test]
    fn empty_document_is_an_empty_index() {
        assert!(SchemaIndex::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn round_trips_through_serde() {
        let body = TypeDescriptor::object([(
            "sku",
            crate::PropertyDescriptor::new(TypeDescriptor::Enum {
                values: vec!["Standard_LRS".into()],
            })
            .required(),
        )]);
        let json = serde_json::to_string(&body).unwrap();
        let back: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, body);
    }
}
