// ==============================================================================
// Builtin Metadata
// ==============================================================================
//
// Static tables of keywords, functions, decorators and primitive type names.

/// Where a keyword may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordScope {
    /// Start of a top-level line.
    TopLevel,
    /// After the type string of a resource declaration.
    AfterResourceType,
    /// Directly after the `[` of an array.
    ArrayStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub name: &'static str,
    pub detail: &'static str,
}

const TOP_LEVEL_KEYWORDS: &[Keyword] = &[
    Keyword {
        name: "module",
        detail: "Module declaration",
    },
    Keyword {
        name: "output",
        detail: "Output declaration",
    },
    Keyword {
        name: "param",
        detail: "Parameter declaration",
    },
    Keyword {
        name: "resource",
        detail: "Resource declaration",
    },
    Keyword {
        name: "targetScope",
        detail: "Target scope declaration",
    },
    Keyword {
        name: "var",
        detail: "Variable declaration",
    },
];

const RESOURCE_HEADER_KEYWORDS: &[Keyword] = &[Keyword {
    name: "existing",
    detail: "Reference an existing resource",
}];

const ARRAY_KEYWORDS: &[Keyword] = &[Keyword {
    name: "for",
    detail: "For loop",
}];

pub fn keywords_valid_at(scope: KeywordScope) -> &'static [Keyword] {
    match scope {
        KeywordScope::TopLevel => TOP_LEVEL_KEYWORDS,
        KeywordScope::AfterResourceType => RESOURCE_HEADER_KEYWORDS,
        KeywordScope::ArrayStart => ARRAY_KEYWORDS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    /// Parameter list, e.g. `(value: string)`.
    pub signature: &'static str,
    pub description: &'static str,
}

impl BuiltinFunction {
    pub fn takes_arguments(&self) -> bool {
        self.signature != "()"
    }
}

macro_rules! functions {
    ($($name:literal $sig:literal => $doc:literal,)*) => {
        &[$(BuiltinFunction { name: $name, signature: $sig, description: $doc },)*]
    };
}

const BUILTIN_FUNCTIONS: &[BuiltinFunction] = functions! {
    "any" "(value: any)" => "Converts the value to a type that is compatible with any other type.",
    "array" "(value: any)" => "Converts the value to an array.",
    "base64" "(value: string)" => "Returns the base64 representation of the input string.",
    "bool" "(value: any)" => "Converts the parameter to a boolean.",
    "coalesce" "(values: any...)" => "Returns the first non-null value from the parameters.",
    "concat" "(values: any...)" => "Combines multiple arrays or strings.",
    "contains" "(container: any, item: any)" => "Checks whether an array contains a value, an object contains a key, or a string contains a substring.",
    "deployment" "()" => "Returns information about the current deployment operation.",
    "empty" "(value: any)" => "Determines if an array, object, or string is empty.",
    "endsWith" "(text: string, suffix: string)" => "Determines whether a string ends with a value.",
    "environment" "()" => "Returns information about the cloud environment used for deployment.",
    "first" "(value: any)" => "Returns the first element of an array, or first character of a string.",
    "format" "(format: string, args: any...)" => "Creates a formatted string from input values.",
    "guid" "(seeds: string...)" => "Creates a value in the format of a globally unique identifier based on the values provided.",
    "indexOf" "(text: string, value: string)" => "Returns the first position of a value within a string.",
    "int" "(value: any)" => "Converts the specified value to an integer.",
    "intersection" "(values: any...)" => "Returns a single array or object with the common elements from the parameters.",
    "json" "(text: string)" => "Converts a valid JSON string into a JSON data type.",
    "last" "(value: any)" => "Returns the last element of an array, or last character of a string.",
    "length" "(value: any)" => "Returns the number of elements in an array, characters in a string, or root-level properties in an object.",
    "listKeys" "(resourceId: string, apiVersion: string)" => "Returns the keys of a resource that supports the list operation.",
    "managementGroup" "()" => "Returns the current management group scope.",
    "max" "(values: int...)" => "Returns the maximum value from an array of integers or a comma-separated list of integers.",
    "min" "(values: int...)" => "Returns the minimum value from an array of integers or a comma-separated list of integers.",
    "newGuid" "()" => "Returns a value in the format of a globally unique identifier.",
    "range" "(startIndex: int, count: int)" => "Creates an array of integers from a starting integer and containing a number of items.",
    "reference" "(resourceNameOrIdentifier: string, apiVersion: string)" => "Returns an object representing a resource's runtime state.",
    "replace" "(text: string, oldValue: string, newValue: string)" => "Returns a new string with all instances of one string replaced by another.",
    "resourceGroup" "()" => "Returns the current resource group scope.",
    "resourceId" "(segments: string...)" => "Returns the unique identifier of a resource.",
    "skip" "(value: any, count: int)" => "Returns all the elements after the specified number in an array, or the remaining characters in a string.",
    "split" "(text: string, delimiter: string)" => "Returns an array of strings that contains the substrings of the input string.",
    "startsWith" "(text: string, prefix: string)" => "Determines whether a string starts with a value.",
    "string" "(value: any)" => "Converts the specified value to a string.",
    "subscription" "()" => "Returns the current subscription scope.",
    "substring" "(text: string, startIndex: int, length: int)" => "Returns a substring that starts at the specified character position.",
    "take" "(value: any, count: int)" => "Returns the specified number of elements from the start of an array, or characters from the start of a string.",
    "tenant" "()" => "Returns the current tenant scope.",
    "toLower" "(text: string)" => "Converts the specified string to lower case.",
    "toUpper" "(text: string)" => "Converts the specified string to upper case.",
    "trim" "(text: string)" => "Removes all leading and trailing white-space characters from the specified string.",
    "union" "(values: any...)" => "Returns a single array or object with all elements from the parameters.",
    "uniqueString" "(seeds: string...)" => "Creates a deterministic hash string based on the values provided.",
    "uri" "(baseUri: string, relativeUri: string)" => "Creates an absolute URI by combining the baseUri and the relativeUri string.",
    "utcNow" "(format: string)" => "Returns the current (UTC) datetime value in the specified format.",
};

pub fn builtin_functions() -> &'static [BuiltinFunction] {
    BUILTIN_FUNCTIONS
}

pub fn lookup_function(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTIN_FUNCTIONS.iter().find(|f| f.name == name)
}

/// Decorators share the function shape: a name, a parameter list and docs.
pub type Decorator = BuiltinFunction;

const DECORATORS: &[Decorator] = functions! {
    "allowed" "(values: array)" => "Defines the allowed values of the parameter.",
    "batchSize" "(batchSize: int)" => "Causes the resource or module for-expression to run in sequential batches of specified size.",
    "description" "(text: string)" => "Describes the parameter, output or resource.",
    "maxLength" "(length: int)" => "Defines the maximum length of the parameter.",
    "maxValue" "(value: int)" => "Defines the maximum value of the parameter.",
    "metadata" "(value: object)" => "Defines metadata of the parameter.",
    "minLength" "(length: int)" => "Defines the minimum length of the parameter.",
    "minValue" "(value: int)" => "Defines the minimum value of the parameter.",
    "secure" "()" => "Makes the parameter a secure parameter.",
};

pub fn decorators() -> &'static [Decorator] {
    DECORATORS
}

const PRIMITIVE_TYPES: &[&str] = &["array", "bool", "int", "object", "string"];

pub fn primitive_types() -> &'static [&'static str] {
    PRIMITIVE_TYPES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(|k| k.name).collect()
    }

    #[test]
    fn keyword_scopes() {
        assert_eq!(
            names(keywords_valid_at(KeywordScope::TopLevel)),
            vec!["module", "output", "param", "resource", "targetScope", "var"]
        );
        assert_eq!(names(keywords_valid_at(KeywordScope::AfterResourceType)), vec!["existing"]);
        assert_eq!(names(keywords_valid_at(KeywordScope::ArrayStart)), vec!["for"]);
    }

    #[test]
    fn tables_are_sorted_and_unique() {
        for table in [builtin_functions(), decorators()] {
            let names: Vec<_> = table.iter().map(|f| f.name).collect();
            let mut sorted = names.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(names, sorted);
        }
    }

    #[test]
    fn function_lookup() {
        let concat = lookup_function("concat").unwrap();
        assert!(concat.takes_arguments());
        assert!(!lookup_function("newGuid").unwrap().takes_arguments());
        assert!(lookup_function("nope").is_none());
    }
}
