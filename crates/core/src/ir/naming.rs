//! Deterministic identifier derivation.
//!
//! Everything here is a pure function of its input (plus a per-parse
//! counter for inline names), so parsing the same document twice yields
//! the same names.

use std::collections::HashSet;

use serde_json::Value;

use super::api::HttpMethod;

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Join the alphanumeric runs of `s` into PascalCase.
///
/// Inner casing is kept, so `petId` becomes `PetId` and `pet-id` becomes `PetId`.
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize_first)
        .collect()
}

/// Convert to SCREAMING_SNAKE_CASE, splitting on separators and camelCase humps.
pub fn to_screaming_snake_case(s: &str) -> String {
    let mut out = String::new();
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if let Some(p) = prev
                && c.is_uppercase()
                && (p.is_lowercase() || p.is_ascii_digit())
                && !out.ends_with('_')
            {
                out.push('_');
            }
            out.extend(c.to_uppercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Derive an enum member name from its value.
///
/// `index` is only used for values with no natural spelling (objects, arrays).
pub fn enum_member_name(value: &Value, index: usize) -> String {
    match value {
        Value::String(s) => {
            let name = to_screaming_snake_case(s);
            if name.is_empty() {
                "EMPTY".to_string()
            } else if name.starts_with(|c: char| c.is_ascii_digit()) {
                format!("VALUE_{name}")
            } else {
                name
            }
        }
        Value::Number(n) => {
            let text = n.to_string();
            let text = text.strip_prefix('-').map_or_else(
                || text.clone(),
                |abs| format!("MINUS_{abs}"),
            );
            format!("VALUE_{}", to_screaming_snake_case(&text))
        }
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => "NULL".to_string(),
        Value::Array(_) | Value::Object(_) => format!("VALUE_{index}"),
    }
}

/// Derive member names for every value, suffixing `_2`, `_3`, ... on collisions.
pub fn enum_member_names(values: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let base = enum_member_name(value, i);
            let mut name = base.clone();
            let mut suffix = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Hands out names for anonymous types: `<Context>_<n>`.
///
/// The counter belongs to one converter instance, so names are unique
/// within a parse without any global coordination.
#[derive(Debug, Default)]
#[allow(missing_copy_implementations)]
pub struct InlineNamer {
    counter: usize,
}

impl InlineNamer {
    /// A namer starting from 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name for an anonymous type found under `context`.
    pub fn next_name(&mut self, context: &str) -> String {
        self.counter += 1;
        let base = to_pascal_case(context);
        let base = if base.is_empty() { "Inline".to_string() } else { base };
        format!("{base}_{}", self.counter)
    }
}

/// Synthesize an operation identifier from verb and path template.
///
/// `GET /pets/{petId}/toys` becomes `getPetsByPetIdToys`; `GET /` becomes `getRoot`.
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.key().to_string();
    let mut any_segment = false;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        any_segment = true;
        if let Some(param) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            id.push_str("By");
            id.push_str(&to_pascal_case(param));
        } else {
            id.push_str(&to_pascal_case(segment));
        }
    }
    if !any_segment {
        id.push_str("Root");
    }
    id
}

/// Extract the last segment of a pointer fragment as a type name.
///
/// `#/components/schemas/Pet` → `Pet`; `pet.yaml` → `pet`.
pub fn pointer_type_name(pointer: &str) -> String {
    let (file, fragment) = pointer.split_once('#').unwrap_or((pointer, ""));
    let last = fragment
        .rsplit('/')
        .find(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"));
    match last {
        Some(segment) => segment,
        None => file
            .rsplit(['/', '\\'])
            .next()
            .and_then(|f| f.split('.').next())
            .unwrap_or(file)
            .to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("foo"), "Foo");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("petId"), "PetId");
        assert_eq!(to_pascal_case("pet-id"), "PetId");
        assert_eq!(to_pascal_case("pet_store.v2"), "PetStoreV2");
        assert_eq!(to_pascal_case("--"), "");
    }

    #[test]
    fn test_to_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("inProgress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("in-progress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("in progress!"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("v2Beta"), "V2_BETA");
        assert_eq!(
            to_screaming_snake_case("urn:ietf:params:scim"),
            "URN_IETF_PARAMS_SCIM"
        );
    }

    #[test]
    fn test_enum_member_name() {
        assert_eq!(enum_member_name(&json!("active"), 0), "ACTIVE");
        assert_eq!(enum_member_name(&json!("1st"), 0), "VALUE_1ST");
        assert_eq!(enum_member_name(&json!(""), 0), "EMPTY");
        assert_eq!(enum_member_name(&json!(42), 0), "VALUE_42");
        assert_eq!(enum_member_name(&json!(-3), 0), "VALUE_MINUS_3");
        assert_eq!(enum_member_name(&json!(1.5), 0), "VALUE_1_5");
        assert_eq!(enum_member_name(&json!(true), 0), "TRUE");
        assert_eq!(enum_member_name(&Value::Null, 0), "NULL");
        assert_eq!(enum_member_name(&json!({"a": 1}), 7), "VALUE_7");
    }

    #[test]
    fn test_enum_member_names_disambiguate() {
        let names = enum_member_names(&[
            json!("in-progress"),
            json!("in_progress"),
            json!("inProgress"),
            json!("done"),
        ]);
        assert_eq!(
            names,
            vec!["IN_PROGRESS", "IN_PROGRESS_2", "IN_PROGRESS_3", "DONE"]
        );
    }

    #[test]
    fn test_inline_namer_counts_per_instance() {
        let mut namer = InlineNamer::new();
        assert_eq!(namer.next_name("Pet address"), "PetAddress_1");
        assert_eq!(namer.next_name("Pet"), "Pet_2");
        assert_eq!(namer.next_name(""), "Inline_3");

        let mut other = InlineNamer::new();
        assert_eq!(other.next_name("Pet"), "Pet_1");
    }

    #[test]
    fn test_synthesize_operation_id() {
        assert_eq!(
            synthesize_operation_id(HttpMethod::Get, "/pets/{petId}/toys"),
            "getPetsByPetIdToys"
        );
        assert_eq!(
            synthesize_operation_id(HttpMethod::Delete, "/store/order-items"),
            "deleteStoreOrderItems"
        );
        assert_eq!(synthesize_operation_id(HttpMethod::Get, "/"), "getRoot");
    }

    #[test]
    fn test_pointer_type_name() {
        assert_eq!(pointer_type_name("#/components/schemas/Pet"), "Pet");
        assert_eq!(pointer_type_name("models.yaml#/Owner"), "Owner");
        assert_eq!(pointer_type_name("#/definitions/a~1b"), "a/b");
        assert_eq!(pointer_type_name("shared/pet.yaml"), "pet");
    }

    proptest! {
        #[test]
        fn prop_enum_member_names_are_unique(values in proptest::collection::vec("[a-zA-Z0-9 _-]{0,8}", 0..24)) {
            let values: Vec<Value> = values.into_iter().map(Value::String).collect();
            let names = enum_member_names(&values);
            let unique: HashSet<_> = names.iter().collect();
            prop_assert_eq!(unique.len(), names.len());
        }

        #[test]
        fn prop_enum_member_names_are_deterministic(values in proptest::collection::vec("[a-z-]{0,6}", 0..16)) {
            let values: Vec<Value> = values.into_iter().map(Value::String).collect();
            prop_assert_eq!(enum_member_names(&values), enum_member_names(&values));
        }
    }
}
