//! Identifier Normalization
//!
//! Pure string transforms shared by every pass:
//! - schema name -> registry lookup key
//! - schema name -> emitted type identifier and file stem
//! - free text -> doc comment block
//! - tag text -> operation group key
//!
//! Nothing in here looks at the registry, so every function is safe to call
//! before, during or after model construction.

/// Registry lookup key for a schema name or identifier.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
}

/// Converts a schema name into a valid type identifier.
///
/// Non-word characters act as separators and are dropped; the character
/// following a separator and the first character are upper-cased. A leading
/// digit gets an underscore prefix. Applying it to its own output is a no-op.
pub fn to_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 1);
    let mut up_next = false;

    for c in name.chars() {
        if !is_word_char(c) {
            up_next = true;
        } else if up_next || result.is_empty() {
            result.push(c.to_ascii_uppercase());
            up_next = false;
        } else {
            result.push(c);
        }
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// File stem for an identifier: only the first character is lower-cased.
pub fn to_file_stem(identifier: &str) -> String {
    let mut chars = identifier.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Wraps free text into a `/** ... */` block indented by `level` steps of
/// two spaces. Empty text yields only the indentation.
pub fn to_doc_block(text: Option<&str>, level: usize) -> String {
    let indent = "  ".repeat(level);
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return indent,
    };

    let mut result = format!("\n{indent}/**\n");
    for line in text.trim().split('\n') {
        if line.is_empty() {
            result.push_str(&format!("{indent} *\n"));
        } else {
            result.push_str(&format!("{indent} * {line}\n"));
        }
    }
    result.push_str(&format!("{indent} */\n{indent}"));
    result
}

/// Simple type identifier from a qualified `$ref` such as `#/definitions/Pet`.
pub fn simple_ref(reference: &str) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    let name = reference.rsplit('/').next().unwrap_or(reference);
    Some(to_identifier(name))
}

/// Normalized operation group key for a tag.
///
/// Missing or empty tags map to `default_tag`. The result keeps only ASCII
/// alphanumerics, upper-casing after each dropped separator, and always
/// starts upper-case.
pub fn tag_name(tag: Option<&str>, default_tag: &str) -> String {
    let tag = match tag {
        Some(t) if !t.is_empty() => t,
        _ => default_tag,
    };

    let mut result = String::with_capacity(tag.len());
    let mut was_sep = false;
    for c in tag.chars() {
        if c.is_ascii_alphanumeric() {
            if was_sep {
                result.push(c.to_ascii_uppercase());
                was_sep = false;
            } else {
                result.push(c);
            }
        } else {
            was_sep = true;
        }
    }

    let mut chars = result.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Member name for an enum value: upper snake case, word boundaries taken from
/// separators and lower-to-upper transitions.
pub fn to_enum_name(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 4);
    let mut prev_lower = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_uppercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        }
    }

    let trimmed = result.trim_end_matches('_');
    if trimmed.is_empty() {
        return "EMPTY".to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Property name as emitted: bare when it is a valid identifier, quoted otherwise.
pub fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };

    if valid {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_identifier() {
        assert_eq!(to_identifier("pet"), "Pet");
        assert_eq!(to_identifier("the-user"), "TheUser");
        assert_eq!(to_identifier("order.item_line"), "OrderItem_line");
        assert_eq!(to_identifier("2fa config"), "_2faConfig");
        assert_eq!(to_identifier("Already"), "Already");
    }

    #[test]
    fn test_to_identifier_idempotent() {
        for name in ["pet", "the-user", "2fa config", "a.b.c", "_x", "--lead", "Ünïcode-name", ""] {
            let once = to_identifier(name);
            assert_eq!(to_identifier(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_normalize_key_matches_identifier_key() {
        assert_eq!(normalize_key("Pet"), normalize_key(&to_identifier("pet")));
    }

    #[test]
    fn test_to_file_stem() {
        assert_eq!(to_file_stem("TheUser"), "theUser");
        assert_eq!(to_file_stem("_2fa"), "_2fa");
        assert_eq!(to_file_stem(""), "");
    }

    #[test]
    fn test_to_doc_block() {
        assert_eq!(to_doc_block(None, 1), "  ");
        assert_eq!(to_doc_block(Some(""), 0), "");
        assert_eq!(
            to_doc_block(Some("First\n\nSecond"), 1),
            "\n  /**\n   * First\n   *\n   * Second\n   */\n  "
        );
    }

    #[test]
    fn test_simple_ref() {
        assert_eq!(simple_ref("#/definitions/pet-tag").as_deref(), Some("PetTag"));
        assert_eq!(simple_ref("Order").as_deref(), Some("Order"));
        assert_eq!(simple_ref(""), None);
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name(Some("pets"), "Api"), "Pets");
        assert_eq!(tag_name(Some("store orders"), "Api"), "StoreOrders");
        assert_eq!(tag_name(Some("user_admin"), "Api"), "UserAdmin");
        assert_eq!(tag_name(None, "Api"), "Api");
        assert_eq!(tag_name(Some(""), "default"), "Default");
    }

    #[test]
    fn test_to_enum_name() {
        assert_eq!(to_enum_name("available"), "AVAILABLE");
        assert_eq!(to_enum_name("inProgress"), "IN_PROGRESS");
        assert_eq!(to_enum_name("on-hold"), "ON_HOLD");
        assert_eq!(to_enum_name("1st"), "_1ST");
        assert_eq!(to_enum_name("--"), "EMPTY");
    }

    #[test]
    fn test_property_name_quoting() {
        assert_eq!(property_name("count"), "count");
        assert_eq!(property_name("x-custom"), "\"x-custom\"");
        assert_eq!(property_name("a.b"), "\"a.b\"");
        assert_eq!(property_name("9lives"), "\"9lives\"");
    }
}
