//! Function, type and identifier naming for generated code.

use crate::descriptor::Condition;
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// `GetByVar3AndVar1`
pub fn get_name(by: &[Condition]) -> String {
    format!("GetBy{}", camel_join(by.iter().map(|c| c.column.as_str())))
}

/// `GetUsers`, `GetUsersByAge`
pub fn get_many_name(model: &str, by: &[Condition]) -> String {
    let mut name = format!("Get{}", pluralize(&model.to_upper_camel_case()));
    push_by(&mut name, by);
    name
}

/// `UpdateNameAndAgeById`
pub fn update_name(fields: &[String], by: &[Condition]) -> String {
    let mut name = format!("Update{}", camel_join(fields.iter().map(String::as_str)));
    push_by(&mut name, by);
    name
}

pub fn insert_name() -> String {
    "Insert".to_string()
}

/// `GetJoinedUser`
pub fn join_name(model: &str) -> String {
    format!("GetJoined{}", model.to_upper_camel_case())
}

/// `GetCnt`, `GetCntAndTotalByAge`
pub fn aggregate_name<'a>(aliases: impl IntoIterator<Item = &'a str>, by: &[Condition]) -> String {
    let mut name = format!("Get{}", camel_join(aliases));
    push_by(&mut name, by);
    name
}

fn push_by(name: &mut String, by: &[Condition]) {
    if !by.is_empty() {
        name.push_str("By");
        name.push_str(&camel_join(by.iter().map(|c| c.column.as_str())));
    }
}

fn camel_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|p| p.to_upper_camel_case())
        .collect::<Vec<_>>()
        .join("And")
}

/// Table name used when a manifest omits one.
pub fn default_table(model: &str) -> String {
    model.to_snake_case()
}

pub fn pluralize(base: &str) -> String {
    let before_last = base.chars().rev().nth(1);
    if base.ends_with('y') && !matches!(before_last, None | Some('a' | 'e' | 'i' | 'o' | 'u')) {
        format!("{}ies", &base[..base.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| base.ends_with(s)) {
        format!("{base}es")
    } else {
        format!("{base}s")
    }
}

/// snake_case word, for use inside a longer identifier.
pub fn snake(name: &str) -> String {
    ascii_word(name.trim_start_matches("r#")).to_snake_case()
}

/// snake_case function or parameter identifier, raw-escaped when it is a keyword.
pub fn fn_ident(name: &str) -> String {
    let mut s = snake(name);
    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    match s.as_str() {
        // Not valid as raw identifiers.
        "self" | "crate" | "super" => format!("{s}_"),
        _ if is_rust_keyword(&s) => format!("r#{s}"),
        _ => s,
    }
}

/// Field access is by declared field name, which is already an identifier.
pub fn field_ident(name: &str) -> String {
    match name {
        // Not valid as raw identifiers.
        "self" | "Self" | "crate" | "super" | "_" => format!("{name}_"),
        _ if is_rust_keyword(name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

/// UpperCamelCase type identifier.
pub fn type_ident(name: &str) -> String {
    let mut s = ascii_word(name).to_upper_camel_case();
    if s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    s
}

/// `SCREAMING_SNAKE` constant name for a column.
pub fn const_ident(column: &str) -> String {
    let mut s = ascii_word(column).to_shouty_snake_case();
    if s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    s
}

fn ascii_word(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "gen"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_names_keep_caller_order() {
        let by = [Condition::eq("var3"), Condition::eq("var1")];
        assert_eq!(get_name(&by), "GetByVar3AndVar1");
        assert_eq!(fn_ident(&get_name(&by)), "get_by_var3_and_var1");
    }

    #[test]
    fn other_operation_names() {
        let by = [Condition::eq("user_id")];
        assert_eq!(get_many_name("category", &[]), "GetCategories");
        assert_eq!(get_many_name("Box", &by), "GetBoxesByUserId");
        assert_eq!(
            update_name(&["name".to_string(), "age".to_string()], &[Condition::eq("id")]),
            "UpdateNameAndAgeById"
        );
        assert_eq!(join_name("JoinExample"), "GetJoinedJoinExample");
        assert_eq!(aggregate_name(["cnt", "max_age"], &by), "GetCntAndMaxAgeByUserId");
    }

    #[test]
    fn pluralize_rules() {
        assert_eq!(pluralize("User"), "Users");
        assert_eq!(pluralize("Key"), "Keys");
        assert_eq!(pluralize("Entry"), "Entries");
        assert_eq!(pluralize("Match"), "Matches");
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(fn_ident("Type"), "r#type");
        assert_eq!(fn_ident("9lives"), "_9lives");
        assert_eq!(field_ident("match"), "r#match");
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("self"), "self_");
        assert_eq!(const_ident("created-at"), "CREATED_AT");
        assert_eq!(type_ident("join_example"), "JoinExample");
        assert_eq!(default_table("JoinExample"), "join_example");
    }
}
