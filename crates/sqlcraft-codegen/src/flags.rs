//! Textual operation flags.
//!
//! ```text
//! get:    [ (var1,var2), var3 ]            one read per item, tuples AND their columns
//! update: [ [(id),(name,age)], [(),(x)] ]  [(conditions),(fields)] per update
//! ```
//!
//! Whitespace is insignificant. Anything else (unbalanced brackets, empty
//! groups where columns are required, stray characters) is a
//! [`ValidationError::MalformedFlag`].

use crate::descriptor::{Condition, GetOp, Operation, UpdateOp};
use sqlcraft::ValidationError;

/// Parse a get flag into one [`Operation::Get`] per item.
pub fn parse_get_flag(flag: &str) -> Result<Vec<Operation>, ValidationError> {
    let mut cursor = Cursor::new("get", flag);
    let items = cursor.list(|c| {
        if c.peek() == Some('(') {
            c.group(false)
        } else {
            Ok(vec![c.ident()?])
        }
    })?;
    cursor.finish()?;

    Ok(items
        .into_iter()
        .map(|columns| Operation::Get(GetOp::by(columns.into_iter().map(Condition::eq))))
        .collect())
}

/// Parse an update flag into one [`Operation::Update`] per entry.
pub fn parse_update_flag(flag: &str) -> Result<Vec<Operation>, ValidationError> {
    let mut cursor = Cursor::new("update", flag);
    let entries = cursor.list(|c| {
        c.expect('[')?;
        let by = c.group(true)?;
        c.expect(',')?;
        let fields = c.group(false)?;
        c.expect(']')?;
        Ok((by, fields))
    })?;
    cursor.finish()?;

    Ok(entries
        .into_iter()
        .map(|(by, fields)| {
            Operation::Update(UpdateOp {
                by: by.into_iter().map(Condition::eq).collect(),
                fields,
                function_name: None,
            })
        })
        .collect())
}

struct Cursor {
    flag: &'static str,
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(flag: &'static str, text: &str) -> Self {
        Self {
            flag,
            chars: text.chars().filter(|c| !c.is_whitespace()).collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ValidationError {
        ValidationError::malformed(self.flag, message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ValidationError> {
        match self.peek() {
            Some(got) if got == c => {
                self.pos += 1;
                Ok(())
            }
            Some(got) => Err(self.error(format!(
                "expected '{c}' at position {}, found '{got}'",
                self.pos
            ))),
            None => Err(self.error(format!("expected '{c}', found end of input"))),
        }
    }

    fn ident(&mut self) -> Result<String, ValidationError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let ok = if self.pos == start {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(format!(
                    "expected a column name at position {start}, found '{c}'"
                )),
                None => self.error("expected a column name, found end of input"),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// `(a,b,...)`
    fn group(&mut self, allow_empty: bool) -> Result<Vec<String>, ValidationError> {
        self.expect('(')?;
        if self.eat(')') {
            if allow_empty {
                return Ok(Vec::new());
            }
            return Err(self.error("empty column group"));
        }

        let mut columns = Vec::new();
        loop {
            columns.push(self.ident()?);
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return Ok(columns);
        }
    }

    /// `[item,item,...]`, possibly empty.
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, ValidationError>,
    ) -> Result<Vec<T>, ValidationError> {
        self.expect('[')?;
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(items);
        }
    }

    fn finish(&self) -> Result<(), ValidationError> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!(
                "unexpected '{c}' at position {} after closing bracket",
                self.pos
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_columns(ops: &[Operation]) -> Vec<Vec<&str>> {
        ops.iter()
            .map(|op| match op {
                Operation::Get(get) => get.by.iter().map(|c| c.column.as_str()).collect(),
                other => panic!("expected a get operation, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn get_flag_tuples_and_singles() {
        let ops = parse_get_flag("[ (var1,var2), (var2, var4), var3 ]").unwrap();
        assert_eq!(
            get_columns(&ops),
            vec![vec!["var1", "var2"], vec!["var2", "var4"], vec!["var3"]]
        );
    }

    #[test]
    fn get_flag_empty_list() {
        assert!(parse_get_flag("[]").unwrap().is_empty());
    }

    #[test]
    fn get_flag_rejects_unbalanced_input() {
        for bad in [
            "(var1)",
            "[(var1,var2]",
            "[(var1,(var2))]",
            "[var1,]",
            "[()]",
            "[var1] extra",
            "[var1",
            "",
        ] {
            let err = parse_get_flag(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::MalformedFlag { flag: "get", .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn update_flag_conditions_then_fields() {
        let ops = parse_update_flag("[[(id),(name,age)], [(), (score)]]").unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            Operation::Update(op) => {
                assert_eq!(op.by, vec![Condition::eq("id")]);
                assert_eq!(op.fields, vec!["name", "age"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &ops[1] {
            Operation::Update(op) => {
                assert!(op.by.is_empty());
                assert_eq!(op.fields, vec!["score"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_flag_rejects_missing_fields() {
        for bad in ["[[(id)]]", "[[(id),()]]", "[(id),(name)]", "[[(id),(name)]"] {
            assert!(
                matches!(
                    parse_update_flag(bad).unwrap_err(),
                    ValidationError::MalformedFlag { flag: "update", .. }
                ),
                "{bad:?}"
            );
        }
    }
}
