//! MySQL renderer; the baseline most other dialects deviate from.

use super::{QueryVisitor, VisitState};
use crate::ast::{Expr, FunctionName, JsonPathExpression, Lock};
use crate::error::Result;

/// Renders statements for MySQL.
#[derive(Debug)]
pub struct MySqlVisitor<'a> {
    state: VisitState<'a>,
}

impl<'a> MySqlVisitor<'a> {
    /// Creates a visitor over `state`.
    #[must_use]
    pub const fn new(state: VisitState<'a>) -> Self {
        Self { state }
    }
}

impl<'a> QueryVisitor<'a> for MySqlVisitor<'a> {
    fn state(&mut self) -> &mut VisitState<'a> {
        &mut self.state
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn function_template(&self, name: FunctionName) -> Option<&'static str> {
        match name {
            FunctionName::Date => Some("DATE({0})"),
            FunctionName::Time => Some("TIME({0})"),
            FunctionName::Day => Some("DAY({0})"),
            FunctionName::Month => Some("MONTH({0})"),
            FunctionName::Year => Some("YEAR({0})"),
            FunctionName::Random => Some("RAND()"),
            FunctionName::JsonContains | FunctionName::JsonLength | FunctionName::JsonContainsKey => {
                None
            }
        }
    }

    fn compile_json_function(
        &mut self,
        name: FunctionName,
        column: &Expr,
        value: Option<String>,
    ) -> Result<String> {
        let (field, path) = self.json_field_and_path(column)?;
        Ok(match name {
            FunctionName::JsonContains => {
                format!("json_contains({field}, {}{path})", value.unwrap_or_default())
            }
            FunctionName::JsonContainsKey => {
                format!("ifnull(json_contains_path({field}, 'one'{path}), 0)")
            }
            _ => format!("json_length({field}{path})"),
        })
    }

    fn visit_json_path(&mut self, json: &JsonPathExpression) -> Result<String> {
        let field = self.quote_path(&json.column);
        let extract = format!("json_extract({field}, '{}')", json.json_path());
        Ok(if json.unquotes() {
            format!("json_unquote({extract})")
        } else {
            extract
        })
    }

    fn lock_suffix(&self, lock: &Lock) -> Option<String> {
        Some(match lock {
            Lock::Update => String::from("FOR UPDATE"),
            Lock::Shared => String::from("LOCK IN SHARE MODE"),
            Lock::Raw(sql) => sql.clone(),
        })
    }

    fn empty_insert(&self) -> &'static str {
        "() VALUES ()"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JsonArrow, JsonLeg, PathExpression};
    use crate::grammar::{CompileContext, Grammar, MySqlGrammar};

    #[test]
    fn test_quote_escapes_backticks() {
        let grammar = MySqlGrammar::new();
        assert_eq!(grammar.quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_json_path_unquotes_text_leg() {
        let grammar = MySqlGrammar::new();
        let mut ctx = CompileContext::new();
        let mut visitor = grammar.visitor(&mut ctx);
        let json = JsonPathExpression {
            column: PathExpression::new(["options"]),
            legs: vec![JsonLeg {
                arrow: JsonArrow::ExtractText,
                key: String::from("language"),
            }],
        };
        assert_eq!(
            visitor.visit_json_path(&json).unwrap(),
            "json_unquote(json_extract(`options`, '$.\"language\"'))"
        );
    }
}
