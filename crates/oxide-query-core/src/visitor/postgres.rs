//! PostgreSQL renderer.

use super::{json_key_literal, split_last_leg, QueryVisitor, VisitState};
use crate::ast::{Distinct, Expr, FunctionName, JsonArrow, JsonPathExpression, Lock, TruncateSpecification};
use crate::error::{QueryError, Result};

/// Renders statements for PostgreSQL, with `$N` placeholders.
#[derive(Debug)]
pub struct PostgresVisitor<'a> {
    state: VisitState<'a>,
}

impl<'a> PostgresVisitor<'a> {
    /// Creates a visitor over `state`.
    #[must_use]
    pub const fn new(state: VisitState<'a>) -> Self {
        Self { state }
    }

    /// `"col"->'a'->'b'`, every leg extracting JSON.
    fn json_selector(&mut self, column: &Expr) -> Result<String> {
        match column {
            Expr::JsonPath(json) => {
                let mut sql = self.quote_path(&json.column);
                for leg in &json.legs {
                    sql.push_str("->");
                    sql.push_str(&json_key_literal(&leg.key));
                }
                Ok(sql)
            }
            other => self.visit_expr(other),
        }
    }
}

impl<'a> QueryVisitor<'a> for PostgresVisitor<'a> {
    fn state(&mut self) -> &mut VisitState<'a> {
        &mut self.state
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&mut self) -> String {
        format!("${}", self.state.ctx.next_placeholder())
    }

    fn function_template(&self, name: FunctionName) -> Option<&'static str> {
        match name {
            FunctionName::Date => Some("{0}::date"),
            FunctionName::Time => Some("{0}::time"),
            FunctionName::Day => Some("EXTRACT(DAY FROM {0})"),
            FunctionName::Month => Some("EXTRACT(MONTH FROM {0})"),
            FunctionName::Year => Some("EXTRACT(YEAR FROM {0})"),
            FunctionName::Random => Some("RANDOM()"),
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
        match name {
            FunctionName::JsonContains => {
                let selector = self.json_selector(column)?;
                Ok(format!("({selector})::jsonb @> {}", value.unwrap_or_default()))
            }
            FunctionName::JsonContainsKey => {
                let Expr::JsonPath(json) = column else {
                    return Err(QueryError::InvalidArgument(String::from(
                        "JSON key checks need a column path",
                    )));
                };
                let Some((parent, last)) = split_last_leg(json) else {
                    return Err(QueryError::InvalidArgument(String::from(
                        "JSON key checks need a column path",
                    )));
                };
                let parent = self.json_selector(&Expr::JsonPath(parent))?;
                Ok(match last.key.parse::<usize>() {
                    Ok(index) => format!(
                        "CASE WHEN jsonb_typeof(({parent})::jsonb) = 'array' \
                         THEN jsonb_array_length(({parent})::jsonb) > {index} ELSE false END"
                    ),
                    Err(_) => format!(
                        "coalesce(jsonb_exists(({parent})::jsonb, {}), false)",
                        json_key_literal(&last.key)
                    ),
                })
            }
            _ => {
                let selector = self.json_selector(column)?;
                Ok(format!("jsonb_array_length(({selector})::jsonb)"))
            }
        }
    }

    fn visit_json_path(&mut self, json: &JsonPathExpression) -> Result<String> {
        let mut sql = self.quote_path(&json.column);
        for leg in &json.legs {
            sql.push_str(match leg.arrow {
                JsonArrow::Extract => "->",
                JsonArrow::ExtractText => "->>",
            });
            sql.push_str(&json_key_literal(&leg.key));
        }
        Ok(sql)
    }

    fn lock_suffix(&self, lock: &Lock) -> Option<String> {
        Some(match lock {
            Lock::Update => String::from("FOR UPDATE"),
            Lock::Shared => String::from("FOR SHARE"),
            Lock::Raw(sql) => sql.clone(),
        })
    }

    fn visit_distinct(&mut self, distinct: &Distinct) -> Result<String> {
        Ok(match distinct {
            Distinct::All => String::new(),
            Distinct::Distinct => String::from("DISTINCT "),
            Distinct::On(columns) => {
                let mut quoted = Vec::with_capacity(columns.len());
                for column in columns {
                    let expr = crate::builder::parse_column(column)?;
                    quoted.push(self.visit_expr(&expr)?);
                }
                format!("DISTINCT ON ({}) ", quoted.join(", "))
            }
        })
    }

    /// Numbers `?` placeholders and shifts `$N` ones by the placeholders
    /// already emitted. `??` is a literal `?`. Quoted text is left alone.
    fn visit_raw_text(&mut self, sql: &str) -> String {
        let base = self.state.ctx.offset();
        let mut highest = 0;
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            match (quote, c) {
                (Some(q), _) if c == q => {
                    quote = None;
                    out.push(c);
                }
                (Some(_), _) => out.push(c),
                (None, '\'' | '"') => {
                    quote = Some(c);
                    out.push(c);
                }
                (None, '?') if chars.peek() == Some(&'?') => {
                    chars.next();
                    out.push('?');
                }
                (None, '?') => {
                    let n = self.state.ctx.next_placeholder();
                    out.push_str(&format!("${n}"));
                }
                (None, '$') if chars.peek().is_some_and(char::is_ascii_digit) => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    let n = digits.parse::<usize>().unwrap_or(0);
                    highest = highest.max(n);
                    out.push_str(&format!("${}", base + n));
                }
                (None, _) => out.push(c),
            }
        }
        self.state.ctx.advance_to(base + highest);
        out
    }

    fn visit_truncate(&mut self, truncate: &TruncateSpecification) -> Result<String> {
        Ok(format!(
            "TRUNCATE {} RESTART IDENTITY CASCADE",
            self.visit_expr(&truncate.table)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{CompileContext, Grammar, PostgresGrammar};

    #[test]
    fn test_raw_text_numbering() {
        let grammar = PostgresGrammar::new();
        let mut ctx = CompileContext::new();
        let mut visitor = grammar.visitor(&mut ctx);
        assert_eq!(visitor.placeholder(), "$1");
        assert_eq!(
            visitor.visit_raw_text("a = ? AND b = '?' AND c ?? 'k' AND d = ?"),
            "a = $2 AND b = '?' AND c ? 'k' AND d = $3"
        );
        assert_eq!(visitor.visit_raw_text("x = $1 OR y = $2"), "x = $4 OR y = $5");
        assert_eq!(visitor.placeholder(), "$6");
    }
}
