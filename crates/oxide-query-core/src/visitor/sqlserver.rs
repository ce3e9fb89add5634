//! SQL Server renderer.
//!
//! Limits become `TOP n`, or `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` once an
//! offset is present. Locks are table hints on the FROM table.

use super::{json_key_literal, split_last_leg, QueryVisitor, VisitState};
use crate::ast::{
    Expr, FunctionName, JsonPathExpression, LimitClause, Lock, MergeSpecification, OffsetClause,
    OrderByClause,
};
use crate::error::{QueryError, Result};

/// Renders statements for SQL Server.
#[derive(Debug)]
pub struct SqlServerVisitor<'a> {
    state: VisitState<'a>,
}

impl<'a> SqlServerVisitor<'a> {
    /// Creates a visitor over `state`.
    #[must_use]
    pub const fn new(state: VisitState<'a>) -> Self {
        Self { state }
    }
}

impl<'a> QueryVisitor<'a> for SqlServerVisitor<'a> {
    fn state(&mut self) -> &mut VisitState<'a> {
        &mut self.state
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn function_template(&self, name: FunctionName) -> Option<&'static str> {
        match name {
            FunctionName::Date => Some("CAST({0} AS date)"),
            FunctionName::Time => Some("CAST({0} AS time)"),
            FunctionName::Day => Some("DAY({0})"),
            FunctionName::Month => Some("MONTH({0})"),
            FunctionName::Year => Some("YEAR({0})"),
            FunctionName::Random => Some("NEWID()"),
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
                let (field, path) = self.json_field_and_path(column)?;
                Ok(format!(
                    "{} IN (SELECT [value] FROM OPENJSON({field}{path}))",
                    value.unwrap_or_default()
                ))
            }
            FunctionName::JsonContainsKey => {
                let Some((parent, last)) = (match column {
                    Expr::JsonPath(json) => split_last_leg(json),
                    _ => None,
                }) else {
                    return Err(QueryError::InvalidArgument(String::from(
                        "JSON key checks need a column path",
                    )));
                };
                let key = json_key_literal(&last.key);
                let (field, path) = if parent.legs.is_empty() {
                    (self.quote_path(&parent.column), String::new())
                } else {
                    self.json_field_and_path(&Expr::JsonPath(parent))?
                };
                Ok(format!("{key} IN (SELECT [key] FROM OPENJSON({field}{path}))"))
            }
            _ => {
                let (field, path) = self.json_field_and_path(column)?;
                Ok(format!("(SELECT COUNT(*) FROM OPENJSON({field}{path}))"))
            }
        }
    }

    fn visit_json_path(&mut self, json: &JsonPathExpression) -> Result<String> {
        let field = self.quote_path(&json.column);
        Ok(format!("json_value({field}, '{}')", json.json_path()))
    }

    fn table_hint(&self, lock: &Lock) -> Option<String> {
        Some(match lock {
            Lock::Update => String::from("WITH(ROWLOCK,UPDLOCK,HOLDLOCK)"),
            Lock::Shared => String::from("WITH(ROWLOCK,HOLDLOCK)"),
            Lock::Raw(sql) => sql.clone(),
        })
    }

    fn top_rows(&self, limit: Option<LimitClause>, offset: Option<OffsetClause>) -> Option<usize> {
        match (limit, offset) {
            (Some(limit), None) => Some(limit.value),
            _ => None,
        }
    }

    fn union_wrap(&mut self, sql: &str) -> String {
        let alias = self.quote_table("temp_table");
        format!("SELECT * FROM ({sql}) AS {alias}")
    }

    fn visit_pagination(
        &mut self,
        order_by: Option<&OrderByClause>,
        limit: Option<LimitClause>,
        offset: Option<OffsetClause>,
        top_applied: bool,
    ) -> Result<Vec<String>> {
        let order = match order_by {
            Some(order) => self.visit_order_by(order)?,
            None => None,
        };
        let paginate = offset.is_some() || (limit.is_some() && !top_applied);
        if !paginate {
            return Ok(order.map(|sql| vec![format!("ORDER BY {sql}")]).unwrap_or_default());
        }
        let order = order.unwrap_or_else(|| String::from("(SELECT 0)"));
        let mut parts = vec![
            format!("ORDER BY {order}"),
            format!("OFFSET {} ROWS", offset.map_or(0, |o| o.value)),
        ];
        if let Some(limit) = limit {
            parts.push(format!("FETCH NEXT {} ROWS ONLY", limit.value));
        }
        Ok(parts)
    }

    fn visit_merge(&mut self, merge: &MergeSpecification) -> Result<String> {
        let table = self.visit_expr(&merge.table)?;
        let source = self.quote_identifier("source");
        let mut tuples = Vec::with_capacity(merge.rows.len());
        for row in &merge.rows {
            let values = row
                .iter()
                .map(|v| self.visit_expr(v))
                .collect::<Result<Vec<_>>>()?;
            tuples.push(format!("({})", values.join(", ")));
        }
        let columns = merge
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>();
        let on = merge
            .unique_by
            .iter()
            .map(|c| {
                let column = self.quote_identifier(c);
                format!("{source}.{column} = {table}.{column}")
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        let set = merge
            .update
            .iter()
            .map(|c| {
                let column = self.quote_identifier(c);
                format!("{column} = {source}.{column}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let columns = columns.join(", ");
        Ok(format!(
            "MERGE {table} USING (VALUES {}) AS {source} ({columns}) ON {on} \
             WHEN MATCHED THEN UPDATE SET {set} \
             WHEN NOT MATCHED THEN INSERT ({columns}) VALUES ({columns});",
            tuples.join(", ")
        ))
    }
}
