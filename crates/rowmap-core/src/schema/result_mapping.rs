use crate::{driver::SqlType, handler::TypeHandler, stmt::Type};

use std::sync::Arc;

/// How one column, nested result map or nested query fills one property.
#[derive(Debug, Clone)]
pub struct ResultMapping {
    /// Target property path; for constructor mappings, the parameter name
    pub property: Option<String>,

    /// Source column, before any enclosing column prefix is applied
    pub column: Option<String>,

    /// Property type. `Any` is replaced by the declared property type when
    /// the schema is built.
    pub ty: Type,

    pub sql_type: Option<SqlType>,

    /// Column conversion. Left empty when it can only be picked from the
    /// actual column type at mapping time.
    pub handler: Option<Arc<dyn TypeHandler>>,

    /// Result map that builds the property from the same row (joins)
    pub nested_result_map_id: Option<String>,

    /// Statement that loads the property (sub-select)
    pub nested_query_id: Option<String>,

    /// Columns that must not all be null for the nested object to exist
    pub not_null_columns: Vec<String>,

    /// Prefix applied to every column of the nested result map
    pub column_prefix: Option<String>,

    pub flags: ResultFlags,

    /// Parameter columns of a nested query, `property = column`
    pub composites: Vec<ResultMapping>,

    /// Named resultset that supplies this property
    pub result_set: Option<String>,

    /// Column of `result_set` matched against `column`
    pub foreign_column: Option<String>,

    /// Defer the nested query; `None` follows `lazy_loading_enabled`
    pub lazy: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFlags {
    /// Part of the row identity
    pub id: bool,

    /// Passed to the constructor instead of a setter
    pub constructor: bool,
}

impl ResultMapping {
    /// Maps `column` to `property`.
    pub fn column(property: impl Into<String>, column: impl Into<String>) -> ResultMapping {
        ResultMapping {
            column: Some(column.into()),
            ..ResultMapping::property(property)
        }
    }

    /// A mapping for `property` with no column, to be completed with a
    /// nested result map or a nested query.
    pub fn property(property: impl Into<String>) -> ResultMapping {
        ResultMapping {
            property: Some(property.into()),
            column: None,
            ty: Type::Any,
            sql_type: None,
            handler: None,
            nested_result_map_id: None,
            nested_query_id: None,
            not_null_columns: vec![],
            column_prefix: None,
            flags: ResultFlags::default(),
            composites: vec![],
            result_set: None,
            foreign_column: None,
            lazy: None,
        }
    }

    /// A mapping that only reads a column, as used by discriminators.
    pub fn unnamed(column: impl Into<String>) -> ResultMapping {
        ResultMapping {
            property: None,
            ..ResultMapping::column("", column)
        }
    }

    pub fn id(mut self) -> Self {
        self.flags.id = true;
        self
    }

    pub fn constructor(mut self) -> Self {
        self.flags.constructor = true;
        self
    }

    pub fn ty(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }

    pub fn sql_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn TypeHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn nested_result_map(mut self, id: impl Into<String>) -> Self {
        self.nested_result_map_id = Some(id.into());
        self
    }

    pub fn nested_query(mut self, id: impl Into<String>) -> Self {
        self.nested_query_id = Some(id.into());
        self
    }

    pub fn not_null_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_null_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = Some(prefix.into());
        self
    }

    /// Adds a `property = column` parameter for the nested query.
    pub fn composite(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.composites.push(ResultMapping::column(property, column));
        self
    }

    /// Takes the property from a later resultset, joining its
    /// `foreign_column` against this mapping's column.
    pub fn result_set(
        mut self,
        name: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        self.result_set = Some(name.into());
        self.foreign_column = Some(foreign_column.into());
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// Reads a single column into the property, with nothing nested.
    pub fn is_simple(&self) -> bool {
        self.column.is_some()
            && self.nested_result_map_id.is_none()
            && self.nested_query_id.is_none()
            && self.result_set.is_none()
    }

    pub fn is_composite(&self) -> bool {
        !self.composites.is_empty()
    }

    /// Columns this mapping reads from the row, including composites.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.column
            .as_deref()
            .into_iter()
            .chain(self.composites.iter().filter_map(|c| c.column.as_deref()))
    }

    /// Columns of a multi-column link, for either side of a resultset join.
    pub fn split_columns(columns: &str) -> Vec<String> {
        columns
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|column| !column.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_mappings() {
        assert!(ResultMapping::column("id", "ID").is_simple());
        assert!(!ResultMapping::property("author")
            .nested_result_map("author")
            .is_simple());
        assert!(!ResultMapping::column("posts", "ID")
            .nested_query("selectPosts")
            .is_simple());
    }

    #[test]
    fn composite_columns() {
        let mapping = ResultMapping::property("post")
            .nested_query("selectPost")
            .composite("blogId", "BLOG_ID")
            .composite("authorId", "AUTHOR_ID");
        let columns: Vec<_> = mapping.columns().collect();
        assert_eq!(columns, ["BLOG_ID", "AUTHOR_ID"]);
    }

    #[test]
    fn split_link_columns() {
        assert_eq!(ResultMapping::split_columns("A, B"), ["A", "B"]);
        assert_eq!(ResultMapping::split_columns("ID"), ["ID"]);
    }
}
