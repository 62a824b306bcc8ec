//! Query wrapper
//!
//! Turns a user query into one that also returns the where-provenance
//! annotation of every row as an extra trailing column.

use serde::Serialize;

use super::errors::{QueryError, QueryResult};
use crate::engine::{PROVENANCE_NAMESPACE, PUBLIC_NAMESPACE};

/// Session setup plus the wrapped statement, executed in that order on one
/// connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrappedQuery {
    pub setup: String,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWrapper {
    namespace: String,
    public_namespace: String,
}

impl QueryWrapper {
    pub fn new(namespace: &str, public_namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            public_namespace: public_namespace.to_string(),
        }
    }

    /// Remove at most one trailing statement terminator, with any whitespace
    /// after it
    pub fn strip_terminator<'a>(&self, query: &'a str) -> &'a str {
        query.trim_end().strip_suffix(';').unwrap_or(query)
    }

    /// Wrap `user_query` so each row also carries its provenance annotation
    ///
    /// Column count and order of the user's selection are untouched; exactly
    /// one column is appended.
    pub fn wrap(&self, user_query: &str) -> QueryResult<WrappedQuery> {
        let query = self.strip_terminator(user_query);
        if query.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(WrappedQuery {
            setup: format!(
                "SET search_path TO {}, {}",
                self.public_namespace, self.namespace
            ),
            statement: format!(
                "select *, {ns}.where_provenance({ns}.provenance()) from ({q}) t",
                ns = self.namespace,
                q = query
            ),
        })
    }
}

impl Default for QueryWrapper {
    fn default() -> Self {
        Self::new(PROVENANCE_NAMESPACE, PUBLIC_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_strips_one_terminator() {
        let wrapped = QueryWrapper::default().wrap("SELECT * FROM personnel;").unwrap();
        assert_eq!(
            wrapped.statement,
            "select *, provsql.where_provenance(provsql.provenance()) from (SELECT * FROM personnel) t"
        );
        assert_eq!(wrapped.setup, "SET search_path TO public, provsql");
    }

    #[test]
    fn test_wrap_without_terminator_is_verbatim() {
        let query = "SELECT distinct city FROM personnel  WHERE city <> 'a;b'";
        let wrapped = QueryWrapper::default().wrap(query).unwrap();
        assert!(wrapped.statement.contains(&format!("({}) t", query)));
    }

    #[test]
    fn test_at_most_one_terminator_removed() {
        let wrapper = QueryWrapper::default();
        assert_eq!(wrapper.strip_terminator("SELECT 1;;"), "SELECT 1;");
        assert_eq!(wrapper.strip_terminator("SELECT 1;  \n"), "SELECT 1");
        assert_eq!(wrapper.strip_terminator("SELECT 1 ;"), "SELECT 1 ");
        assert_eq!(wrapper.strip_terminator("SELECT ';' AS s"), "SELECT ';' AS s");
        assert_eq!(wrapper.strip_terminator("SELECT 1 \t"), "SELECT 1 \t");
        assert_eq!(wrapper.strip_terminator(";"), "");
    }

    #[test]
    fn test_empty_query_rejected() {
        let wrapper = QueryWrapper::default();
        assert!(matches!(wrapper.wrap(""), Err(QueryError::Empty)));
        assert!(matches!(wrapper.wrap("  ;  "), Err(QueryError::Empty)));
    }

    #[test]
    fn test_custom_namespace() {
        let wrapped = QueryWrapper::new("prov", "app").wrap("SELECT 1").unwrap();
        assert_eq!(wrapped.setup, "SET search_path TO app, prov");
        assert!(wrapped.statement.starts_with("select *, prov.where_provenance(prov.provenance())"));
    }
}
