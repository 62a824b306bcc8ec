//! User query submission
//!
//! wrap → execute → render. Each submission is isolated: a failure here
//! never touches the catalog or any other submission.

mod errors;
mod result;
mod wrapper;

pub use errors::{QueryError, QueryResult};
pub use result::{render_result, ResultCell, ResultRow, ResultTable};
pub use wrapper::{QueryWrapper, WrappedQuery};

use crate::engine::ProvenanceEngine;
use crate::observability::{log_event_with_fields, Event, ObservationScope};

/// Run one user query and render its annotated result
pub async fn run_query(
    engine: &dyn ProvenanceEngine,
    wrapper: &QueryWrapper,
    user_query: &str,
) -> QueryResult<ResultTable> {
    log_event_with_fields(Event::QueryReceived, &[("query", user_query)]);
    let wrapped = wrapper.wrap(user_query)?;
    log_event_with_fields(Event::QueryWrapped, &[("statement", wrapped.statement.as_str())]);

    let scope = ObservationScope::with_fields("QUERY", &[("query", user_query)]);
    let set = match engine.execute_wrapped(&wrapped).await {
        Ok(set) => set,
        Err(err) => {
            let err = QueryError::from(err);
            log_event_with_fields(
                Event::QueryFailed,
                &[("code", err.code()), ("reason", err.to_string().as_str())],
            );
            scope.fail(&err.to_string());
            return Err(err);
        }
    };

    match render_result(&set) {
        Ok(table) => {
            let rows = table.row_count().to_string();
            log_event_with_fields(Event::QueryExecuted, &[("rows", rows.as_str())]);
            scope.complete_with_fields(&[("rows", rows.as_str())]);
            Ok(table)
        }
        Err(err) => {
            log_event_with_fields(Event::ResultMalformed, &[("reason", err.to_string().as_str())]);
            scope.fail(&err.to_string());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, ResultSet};

    #[tokio::test]
    async fn test_run_query_renders_annotated_rows() {
        let set = ResultSet::new(
            vec!["city".into(), "where_provenance".into()],
            vec![vec![
                Some("Paris".into()),
                Some("((personnel:t1:2;personnel:t2:2))".into()),
            ]],
        );
        let engine = MemoryEngine::new().with_result("SELECT distinct city FROM personnel", set);
        let table = run_query(&engine, &QueryWrapper::default(), "SELECT distinct city FROM personnel;")
            .await
            .unwrap();
        assert_eq!(table.rows[0].cells[0].reference, "1 ((personnel:t1:2;personnel:t2:2))");
    }

    #[tokio::test]
    async fn test_run_query_isolates_failures() {
        let engine = MemoryEngine::new().with_failure("SELECT nope", "column \"nope\" does not exist");
        let err = run_query(&engine, &QueryWrapper::default(), "SELECT nope")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_run_query_rejects_empty() {
        let engine = MemoryEngine::new();
        let err = run_query(&engine, &QueryWrapper::default(), " ").await.unwrap_err();
        assert!(matches!(err, QueryError::Empty));
        assert!(engine.executed().is_empty());
    }
}
