//! In-memory provenance engine
//!
//! Holds provenance-tagged relations and canned results for wrapped queries,
//! so catalog rendering, query execution and the HTTP surface run without a
//! database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};
use super::{ProvenanceEngine, RelationDescriptor, ResultSet, PROVENANCE_COLUMN};
use crate::query::{QueryWrapper, WrappedQuery};

/// First id handed to relations added without one
const FIRST_RELATION_ID: u32 = 16384;

#[derive(Debug, Clone)]
pub struct MemoryRelation {
    pub name: String,
    pub internal_id: u32,
    /// Visible attributes; the provenance column is implicit
    pub attributes: Vec<String>,
    /// Position of the provenance column among the attributes, last if unset
    pub provenance_position: Option<usize>,
    /// `(token, values)` per row
    pub rows: Vec<(String, Vec<Option<String>>)>,
    /// Row fetches fail with this reason when set
    pub failure: Option<String>,
}

impl MemoryRelation {
    pub fn new(name: &str, attributes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            internal_id: 0,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            provenance_position: None,
            rows: Vec::new(),
            failure: None,
        }
    }

    pub fn row(mut self, token: &str, values: &[&str]) -> Self {
        self.rows.push((
            token.to_string(),
            values.iter().map(|v| Some(v.to_string())).collect(),
        ));
        self
    }

    pub fn row_with_nulls(mut self, token: &str, values: Vec<Option<String>>) -> Self {
        self.rows.push((token.to_string(), values));
        self
    }

    /// Add a row under a fresh random token, as the engine does on insert
    pub fn generated_row(self, values: &[&str]) -> Self {
        let token = Uuid::new_v4().to_string();
        self.row(&token, values)
    }

    /// Put the provenance column at `position`, as when columns are added
    /// after tracking was enabled
    pub fn provenance_at(mut self, position: usize) -> Self {
        self.provenance_position = Some(position);
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            internal_id: self.internal_id,
            visible_columns: self.attributes.len(),
        }
    }
}

pub struct MemoryEngine {
    relations: Vec<MemoryRelation>,
    results: HashMap<String, Result<ResultSet, String>>,
    wrapper: QueryWrapper,
    unreachable: bool,
    discovery_failure: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            relations: Vec::new(),
            results: HashMap::new(),
            wrapper: QueryWrapper::default(),
            unreachable: false,
            discovery_failure: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// An engine every call fails against with a connection error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    /// Fail discovery with a non-fatal catalog error
    pub fn with_discovery_failure(mut self, reason: &str) -> Self {
        self.discovery_failure = Some(reason.to_string());
        self
    }

    pub fn with_relation(mut self, mut relation: MemoryRelation) -> Self {
        if relation.internal_id == 0 {
            relation.internal_id = FIRST_RELATION_ID + self.relations.len() as u32;
        }
        self.relations.push(relation);
        self
    }

    /// Answer `user_query`, once wrapped, with `result`
    pub fn with_result(mut self, user_query: &str, result: ResultSet) -> Self {
        let key = self.statement_for(user_query);
        self.results.insert(key, Ok(result));
        self
    }

    /// Fail `user_query`, once wrapped, with `reason`
    pub fn with_failure(mut self, user_query: &str, reason: &str) -> Self {
        let key = self.statement_for(user_query);
        self.results.insert(key, Err(reason.to_string()));
        self
    }

    /// Statements executed so far, setup statements included
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn statement_for(&self, user_query: &str) -> String {
        self.wrapper
            .wrap(user_query)
            .map(|wrapped| wrapped.statement)
            .unwrap_or_else(|_| user_query.to_string())
    }

    fn record(&self, statement: &str) {
        if let Ok(mut log) = self.executed.lock() {
            log.push(statement.to_string());
        }
    }

    fn check_reachable(&self) -> EngineResult<()> {
        if self.unreachable {
            return Err(EngineError::Connection("engine unreachable".into()));
        }
        Ok(())
    }

    fn find(&self, relation: &RelationDescriptor) -> EngineResult<&MemoryRelation> {
        self.relations
            .iter()
            .find(|r| r.name == relation.name)
            .ok_or_else(|| {
                EngineError::Catalog(format!("relation \"{}\" does not exist", relation.name))
            })
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProvenanceEngine for MemoryEngine {
    async fn discover_relations(&self) -> EngineResult<Vec<RelationDescriptor>> {
        self.check_reachable()?;
        if let Some(reason) = &self.discovery_failure {
            return Err(EngineError::Catalog(reason.clone()));
        }
        Ok(self.relations.iter().map(MemoryRelation::descriptor).collect())
    }

    async fn relation_attributes(&self, relation: &RelationDescriptor) -> EngineResult<Vec<String>> {
        self.check_reachable()?;
        let found = self.find(relation)?;
        let mut attributes = found.attributes.clone();
        let position = found
            .provenance_position
            .unwrap_or(attributes.len())
            .min(attributes.len());
        attributes.insert(position, PROVENANCE_COLUMN.to_string());
        Ok(attributes)
    }

    async fn fetch_relation_rows(&self, relation: &RelationDescriptor) -> EngineResult<ResultSet> {
        self.check_reachable()?;
        self.record(&format!("SELECT * FROM (SELECT * FROM {}) t", relation.name));
        let found = self.find(relation)?;
        if let Some(reason) = &found.failure {
            return Err(EngineError::Catalog(reason.clone()));
        }

        let mut columns = found.attributes.clone();
        columns.push(PROVENANCE_COLUMN.to_string());
        let rows = found
            .rows
            .iter()
            .map(|(token, values)| {
                let mut row = values.clone();
                row.push(Some(token.clone()));
                row
            })
            .collect();
        Ok(ResultSet::new(columns, rows))
    }

    async fn execute_wrapped(&self, query: &WrappedQuery) -> EngineResult<ResultSet> {
        self.check_reachable()?;
        self.record(&query.setup);
        self.record(&query.statement);
        match self.results.get(&query.statement) {
            Some(Ok(set)) => Ok(set.clone()),
            Some(Err(reason)) => Err(EngineError::Execution(reason.clone())),
            None => Err(EngineError::Execution(format!(
                "no result registered for: {}",
                query.statement
            ))),
        }
    }
}
