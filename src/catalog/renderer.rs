//! Source catalog renderer
//!
//! Renders every provenance-tagged relation as a table whose cells are named
//! by Tagged Cell Identifiers. Those names are the only things the highlight
//! controller can ever activate.

use std::collections::HashSet;

use serde::Serialize;

use super::errors::{CatalogError, CatalogIssue, CatalogResult};
use super::relation::Relation;
use crate::engine::{ProvenanceEngine, ResultSet, PROVENANCE_COLUMN};
use crate::identifier::{IdentifierError, TaggedCellId};
use crate::observability::{log_event_with_fields, Event, ObservationScope};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogCell {
    pub id: TaggedCellId,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    /// Provenance token of the row
    pub token: String,
    pub cells: Vec<CatalogCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTable {
    pub relation: String,
    pub headers: Vec<String>,
    pub rows: Vec<CatalogRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    pub tables: Vec<CatalogTable>,
    /// Relations skipped during this render
    pub issues: Vec<CatalogIssue>,
}

impl CatalogView {
    /// Every identifier rendered on the page
    pub fn addressable_ids(&self) -> HashSet<TaggedCellId> {
        self.cells().map(|cell| cell.id.clone()).collect()
    }

    pub fn cell(&self, id: &TaggedCellId) -> Option<&CatalogCell> {
        self.tables
            .iter()
            .filter(|table| table.relation == id.relation())
            .flat_map(|table| table.rows.iter())
            .filter(|row| row.token == id.token())
            .flat_map(|row| row.cells.iter())
            .find(|cell| &cell.id == id)
    }

    fn cells(&self) -> impl Iterator<Item = &CatalogCell> {
        self.tables
            .iter()
            .flat_map(|table| table.rows.iter())
            .flat_map(|row| row.cells.iter())
    }
}

/// Discover relations that pass the provenance-column capability check
///
/// The outer error means discovery itself failed. Relations that fail the
/// check or whose attributes cannot be read come back as per-relation errors.
pub async fn discover(
    engine: &dyn ProvenanceEngine,
) -> CatalogResult<(Vec<Relation>, Vec<CatalogError>)> {
    let descriptors = engine
        .discover_relations()
        .await
        .map_err(CatalogError::from_discovery)?;

    let mut relations = Vec::with_capacity(descriptors.len());
    let mut skipped = Vec::new();
    for descriptor in &descriptors {
        let attributes = match engine.relation_attributes(descriptor).await {
            Ok(attributes) => attributes,
            Err(err) if err.is_fatal() => return Err(CatalogError::Connection(err.to_string())),
            Err(err) => {
                skipped.push(CatalogError::Attributes {
                    relation: descriptor.name.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let relation = Relation::from_descriptor(descriptor, attributes);
        if !relation.has_provenance_column() {
            skipped.push(CatalogError::NoProvenanceColumn {
                relation: relation.name.clone(),
                column: PROVENANCE_COLUMN.to_string(),
            });
            continue;
        }
        log_event_with_fields(Event::RelationDiscovered, &[("relation", relation.name.as_str())]);
        relations.push(relation);
    }
    Ok((relations, skipped))
}

/// Render the whole catalog
///
/// Fails only when discovery fails; a failing relation is reported in
/// [`CatalogView::issues`] and the others still render.
pub async fn render_catalog(engine: &dyn ProvenanceEngine) -> CatalogResult<CatalogView> {
    let scope = ObservationScope::new("CATALOG");
    let (relations, skipped) = match discover(engine).await {
        Ok(found) => found,
        Err(err) => {
            scope.fail(err.to_string().as_str());
            return Err(err);
        }
    };

    let mut view = CatalogView::default();
    let mut errors = skipped;
    for relation in &relations {
        let rendered = match engine.fetch_relation_rows(&relation.descriptor()).await {
            Ok(set) => render_table(relation, &set),
            Err(err) if err.is_fatal() => {
                let err = CatalogError::Connection(err.to_string());
                scope.fail(err.to_string().as_str());
                return Err(err);
            }
            Err(err) => Err(CatalogError::Rows {
                relation: relation.name.clone(),
                reason: err.to_string(),
            }),
        };
        match rendered {
            Ok(table) => view.tables.push(table),
            Err(err) => errors.push(err),
        }
    }

    for err in &errors {
        log_event_with_fields(
            Event::RelationSkipped,
            &[
                ("relation", err.relation().unwrap_or_default()),
                ("reason", err.to_string().as_str()),
            ],
        );
    }
    view.issues = errors.iter().map(CatalogIssue::from).collect();

    scope.complete_with_fields(&[
        ("relations", view.tables.len().to_string().as_str()),
        ("skipped", view.issues.len().to_string().as_str()),
    ]);
    Ok(view)
}

/// Name every cell of `relation` from the rows in `set`
///
/// The engine returns the visible values in attribute order and the token as
/// the last field, wherever the provenance column sits among the attributes.
/// Column numbers count visible attributes from 1.
pub fn render_table(relation: &Relation, set: &ResultSet) -> CatalogResult<CatalogTable> {
    if !relation.has_provenance_column() {
        return Err(CatalogError::NoProvenanceColumn {
            relation: relation.name.clone(),
            column: PROVENANCE_COLUMN.to_string(),
        });
    }
    let width = relation.fetched_width();

    let mut seen_tokens = HashSet::new();
    let mut rows = Vec::with_capacity(set.rows.len());
    for (index, fields) in set.rows.iter().enumerate() {
        let (values, token) = match fields.split_last() {
            Some((Some(token), values)) if fields.len() == width => (values, token.clone()),
            _ => {
                return Err(CatalogError::RowShape {
                    relation: relation.name.clone(),
                    row: index,
                    expected: width,
                    found: fields.len(),
                })
            }
        };

        if !seen_tokens.insert(token.clone()) {
            log_event_with_fields(
                Event::DuplicateProvenanceToken,
                &[("relation", relation.name.as_str()), ("token", token.as_str())],
            );
        }

        let cells = values
            .iter()
            .enumerate()
            .map(|(j, value)| -> CatalogResult<CatalogCell> {
                let id = TaggedCellId::new(relation.name.as_str(), token.as_str(), (j + 1) as u32)
                    .map_err(|err| unaddressable(relation, err))?;
                Ok(CatalogCell {
                    id,
                    value: value.clone(),
                })
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        rows.push(CatalogRow { token, cells });
    }

    Ok(CatalogTable {
        relation: relation.name.clone(),
        headers: relation.visible_attributes(),
        rows,
    })
}

fn unaddressable(relation: &Relation, err: IdentifierError) -> CatalogError {
    CatalogError::UnaddressableRelation {
        relation: relation.name.clone(),
        reason: err.to_string(),
    }
}
