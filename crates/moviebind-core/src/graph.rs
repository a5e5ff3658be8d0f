use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{Catalog, EntityKind};

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a catalog.
pub fn build_fk_graph_report(catalog: &Catalog) -> FkGraphReport {
    let parents = parent_tables(catalog);
    let summary = FkGraphSummary {
        nodes: parents.len(),
        edges: parents.values().map(BTreeSet::len).sum(),
    };

    let (topo_order, cycle) = match toposort(&parents) {
        Ok(order) => (Some(order), None),
        Err(stuck) => (None, Some(stuck)),
    };
    FkGraphReport {
        summary,
        topo_order,
        cycle,
    }
}

/// Entity kinds ordered so every table comes after the tables it references.
pub fn creation_order(catalog: &Catalog) -> Result<Vec<EntityKind>> {
    let report = build_fk_graph_report(catalog);
    let Some(order) = report.topo_order else {
        return Err(Error::InvalidSchema(format!(
            "cyclic foreign keys between: {}",
            report.cycle.unwrap_or_default().join(", ")
        )));
    };

    order
        .iter()
        .map(|name| {
            EntityKind::from_table_name(name)
                .ok_or_else(|| Error::InvalidSchema(format!("unknown table in graph: {name}")))
        })
        .collect()
}

/// Every table mapped to the tables its foreign keys reference.
fn parent_tables(catalog: &Catalog) -> BTreeMap<String, BTreeSet<String>> {
    catalog
        .tables
        .iter()
        .map(|table| {
            let parents = table
                .foreign_keys()
                .map(|fk| fk.referenced_table.clone())
                .collect();
            (table.name.clone(), parents)
        })
        .collect()
}

/// Place tables one at a time, always taking the first (by name) whose
/// parents are already placed. On a cycle, returns the tables left over.
fn toposort(parents: &BTreeMap<String, BTreeSet<String>>) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut order = Vec::with_capacity(parents.len());

    while order.len() < parents.len() {
        let next = parents.iter().find(|(table, deps)| {
            !placed.contains(table.as_str())
                && deps
                    .iter()
                    .all(|dep| placed.contains(dep.as_str()) || !parents.contains_key(dep))
        });

        let Some((table, _)) = next else {
            return Err(parents
                .keys()
                .filter(|table| !placed.contains(table.as_str()))
                .cloned()
                .collect());
        };
        placed.insert(table.as_str());
        order.push(table.clone());
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constraint, ForeignKey};
    use crate::schema::Table;

    fn position(order: &[EntityKind], kind: EntityKind) -> usize {
        order
            .iter()
            .position(|item| *item == kind)
            .expect("kind present in order")
    }

    #[test]
    fn parents_precede_children() {
        let order = creation_order(&Catalog::moviebind()).expect("acyclic catalog");
        assert_eq!(order.len(), EntityKind::ALL.len());

        assert!(position(&order, EntityKind::User) < position(&order, EntityKind::Profile));
        assert!(position(&order, EntityKind::User) < position(&order, EntityKind::Contract));
        assert!(position(&order, EntityKind::Contract) < position(&order, EntityKind::Viewing));
        assert!(position(&order, EntityKind::Movie) < position(&order, EntityKind::Viewing));
        assert!(position(&order, EntityKind::Genre) < position(&order, EntityKind::MovieGenre));
        assert!(
            position(&order, EntityKind::Keyword) < position(&order, EntityKind::MovieKeyword)
        );
    }

    #[test]
    fn toposort_reports_cycle() {
        let mut catalog = Catalog::moviebind();
        let users: &mut Table = catalog
            .tables
            .iter_mut()
            .find(|table| table.kind == EntityKind::User)
            .expect("users table");
        users.constraints.push(Constraint::ForeignKey(ForeignKey {
            name: Some("fk_users_profile".to_string()),
            columns: vec!["id".to_string()],
            referenced_table: "profiles".to_string(),
            referenced_columns: vec!["id".to_string()],
        }));

        let report = build_fk_graph_report(&catalog);
        assert!(report.topo_order.is_none());
        let cycle = report.cycle.expect("cycle reported");
        assert!(cycle.contains(&"users".to_string()));
        assert!(cycle.contains(&"profiles".to_string()));
        assert!(matches!(
            creation_order(&catalog),
            Err(Error::InvalidSchema(_))
        ));
    }
}
