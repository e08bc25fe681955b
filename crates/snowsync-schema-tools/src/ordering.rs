//! Dependency ordering of entities
//!
//! Tables must be created referenced-before-referencer and dropped in the
//! reverse order. The order is a depth-first topological sort over the
//! foreign-key graph that keeps the caller's order wherever the graph
//! leaves it free, so an already-ordered input comes back unchanged.

use std::collections::HashMap;

use crate::model::EntityDescriptor;
use crate::{SchemaError, SchemaResult};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Indices of `entities` in dependency order.
///
/// Self-references and references to entities outside the set do not
/// constrain the order. A cycle fails with [`SchemaError::DependencyCycle`].
pub fn dependency_order(entities: &[EntityDescriptor]) -> SchemaResult<Vec<usize>> {
    let mut index = HashMap::with_capacity(entities.len());
    for (i, entity) in entities.iter().enumerate() {
        if index.insert(entity.name.to_uppercase(), i).is_some() {
            return Err(SchemaError::InvalidEntity {
                entity: entity.name.clone(),
                reason: "entity is declared more than once".into(),
            });
        }
    }

    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); entities.len()];
    for entity in entities {
        for relationship in &entity.relationships {
            let owner = index.get(&relationship.owner_or(&entity.name).to_uppercase());
            let referenced = index.get(&relationship.referenced_entity.to_uppercase());
            if let (Some(&owner), Some(&referenced)) = (owner, referenced) {
                if owner != referenced && !dependencies[owner].contains(&referenced) {
                    dependencies[owner].push(referenced);
                }
            }
        }
    }

    let mut marks = vec![Mark::Unvisited; entities.len()];
    let mut order = Vec::with_capacity(entities.len());
    let mut path = Vec::new();
    for start in 0..entities.len() {
        visit(start, &dependencies, &mut marks, &mut path, &mut order, entities)?;
    }
    Ok(order)
}

fn visit(
    node: usize,
    dependencies: &[Vec<usize>],
    marks: &mut [Mark],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
    entities: &[EntityDescriptor],
) -> SchemaResult<()> {
    match marks[node] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|&n| entities[n].name.clone())
                .collect();
            cycle.push(entities[node].name.clone());
            return Err(SchemaError::DependencyCycle(cycle));
        }
        Mark::Unvisited => {}
    }

    marks[node] = Mark::Visiting;
    path.push(node);
    for &dependency in &dependencies[node] {
        visit(dependency, dependencies, marks, path, order, entities)?;
    }
    path.pop();
    marks[node] = Mark::Done;
    order.push(node);
    Ok(())
}

/// `entities` sorted into dependency order
pub fn ordered_entities(entities: &[EntityDescriptor]) -> SchemaResult<Vec<&EntityDescriptor>> {
    Ok(dependency_order(entities)?
        .into_iter()
        .map(|i| &entities[i])
        .collect())
}
