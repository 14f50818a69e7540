//! The permission catalog.
//!
//! `Catalog::load` turns raw `PermissionRecord`s into immutable `Permission`
//! values and indexes them by id and by `(resource, action)` pair. Once
//! loaded the catalog is a pure read model: nothing mutates it, and a new set
//! of definitions produces a new catalog.
//!
//! Validation rules:
//!
//! 1. Ids are `resource:action` or `resource:action:qualifier`; every segment
//!    is non-empty and made of lowercase ASCII letters, digits, or `_`.
//! 2. Explicit `resource`/`action` fields must agree with the id.
//! 3. Ids are unique.
//! 4. Condition operators are one of `eq`, `ne`, `in`, `not_in`, `gt`, `lt`,
//!    with a non-empty field path and a value of the right shape.
//! 5. Permissions sharing a `(resource, action)` pair must differ in scope or
//!    conditions. They are tried in declaration order.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use serde_json::Value;

use warden_contracts::{
    error::CatalogError,
    ids::PermissionId,
    permission::{Condition, Operator, Permission, PermissionRecord},
};

/// Validated permission definitions, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    permissions: Vec<Arc<Permission>>,
    by_id: HashMap<PermissionId, usize>,
    by_pair: HashMap<(String, String), Vec<usize>>,
}

impl Catalog {
    /// Check `records` without keeping the result.
    ///
    /// Returns the first problem found, in record order.
    pub fn validate(records: &[PermissionRecord]) -> Result<(), CatalogError> {
        Self::load(records).map(|_| ())
    }

    /// Validate `records` and build the catalog.
    pub fn load(records: &[PermissionRecord]) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();

        for record in records {
            let permission = build_permission(record)?;

            if catalog.by_id.contains_key(permission.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: record.id.clone(),
                });
            }

            let pair = (permission.resource.clone(), permission.action.clone());
            if let Some(existing) = catalog.by_pair.get(&pair) {
                for &idx in existing {
                    let other = &catalog.permissions[idx];
                    if other.scope == permission.scope && other.conditions == permission.conditions {
                        return Err(CatalogError::DuplicateAlternative {
                            id: record.id.clone(),
                            existing: other.id.to_string(),
                        });
                    }
                }
            }

            let idx = catalog.permissions.len();
            catalog.by_id.insert(permission.id.clone(), idx);
            catalog.by_pair.entry(pair).or_default().push(idx);
            catalog.permissions.push(Arc::new(permission));
        }

        Ok(catalog)
    }

    /// All entries granting `action` on `resource`, in declaration order.
    pub fn lookup(&self, resource: &str, action: &str) -> Vec<&Permission> {
        self.by_pair
            .get(&(resource.to_string(), action.to_string()))
            .map(|indices| indices.iter().map(|&i| self.permissions[i].as_ref()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Permission>> {
        self.by_id.get(id).map(|&i| &self.permissions[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Declaration index of `id`. Lower positions are tried first.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Permission>> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Distinct resource names, sorted.
    pub fn resources(&self) -> BTreeSet<&str> {
        self.permissions.iter().map(|p| p.resource.as_str()).collect()
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn build_permission(record: &PermissionRecord) -> Result<Permission, CatalogError> {
    let segments: Vec<&str> = record.id.split(':').collect();
    if segments.len() != 2 && segments.len() != 3 {
        return Err(CatalogError::MalformedId {
            id: record.id.clone(),
            reason: "expected 'resource:action' or 'resource:action:qualifier'".to_string(),
        });
    }
    if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
        return Err(CatalogError::MalformedId {
            id: record.id.clone(),
            reason: format!(
                "segment '{bad}' must be non-empty lowercase letters, digits, or underscores"
            ),
        });
    }

    let resource = record.resource.clone().unwrap_or_else(|| segments[0].to_string());
    let action = record.action.clone().unwrap_or_else(|| segments[1].to_string());
    if resource != segments[0] || action != segments[1] {
        return Err(CatalogError::IdMismatch {
            id: record.id.clone(),
            resource,
            action,
        });
    }

    let mut conditions = Vec::with_capacity(record.conditions.len());
    for raw in &record.conditions {
        if raw.field.trim().is_empty() {
            return Err(CatalogError::EmptyConditionField {
                id: record.id.clone(),
            });
        }

        let operator =
            Operator::parse(&raw.operator).ok_or_else(|| CatalogError::UnsupportedOperator {
                id: record.id.clone(),
                operator: raw.operator.clone(),
            })?;

        check_condition_value(operator, &raw.value).map_err(|reason| {
            CatalogError::InvalidConditionValue {
                id: record.id.clone(),
                field: raw.field.clone(),
                reason,
            }
        })?;

        conditions.push(Condition {
            field: raw.field.clone(),
            operator,
            value: raw.value.clone(),
        });
    }

    Ok(Permission {
        id: PermissionId::new(record.id.clone()),
        resource,
        action,
        scope: record.scope,
        conditions,
        description: record.description.clone(),
    })
}

fn is_placeholder(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with("${") && s.ends_with('}'))
}

/// `in`/`not_in` take an array, or a placeholder (`"${context.regions}"`)
/// that may resolve to one. Ordering operators accept any string, since
/// strings order lexicographically.
fn check_condition_value(operator: Operator, value: &Value) -> Result<(), String> {
    match operator {
        Operator::Eq | Operator::Ne => {
            if value.is_null() {
                return Err(format!("'{operator}' requires a value"));
            }
        }
        Operator::In | Operator::NotIn => {
            if !value.is_array() && !is_placeholder(value) {
                return Err(format!("'{operator}' requires an array of values"));
            }
        }
        Operator::Gt | Operator::Lt => {
            if !value.is_number() && !value.is_string() {
                return Err(format!("'{operator}' requires a number or a string"));
            }
        }
    }
    Ok(())
}
