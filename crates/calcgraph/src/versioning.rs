//! Versioning and referential integrity
//!
//! Every calculation has exactly one latest revision. Editing a calculation
//! nobody uses rewrites that revision in place. Editing one that is in use
//! (referenced by another latest calculation or listed by a report) freezes
//! the current revision and inserts a copy at the next version, then points
//! reports at the new row.
//!
//! The bump is freeze-then-insert. The store's `(unique_id, version)`
//! uniqueness turns a lost race into [`Error::ConcurrencyConflict`]; the
//! caller retries the whole edit. If the insert fails after the freeze, the
//! old revision is marked latest again unless another writer already
//! produced a latest row.

use crate::error::{Error, Referrer, Result};
use crate::references::rewrite_report_references;
use calcgraph_core::{
    Calculation, CalculationData, Constant, EntityKind, IdentityFields, NewCalculationRow,
    PointerKind, RecordId, Store, StoreError,
};
use calcgraph_formula::{parse_expression, RefKey, ReferenceGraph};
use serde::Serialize;

/// What an edit did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum EditOutcome {
    /// The latest row was updated in place
    InPlace { id: RecordId },
    /// A new version was created and reports were pointed at it
    #[serde(rename_all = "camelCase")]
    Versioned {
        previous: RecordId,
        current: RecordId,
        version: u32,
        reports_rewritten: usize,
    },
}

impl EditOutcome {
    /// Row id holding the edited data
    pub fn id(&self) -> RecordId {
        match self {
            EditOutcome::InPlace { id } => *id,
            EditOutcome::Versioned { current, .. } => *current,
        }
    }
}

/// Applies create/edit/delete operations under the versioning rules
pub struct VersionManager<'a> {
    store: &'a dyn Store,
}

impl<'a> VersionManager<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // === Calculations ===

    /// Check calculation data before it is stored.
    ///
    /// The expression must be non-empty, must not reference `unique_id`
    /// itself, and must parse once every reference is replaced by `0`.
    pub fn validate(&self, unique_id: &str, data: &CalculationData) -> Result<()> {
        if unique_id.trim().is_empty() {
            return Err(invalid("unique id is empty"));
        }
        if data.expression.is_empty() {
            return Err(invalid("expression is empty"));
        }

        let mut text = String::new();
        for pointer in &data.expression {
            match &pointer.kind {
                PointerKind::Literal(value) => text.push_str(value),
                PointerKind::CalculationRef { unique_id: target } if target == unique_id => {
                    return Err(invalid(format!("calculation '{}' references itself", unique_id)));
                }
                _ => text.push_str("(0)"),
            }
            text.push(' ');
        }

        parse_expression(&text).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Create a calculation at version 1
    pub fn create_calculation(&self, unique_id: &str, data: CalculationData) -> Result<RecordId> {
        self.validate(unique_id, &data)?;
        if !self.store.calculation_history(unique_id)?.is_empty() {
            return Err(Error::AlreadyExists {
                kind: EntityKind::Calculation,
                unique_id: unique_id.to_string(),
            });
        }

        let id = self
            .store
            .insert_calculation(NewCalculationRow::first(unique_id, data))?;
        tracing::info!(unique_id, %id, "created calculation");
        Ok(id)
    }

    /// Freeze the latest revision of `unique_id` and insert `data` as the
    /// next version
    pub fn bump_version(&self, unique_id: &str, data: CalculationData) -> Result<RecordId> {
        self.validate(unique_id, &data)?;
        let current = self.latest_for_edit(unique_id)?;
        self.bump_from(&current, data)
    }

    /// Bump starting from a specific revision the caller read earlier.
    ///
    /// Fails with [`Error::StaleRevision`] if `current` is no longer latest.
    pub fn bump_from(&self, current: &Calculation, data: CalculationData) -> Result<RecordId> {
        let unique_id = current.unique_id.as_str();

        let reread = self.store.calculation(current.id)?;
        if !reread.map_or(false, |row| row.latest) {
            return Err(Error::StaleRevision {
                unique_id: unique_id.to_string(),
                id: current.id,
            });
        }

        let next = current.version + 1;
        if self.store.calculation_version(unique_id, next)?.is_some() {
            return Err(Error::ConcurrencyConflict {
                unique_id: unique_id.to_string(),
                version: next,
            });
        }

        if !self.store.set_latest(current.id, false)? {
            // Someone froze it between the re-read and here
            return Err(Error::ConcurrencyConflict {
                unique_id: unique_id.to_string(),
                version: next,
            });
        }

        let row = NewCalculationRow {
            unique_id: unique_id.to_string(),
            version: next,
            latest: true,
            data,
        };
        match self.store.insert_calculation(row) {
            Ok(id) => {
                tracing::info!(unique_id, version = next, previous = %current.id, %id, "bumped calculation version");
                Ok(id)
            }
            Err(e) => {
                self.restore_latest(current);
                Err(e.into())
            }
        }
    }

    fn restore_latest(&self, frozen: &Calculation) {
        let unique_id = frozen.unique_id.as_str();
        match self.store.latest_calculation(unique_id) {
            Ok(None) => match self.store.set_latest(frozen.id, true) {
                Ok(_) => tracing::warn!(unique_id, id = %frozen.id, "insert failed, restored previous revision as latest"),
                Err(e) => tracing::warn!(unique_id, id = %frozen.id, error = %e, "insert failed and restoring latest failed"),
            },
            Ok(Some(other)) => {
                tracing::warn!(unique_id, winner = %other.id, "insert failed, another writer holds latest")
            }
            Err(e) => {
                tracing::warn!(unique_id, error = %e, "insert failed, could not check latest revision")
            }
        }
    }

    /// Edit a calculation: in place when unused, new version when in use.
    ///
    /// Only references from other latest calculations block a unit change;
    /// a report listing the calculation just forces a new version.
    pub fn edit_calculation(&self, unique_id: &str, data: CalculationData) -> Result<EditOutcome> {
        self.validate(unique_id, &data)?;
        let current = self.latest_for_edit(unique_id)?;

        let new_identity = IdentityFields {
            unique_id: unique_id.to_string(),
            unit: data.unit.clone(),
        };
        let referrers = self.expression_referrers(EntityKind::Calculation, unique_id)?;
        if current.identity().first_difference(&new_identity).is_some() && !referrers.is_empty() {
            return Err(Error::Referenced {
                kind: EntityKind::Calculation,
                unique_id: unique_id.to_string(),
                referrers,
            });
        }

        if referrers.is_empty() && self.report_referrers(unique_id)?.is_empty() {
            return match self.store.update_latest_calculation(current.id, data) {
                Ok(()) => {
                    tracing::debug!(unique_id, id = %current.id, "edited calculation in place");
                    Ok(EditOutcome::InPlace { id: current.id })
                }
                Err(StoreError::RowNotLatest(id)) => Err(Error::StaleRevision {
                    unique_id: unique_id.to_string(),
                    id,
                }),
                Err(e) => Err(e.into()),
            };
        }

        let new_id = self.bump_from(&current, data)?;
        let reports_rewritten = rewrite_report_references(self.store, current.id, new_id)?;
        Ok(EditOutcome::Versioned {
            previous: current.id,
            current: new_id,
            version: current.version + 1,
            reports_rewritten,
        })
    }

    /// Delete every revision of a calculation
    pub fn delete_calculation(&self, unique_id: &str) -> Result<usize> {
        self.latest(unique_id)?;
        self.assert_deletable(EntityKind::Calculation, unique_id)?;
        let removed = self.store.delete_calculation(unique_id)?;
        tracing::info!(unique_id, rows = removed, "deleted calculation");
        Ok(removed)
    }

    /// All revisions, oldest first
    pub fn history(&self, unique_id: &str) -> Result<Vec<Calculation>> {
        let rows = self.store.calculation_history(unique_id)?;
        if rows.is_empty() {
            return Err(Error::CalculationNotFound(unique_id.to_string()));
        }
        Ok(rows)
    }

    // === Constants ===

    pub fn create_constant(&self, constant: Constant) -> Result<()> {
        if constant.unique_id.trim().is_empty() {
            return Err(invalid("unique id is empty"));
        }
        let unique_id = constant.unique_id.clone();
        self.store.insert_constant(constant)?;
        tracing::info!(unique_id = %unique_id, "created constant");
        Ok(())
    }

    /// Replace a constant; changing its unique id or unit requires that
    /// nothing references it
    pub fn edit_constant(&self, unique_id: &str, constant: Constant) -> Result<()> {
        self.assert_identity_editable(EntityKind::Constant, unique_id, &constant.identity())?;
        self.store.update_constant(unique_id, constant)?;
        tracing::debug!(unique_id, "edited constant");
        Ok(())
    }

    pub fn delete_constant(&self, unique_id: &str) -> Result<()> {
        if self.store.constant(unique_id)?.is_none() {
            return Err(Error::ConstantNotFound(unique_id.to_string()));
        }
        self.assert_deletable(EntityKind::Constant, unique_id)?;
        self.store.delete_constant(unique_id)?;
        tracing::info!(unique_id, "deleted constant");
        Ok(())
    }

    // === Guards ===

    /// Reject if anything references the entity, including reports for
    /// calculations
    pub fn assert_deletable(&self, kind: EntityKind, unique_id: &str) -> Result<()> {
        let referrers = self.referrers(kind, unique_id)?;
        if referrers.is_empty() {
            return Ok(());
        }
        tracing::warn!(%kind, unique_id, referrers = referrers.len(), "delete blocked by references");
        Err(Error::Referenced {
            kind,
            unique_id: unique_id.to_string(),
            referrers,
        })
    }

    /// Reject a change of identity fields while the entity is referenced.
    ///
    /// Edits that keep unique id and unit pass without looking at references.
    pub fn assert_identity_editable(
        &self,
        kind: EntityKind,
        unique_id: &str,
        new_fields: &IdentityFields,
    ) -> Result<()> {
        let current = match kind {
            EntityKind::Constant => self
                .store
                .constant(unique_id)?
                .ok_or_else(|| Error::ConstantNotFound(unique_id.to_string()))?
                .identity(),
            EntityKind::Calculation => self.latest(unique_id)?.identity(),
        };

        let Some(field) = current.first_difference(new_fields) else {
            return Ok(());
        };

        let referrers = self.expression_referrers(kind, unique_id)?;
        if referrers.is_empty() {
            return Ok(());
        }
        tracing::warn!(%kind, unique_id, field, "identity edit blocked by references");
        Err(Error::Referenced {
            kind,
            unique_id: unique_id.to_string(),
            referrers,
        })
    }

    /// Everything that blocks deleting the entity: latest calculations
    /// referencing it and, for calculations, reports listing any of its rows
    pub fn referrers(&self, kind: EntityKind, unique_id: &str) -> Result<Vec<Referrer>> {
        let mut referrers = self.expression_referrers(kind, unique_id)?;
        if kind == EntityKind::Calculation {
            referrers.extend(self.report_referrers(unique_id)?);
        }
        Ok(referrers)
    }

    /// Latest calculations whose expression references the entity, except
    /// the target's own revisions
    pub fn expression_referrers(&self, kind: EntityKind, unique_id: &str) -> Result<Vec<Referrer>> {
        let latest = self.store.latest_calculations()?;
        let graph = ReferenceGraph::from_calculations(&latest);

        Ok(graph
            .referrers(&RefKey::new(kind, unique_id))
            .filter(|uid| kind != EntityKind::Calculation || *uid != unique_id)
            .map(|uid| Referrer::Calculation(uid.to_string()))
            .collect())
    }

    fn report_referrers(&self, unique_id: &str) -> Result<Vec<Referrer>> {
        let ids: Vec<RecordId> = self
            .store
            .calculation_history(unique_id)?
            .iter()
            .map(|c| c.id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let reports = self
            .store
            .scan_reports(&|r| ids.iter().any(|&id| r.contains(id)))?;
        Ok(reports.into_iter().map(|r| Referrer::Report(r.name)).collect())
    }

    fn latest(&self, unique_id: &str) -> Result<Calculation> {
        self.store
            .latest_calculation(unique_id)?
            .ok_or_else(|| Error::CalculationNotFound(unique_id.to_string()))
    }

    /// Latest revision for an edit; rows without a latest one mean another
    /// bump is between freeze and insert
    fn latest_for_edit(&self, unique_id: &str) -> Result<Calculation> {
        if let Some(current) = self.store.latest_calculation(unique_id)? {
            return Ok(current);
        }
        let history = self.store.calculation_history(unique_id)?;
        match history.last() {
            Some(newest) => Err(Error::ConcurrencyConflict {
                unique_id: unique_id.to_string(),
                version: newest.version + 1,
            }),
            None => Err(Error::CalculationNotFound(unique_id.to_string())),
        }
    }
}

fn invalid<S: Into<String>>(message: S) -> Error {
    Error::Validation(calcgraph_core::Error::InvalidExpression(message.into()))
}
