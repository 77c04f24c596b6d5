//! Persistence seam for calculations, constants and reports
//!
//! [`Store`] is the only way the engine touches persisted data. It is a thin
//! row-level interface; versioning rules live above it. The one atomic
//! primitive it must provide is [`Store::set_latest`], which swaps the latest
//! flag of a row and reports the previous value so callers can detect a lost
//! race.

use crate::calculation::{Calculation, CalculationData, NewCalculationRow, RecordId};
use crate::constant::Constant;
use crate::report::Report;
use ahash::AHashMap;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Result type alias using [`StoreError`]
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`Store`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// (unique_id, version) already exists
    #[error("Calculation '{unique_id}' already has version {version}")]
    DuplicateVersion { unique_id: String, version: u32 },

    #[error("Constant '{0}' already exists")]
    DuplicateConstant(String),

    #[error("Report '{0}' already exists")]
    DuplicateReport(String),

    #[error("Calculation row {0} not found")]
    RowNotFound(RecordId),

    /// Conditional write found the row frozen
    #[error("Calculation row {0} is not the latest revision")]
    RowNotLatest(RecordId),

    #[error("Constant '{0}' not found")]
    ConstantNotFound(String),

    #[error("Report '{0}' not found")]
    ReportNotFound(String),

    /// Backend failure (poisoned lock, lost connection, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Row-level persistence for the engine's entities
pub trait Store: Send + Sync {
    // === Calculations ===

    /// Row by storage id
    fn calculation(&self, id: RecordId) -> StoreResult<Option<Calculation>>;

    /// Row of `unique_id` flagged latest
    fn latest_calculation(&self, unique_id: &str) -> StoreResult<Option<Calculation>>;

    /// Row of `unique_id` with this exact version
    fn calculation_version(&self, unique_id: &str, version: u32)
        -> StoreResult<Option<Calculation>>;

    /// All rows matching `filter`, ordered by storage id
    fn scan_calculations(
        &self,
        filter: &dyn Fn(&Calculation) -> bool,
    ) -> StoreResult<Vec<Calculation>>;

    /// Insert a new row; fails with [`StoreError::DuplicateVersion`] if
    /// (unique_id, version) exists
    fn insert_calculation(&self, row: NewCalculationRow) -> StoreResult<RecordId>;

    /// Atomically set the latest flag, returning its previous value
    fn set_latest(&self, id: RecordId, latest: bool) -> StoreResult<bool>;

    /// Overwrite unit and expression of a row in place, only while it is
    /// flagged latest; fails with [`StoreError::RowNotLatest`] otherwise
    fn update_latest_calculation(&self, id: RecordId, data: CalculationData) -> StoreResult<()>;

    /// Delete every row of `unique_id`; returns the number removed
    fn delete_calculation(&self, unique_id: &str) -> StoreResult<usize>;

    // === Constants ===

    fn constant(&self, unique_id: &str) -> StoreResult<Option<Constant>>;

    fn insert_constant(&self, constant: Constant) -> StoreResult<()>;

    /// Replace the constant stored under `unique_id` (which may rename it)
    fn update_constant(&self, unique_id: &str, constant: Constant) -> StoreResult<()>;

    fn delete_constant(&self, unique_id: &str) -> StoreResult<()>;

    // === Reports ===

    /// All reports matching `filter`
    fn scan_reports(&self, filter: &dyn Fn(&Report) -> bool) -> StoreResult<Vec<Report>>;

    fn report(&self, name: &str) -> StoreResult<Option<Report>>;

    fn insert_report(&self, report: Report) -> StoreResult<()>;

    fn update_report(&self, report: Report) -> StoreResult<()>;

    // === Provided ===

    /// Every row flagged latest
    fn latest_calculations(&self) -> StoreResult<Vec<Calculation>> {
        self.scan_calculations(&|c| c.latest)
    }

    /// All revisions of `unique_id`, oldest first
    fn calculation_history(&self, unique_id: &str) -> StoreResult<Vec<Calculation>> {
        let mut rows = self.scan_calculations(&|c| c.unique_id == unique_id)?;
        rows.sort_by_key(|c| c.version);
        Ok(rows)
    }

    /// Every report
    fn reports(&self) -> StoreResult<Vec<Report>> {
        self.scan_reports(&|_| true)
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    calculations: BTreeMap<RecordId, Calculation>,
    versions: AHashMap<(String, u32), RecordId>,
    constants: BTreeMap<String, Constant>,
    reports: Vec<Report>,
}

/// Thread-safe in-memory [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn calculation(&self, id: RecordId) -> StoreResult<Option<Calculation>> {
        Ok(self.read()?.calculations.get(&id).cloned())
    }

    fn latest_calculation(&self, unique_id: &str) -> StoreResult<Option<Calculation>> {
        Ok(self
            .read()?
            .calculations
            .values()
            .find(|c| c.latest && c.unique_id == unique_id)
            .cloned())
    }

    fn calculation_version(
        &self,
        unique_id: &str,
        version: u32,
    ) -> StoreResult<Option<Calculation>> {
        let inner = self.read()?;
        Ok(inner
            .versions
            .get(&(unique_id.to_string(), version))
            .and_then(|id| inner.calculations.get(id))
            .cloned())
    }

    fn scan_calculations(
        &self,
        filter: &dyn Fn(&Calculation) -> bool,
    ) -> StoreResult<Vec<Calculation>> {
        Ok(self
            .read()?
            .calculations
            .values()
            .filter(|c| filter(*c))
            .cloned()
            .collect())
    }

    fn insert_calculation(&self, row: NewCalculationRow) -> StoreResult<RecordId> {
        let mut inner = self.write()?;
        let key = (row.unique_id.clone(), row.version);
        if inner.versions.contains_key(&key) {
            return Err(StoreError::DuplicateVersion {
                unique_id: row.unique_id,
                version: row.version,
            });
        }
        inner.next_id += 1;
        let id = RecordId(inner.next_id);
        inner.versions.insert(key, id);
        inner.calculations.insert(
            id,
            Calculation {
                id,
                unique_id: row.unique_id,
                version: row.version,
                latest: row.latest,
                unit: row.data.unit,
                expression: row.data.expression,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn set_latest(&self, id: RecordId, latest: bool) -> StoreResult<bool> {
        let mut inner = self.write()?;
        let calc = inner
            .calculations
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound(id))?;
        Ok(std::mem::replace(&mut calc.latest, latest))
    }

    fn update_latest_calculation(&self, id: RecordId, data: CalculationData) -> StoreResult<()> {
        let mut inner = self.write()?;
        let calc = inner
            .calculations
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound(id))?;
        if !calc.latest {
            return Err(StoreError::RowNotLatest(id));
        }
        calc.unit = data.unit;
        calc.expression = data.expression;
        Ok(())
    }

    fn delete_calculation(&self, unique_id: &str) -> StoreResult<usize> {
        let mut inner = self.write()?;
        let before = inner.calculations.len();
        inner.calculations.retain(|_, c| c.unique_id != unique_id);
        inner.versions.retain(|(uid, _), _| uid != unique_id);
        Ok(before - inner.calculations.len())
    }

    fn constant(&self, unique_id: &str) -> StoreResult<Option<Constant>> {
        Ok(self.read()?.constants.get(unique_id).cloned())
    }

    fn insert_constant(&self, constant: Constant) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.constants.contains_key(&constant.unique_id) {
            return Err(StoreError::DuplicateConstant(constant.unique_id));
        }
        inner.constants.insert(constant.unique_id.clone(), constant);
        Ok(())
    }

    fn update_constant(&self, unique_id: &str, constant: Constant) -> StoreResult<()> {
        let mut inner = self.write()?;
        if !inner.constants.contains_key(unique_id) {
            return Err(StoreError::ConstantNotFound(unique_id.to_string()));
        }
        if constant.unique_id != unique_id && inner.constants.contains_key(&constant.unique_id) {
            return Err(StoreError::DuplicateConstant(constant.unique_id));
        }
        inner.constants.remove(unique_id);
        inner.constants.insert(constant.unique_id.clone(), constant);
        Ok(())
    }

    fn delete_constant(&self, unique_id: &str) -> StoreResult<()> {
        self.write()?
            .constants
            .remove(unique_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::ConstantNotFound(unique_id.to_string()))
    }

    fn scan_reports(&self, filter: &dyn Fn(&Report) -> bool) -> StoreResult<Vec<Report>> {
        Ok(self
            .read()?
            .reports
            .iter()
            .filter(|r| filter(*r))
            .cloned()
            .collect())
    }

    fn report(&self, name: &str) -> StoreResult<Option<Report>> {
        Ok(self.read()?.reports.iter().find(|r| r.name == name).cloned())
    }

    fn insert_report(&self, report: Report) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.reports.iter().any(|r| r.name == report.name) {
            return Err(StoreError::DuplicateReport(report.name));
        }
        inner.reports.push(report);
        Ok(())
    }

    fn update_report(&self, report: Report) -> StoreResult<()> {
        let mut inner = self.write()?;
        let slot = inner
            .reports
            .iter_mut()
            .find(|r| r.name == report.name)
            .ok_or_else(|| StoreError::ReportNotFound(report.name.clone()))?;
        *slot = report;
        Ok(())
    }
}
