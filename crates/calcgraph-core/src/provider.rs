//! Collaborator seams: material data and message translation

use crate::context::FinancialPeriod;
use crate::material::MaterialSheet;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of material sheets for a company and period
pub trait MaterialProvider: Send + Sync {
    /// The sheet, or `None` if no data exists for this scope
    fn cells(
        &self,
        company_id: &str,
        period: &FinancialPeriod,
        material_id: &str,
    ) -> Option<MaterialSheet>;
}

/// In-memory material data
#[derive(Debug, Default, Clone)]
pub struct MemoryMaterials {
    sheets: AHashMap<(String, FinancialPeriod, String), MaterialSheet>,
}

impl MemoryMaterials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet for a company and period
    pub fn insert<S: Into<String>>(
        &mut self,
        company_id: S,
        period: FinancialPeriod,
        sheet: MaterialSheet,
    ) {
        let key = (company_id.into(), period, sheet.material_id.clone());
        self.sheets.insert(key, sheet);
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl MaterialProvider for MemoryMaterials {
    fn cells(
        &self,
        company_id: &str,
        period: &FinancialPeriod,
        material_id: &str,
    ) -> Option<MaterialSheet> {
        self.sheets
            .get(&(company_id.to_string(), *period, material_id.to_string()))
            .cloned()
    }
}

/// Turns reason keys into human-readable text
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Returns keys unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Looks keys up in a message catalog, falling back to the key itself
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogTranslator {
    messages: HashMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(messages: HashMap<String, String>) -> Self {
        Self { messages }
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
