//! Unit type catalog loaded from TOML
//!
//! The catalog is the authoritative type registry: its length fixes the
//! valid `UnitTypeId` range every per-type table in the AI is sized by.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ForceError, Result};
use crate::core::types::{Domain, DomainMask, UnitTypeId};
use crate::simulation::UnitTypeInfo;

fn default_domain() -> Domain {
    Domain::Land
}

fn default_can_attack() -> bool {
    true
}

/// Unit type as written in data files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTypeDef {
    pub ident: String,
    #[serde(default = "default_domain")]
    pub domain: Domain,
    /// Defaults to the unit's own domain
    #[serde(default)]
    pub can_target: Option<Vec<Domain>>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_can_attack")]
    pub can_attack: bool,
    #[serde(default)]
    pub force_weight: u32,
}

impl UnitTypeDef {
    pub fn new(ident: &str, domain: Domain) -> Self {
        Self {
            ident: ident.to_string(),
            domain,
            can_target: None,
            priority: 0,
            can_attack: true,
            force_weight: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, force_weight: u32) -> Self {
        self.force_weight = force_weight;
        self
    }

    pub fn with_targets(mut self, targets: &[Domain]) -> Self {
        self.can_target = Some(targets.to_vec());
        self
    }

    pub fn unarmed(mut self) -> Self {
        self.can_attack = false;
        self
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    unit_types: Vec<UnitTypeDef>,
}

/// Registry of all unit types, indexed by `UnitTypeId`
#[derive(Debug, Clone, Default)]
pub struct UnitTypeCatalog {
    types: Vec<UnitTypeInfo>,
    by_ident: AHashMap<String, UnitTypeId>,
}

impl UnitTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, assigning ids in definition order
    pub fn from_defs(defs: impl IntoIterator<Item = UnitTypeDef>) -> Result<Self> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.register(def)?;
        }
        Ok(catalog)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        Self::from_defs(file.unit_types)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn register(&mut self, def: UnitTypeDef) -> Result<UnitTypeId> {
        if self.by_ident.contains_key(&def.ident) {
            return Err(ForceError::DuplicateUnitType(def.ident));
        }
        if self.types.len() > u16::MAX as usize {
            return Err(ForceError::InvalidConfig(format!(
                "too many unit types (limit {})",
                u16::MAX as usize + 1
            )));
        }

        if i32::try_from(def.force_weight).is_err() {
            return Err(ForceError::InvalidConfig(format!(
                "force weight {} of {} exceeds {}",
                def.force_weight,
                def.ident,
                i32::MAX
            )));
        }

        let id = UnitTypeId::new(self.types.len());
        let can_target = match &def.can_target {
            Some(domains) => domains.iter().copied().collect(),
            None => def.domain.mask(),
        };
        self.by_ident.insert(def.ident.clone(), id);
        self.types.push(UnitTypeInfo {
            id,
            ident: def.ident,
            domain: def.domain,
            can_target,
            priority: def.priority,
            can_attack: def.can_attack,
            force_weight: def.force_weight,
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: UnitTypeId) -> Option<&UnitTypeInfo> {
        self.types.get(id.index())
    }

    pub fn id_by_ident(&self, ident: &str) -> Option<UnitTypeId> {
        self.by_ident.get(ident).copied()
    }

    /// Like `id_by_ident`, but an unknown name is an error
    pub fn resolve(&self, ident: &str) -> Result<UnitTypeId> {
        self.id_by_ident(ident)
            .ok_or_else(|| ForceError::UnknownUnitType(ident.to_string()))
    }

    pub fn ident(&self, id: UnitTypeId) -> &str {
        self.get(id).map(|info| info.ident.as_str()).unwrap_or("?")
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitTypeInfo> {
        self.types.iter()
    }
}
