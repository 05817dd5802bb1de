use std::collections::HashSet;

use async_trait::async_trait;

use crate::{error::CatalogLoadError, models::DoctorType};

pub const DEFAULT_DOCTOR_TYPES: &[&str] = &[
    "General Physician",
    "Cardiologist",
    "Neurologist",
    "Gastroenterologist",
    "Dermatologist",
    "Orthopedist",
];

/// Source of the specialties a patient can pick from.
///
/// Failable so a remote lookup can stand in for the static list later.
#[async_trait]
pub trait DoctorTypeCatalog: Send + Sync {
    async fn doctor_types(&self) -> Result<Vec<DoctorType>, CatalogLoadError>;
}

/// Fixed, ordered, duplicate-free list held in memory.
#[derive(Debug, Clone)]
pub struct StaticDoctorTypeCatalog {
    entries: Vec<DoctorType>,
}

impl StaticDoctorTypeCatalog {
    pub fn new() -> Self {
        Self {
            entries: DEFAULT_DOCTOR_TYPES.iter().map(|n| DoctorType::new(*n)).collect(),
        }
    }

    /// Build a catalog from configured names, keeping their order.
    /// Names are trimmed; blank names are skipped.
    pub fn from_names<I, S>(names: I) -> Result<Self, CatalogLoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(CatalogLoadError::Duplicate(name.to_string()));
            }
            entries.push(DoctorType::new(name));
        }

        if entries.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        Ok(Self { entries })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

impl Default for StaticDoctorTypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DoctorTypeCatalog for StaticDoctorTypeCatalog {
    async fn doctor_types(&self) -> Result<Vec<DoctorType>, CatalogLoadError> {
        Ok(self.entries.clone())
    }
}
