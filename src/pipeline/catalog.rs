//! Stage catalogs per case category
//!
//! A catalog is the ordered list of stages a case of one category moves
//! through. Lookups never fail: an unknown category resolves to the
//! registry's default catalog (`labor` for the built-in registry).

use crate::models::StageDefinition;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use anyhow::Context;

/// Category used when a lookup key is not registered
pub const DEFAULT_CATEGORY: &str = "labor";

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("catalog '{category}' has no stages")]
    Empty { category: String },

    #[error("catalog '{category}' defines stage '{stage}' more than once")]
    DuplicateStage { category: String, stage: String },

    #[error("catalog '{category}' stage orders must be 0..{len} without gaps (found {order})")]
    BrokenOrder { category: String, len: usize, order: u32 },

    #[error("default category '{category}' is not registered")]
    MissingDefault { category: String },
}

/// Ordered, non-empty list of stages for one category
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCatalog {
    category: String,
    stages: Vec<StageDefinition>,
}

impl PipelineCatalog {
    /// Build a catalog, validating ids and orders. Stages are sorted by `order`.
    pub fn new(category: &str, mut stages: Vec<StageDefinition>) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty { category: category.to_string() });
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.id.as_str()) {
                return Err(CatalogError::DuplicateStage {
                    category: category.to_string(),
                    stage: stage.id.clone(),
                });
            }
        }

        stages.sort_by_key(|s| s.order);
        for (idx, stage) in stages.iter().enumerate() {
            if stage.order as usize != idx {
                return Err(CatalogError::BrokenOrder {
                    category: category.to_string(),
                    len: stages.len(),
                    order: stage.order,
                });
            }
        }

        Ok(Self { category: category.to_string(), stages })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; kept for clippy's len-without-is-empty lint
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn first(&self) -> &StageDefinition {
        &self.stages[0]
    }

    pub fn last(&self) -> &StageDefinition {
        &self.stages[self.stages.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&StageDefinition> {
        self.stages.get(index)
    }

    pub fn index_of(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }

    pub fn stage(&self, stage_id: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn contains(&self, stage_id: &str) -> bool {
        self.index_of(stage_id).is_some()
    }
}

/// JSON layout accepted by `CatalogRegistry::from_json_str`
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_category")]
    default: String,
    catalogs: BTreeMap<String, Vec<StageDefinition>>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Category-keyed catalogs with a guaranteed default
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    catalogs: BTreeMap<String, PipelineCatalog>,
    default: String,
}

impl CatalogRegistry {
    pub fn new(catalogs: Vec<PipelineCatalog>, default: &str) -> Result<Self, CatalogError> {
        let catalogs: BTreeMap<String, PipelineCatalog> = catalogs
            .into_iter()
            .map(|c| (c.category.clone(), c))
            .collect();
        if !catalogs.contains_key(default) {
            return Err(CatalogError::MissingDefault { category: default.to_string() });
        }
        Ok(Self { catalogs, default: default.to_string() })
    }

    /// Catalog for `category`, or the default catalog when it is not registered
    pub fn get(&self, category: &str) -> &PipelineCatalog {
        self.catalogs
            .get(category)
            .unwrap_or_else(|| &self.catalogs[&self.default])
    }

    pub fn default_category(&self) -> &str {
        &self.default
    }

    pub fn is_registered(&self, category: &str) -> bool {
        self.catalogs.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(|k| k.as_str())
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .context("Failed to parse catalog JSON")?;
        let mut catalogs = Vec::with_capacity(file.catalogs.len());
        for (category, stages) in file.catalogs {
            catalogs.push(PipelineCatalog::new(&category, stages)?);
        }
        Ok(Self::new(catalogs, &file.default)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let registry = Self::from_json_str(&json)
            .with_context(|| format!("Invalid catalog file: {}", path.display()))?;
        log::info!("loaded {} catalog(s) from {}", registry.catalogs.len(), path.display());
        Ok(registry)
    }

    /// Catalogs shipped with casetrack
    pub fn builtin() -> Self {
        let catalogs = vec![
            labor_catalog(),
            commercial_catalog(),
            civil_catalog(),
            criminal_catalog(),
            family_catalog(),
            real_estate_catalog(),
            administrative_catalog(),
        ];
        Self {
            catalogs: catalogs.into_iter().map(|c| (c.category.clone(), c)).collect(),
            default: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Built-in registry, shared for the process lifetime
pub fn builtin_registry() -> &'static CatalogRegistry {
    static BUILTIN: OnceLock<CatalogRegistry> = OnceLock::new();
    BUILTIN.get_or_init(CatalogRegistry::builtin)
}

/// Look up a built-in catalog, falling back to the labor catalog
pub fn get_catalog(category: &str) -> &'static PipelineCatalog {
    builtin_registry().get(category)
}

// Built-in catalogs are constant data; orders below are contiguous by construction.
fn builtin(category: &str, stages: Vec<StageDefinition>) -> PipelineCatalog {
    PipelineCatalog { category: category.to_string(), stages }
}

fn labor_catalog() -> PipelineCatalog {
    builtin("labor", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("friendly_settlement", "Friendly Settlement", "التسوية الودية", 1)
            .color("cyan").mandatory().can_end().max_days(21),
        StageDefinition::new("labor_court", "Referral to Labor Court", "الإحالة للمحكمة العمالية", 2)
            .color("yellow").max_days(30),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 3).color("magenta").max_days(90),
        StageDefinition::new("judgment", "Judgment", "الحكم", 4).color("green").mandatory().can_end(),
        StageDefinition::new("appeal", "Appeal", "الاستئناف", 5).color("bright_yellow").can_end().max_days(30),
        StageDefinition::new("execution", "Execution", "التنفيذ", 6).color("bright_green").can_end(),
    ])
}

fn commercial_catalog() -> PipelineCatalog {
    builtin("commercial", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("mediation", "Mediation", "الوساطة", 1).color("cyan").can_end().max_days(30),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 2).color("magenta").max_days(120),
        StageDefinition::new("expert_review", "Expert Review", "الخبرة", 3).color("yellow").max_days(60),
        StageDefinition::new("judgment", "Judgment", "الحكم", 4).color("green").mandatory().can_end(),
        StageDefinition::new("appeal", "Appeal", "الاستئناف", 5).color("bright_yellow").can_end().max_days(30),
        StageDefinition::new("execution", "Execution", "التنفيذ", 6).color("bright_green").can_end(),
    ])
}

fn civil_catalog() -> PipelineCatalog {
    builtin("civil", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("notification", "Service of Notice", "التبليغ", 1).color("cyan").max_days(14),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 2).color("magenta").max_days(120),
        StageDefinition::new("judgment", "Judgment", "الحكم", 3).color("green").mandatory().can_end(),
        StageDefinition::new("appeal", "Appeal", "الاستئناف", 4).color("bright_yellow").can_end().max_days(30),
        StageDefinition::new("execution", "Execution", "التنفيذ", 5).color("bright_green").can_end(),
    ])
}

fn criminal_catalog() -> PipelineCatalog {
    builtin("criminal", vec![
        StageDefinition::new("filing", "Complaint Filing", "تقديم البلاغ", 0).color("blue").mandatory(),
        StageDefinition::new("investigation", "Investigation", "التحقيق", 1).color("cyan").mandatory().max_days(60),
        StageDefinition::new("prosecution", "Public Prosecution", "النيابة العامة", 2).color("yellow").can_end(),
        StageDefinition::new("trial", "Trial", "المحاكمة", 3).color("magenta").max_days(180),
        StageDefinition::new("judgment", "Judgment", "الحكم", 4).color("green").mandatory().can_end(),
        StageDefinition::new("appeal", "Appeal", "الاستئناف", 5).color("bright_yellow").can_end().max_days(30),
    ])
}

fn family_catalog() -> PipelineCatalog {
    builtin("family", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("reconciliation", "Reconciliation", "الصلح", 1)
            .color("cyan").mandatory().can_end().max_days(30),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 2).color("magenta").max_days(90),
        StageDefinition::new("judgment", "Judgment", "الحكم", 3).color("green").mandatory().can_end(),
        StageDefinition::new("execution", "Execution", "التنفيذ", 4).color("bright_green").can_end(),
    ])
}

fn real_estate_catalog() -> PipelineCatalog {
    builtin("real_estate", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("inspection", "Site Inspection", "المعاينة", 1).color("cyan").max_days(30),
        StageDefinition::new("expert_review", "Expert Review", "الخبرة", 2).color("yellow").max_days(60),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 3).color("magenta").max_days(120),
        StageDefinition::new("judgment", "Judgment", "الحكم", 4).color("green").mandatory().can_end(),
        StageDefinition::new("execution", "Execution", "التنفيذ", 5).color("bright_green").can_end(),
    ])
}

fn administrative_catalog() -> PipelineCatalog {
    builtin("administrative", vec![
        StageDefinition::new("filing", "Case Filing", "قيد الدعوى", 0).color("blue").mandatory(),
        StageDefinition::new("grievance", "Administrative Grievance", "التظلم الإداري", 1)
            .color("cyan").mandatory().can_end().max_days(60),
        StageDefinition::new("hearing", "Hearings", "الجلسات", 2).color("magenta").max_days(120),
        StageDefinition::new("judgment", "Judgment", "الحكم", 3).color("green").mandatory().can_end(),
        StageDefinition::new("appeal", "Appeal", "الاستئناف", 4).color("bright_yellow").can_end().max_days(30),
    ])
}
