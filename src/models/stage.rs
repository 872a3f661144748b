use serde::{Deserialize, Serialize};

/// One step of a case category's workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    pub name: String,
    pub name_ar: String,
    #[serde(default)]
    pub color: Option<String>,
    pub order: u32,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub can_end: bool,
    #[serde(default)]
    pub max_duration_days: Option<u32>,
}

impl StageDefinition {
    pub fn new(id: &str, name: &str, name_ar: &str, order: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            name_ar: name_ar.to_string(),
            color: None,
            order,
            is_mandatory: false,
            can_end: false,
            max_duration_days: None,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.is_mandatory = true;
        self
    }

    pub fn can_end(mut self) -> Self {
        self.can_end = true;
        self
    }

    pub fn max_days(mut self, days: u32) -> Self {
        self.max_duration_days = Some(days);
        self
    }

    /// Display name for the given locale ("ar" selects the Arabic name)
    pub fn display_name(&self, locale: &str) -> &str {
        if locale == "ar" {
            &self.name_ar
        } else {
            &self.name
        }
    }
}
