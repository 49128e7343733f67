use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity};

pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Unvalidated input for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Normalize and validate. The returned draft has a trimmed name.
    pub fn validate(self) -> DomainResult<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid("category name cannot be empty"));
        }
        if name.chars().count() > MAX_CATEGORY_NAME_LEN {
            return Err(DomainError::invalid(format!(
                "category name cannot exceed {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}

/// Listing order for categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySort {
    /// Newest first (management view).
    #[default]
    Created,
    /// Alphabetical (pickers).
    Name,
}

impl CategorySort {
    pub fn sort(self, categories: &mut [Category]) {
        match self {
            CategorySort::Created => categories.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
            }),
            CategorySort::Name => categories.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

impl core::str::FromStr for CategorySort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "created" => Ok(Self::Created),
            "name" => Ok(Self::Name),
            other => Err(DomainError::invalid(format!(
                "sort must be one of: created, name (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn category(id: i64, name: &str, age_minutes: i64) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn validate_trims_name() {
        let draft = CategoryDraft::new("  Tools  ").validate().unwrap();
        assert_eq!(draft.name, "Tools");
    }

    #[test]
    fn validate_rejects_blank_name() {
        let err = CategoryDraft::new("   ").validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn validate_rejects_overlong_name() {
        let err = CategoryDraft::new("x".repeat(MAX_CATEGORY_NAME_LEN + 1))
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn created_sort_is_newest_first() {
        let mut cats = vec![category(1, "b", 30), category(2, "a", 10), category(3, "c", 20)];
        CategorySort::Created.sort(&mut cats);
        let ids: Vec<i64> = cats.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let mut cats = vec![category(1, "beta", 0), category(2, "Alpha", 0), category(3, "gamma", 0)];
        CategorySort::Name.sort(&mut cats);
        let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn sort_parses_known_values_only() {
        assert_eq!("".parse::<CategorySort>().unwrap(), CategorySort::Created);
        assert_eq!("NAME".parse::<CategorySort>().unwrap(), CategorySort::Name);
        assert!("price".parse::<CategorySort>().is_err());
    }
}
