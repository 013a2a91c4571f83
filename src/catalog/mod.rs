mod browse;
mod parser;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use browse::{CategorySummary, SortKey, find_category, search_calculators, search_categories};
pub use parser::{parse_catalog, slugify};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.txt");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("line {line}: calculator `{name}` appears before any CATEGORY line")]
    EntryOutsideCategory { line: usize, name: String },
    #[error("line {line}: sub-category `{name}` appears before any CATEGORY line")]
    SubcategoryOutsideCategory { line: usize, name: String },
    #[error("line {line}: {kind} name is empty")]
    EmptyName { line: usize, kind: &'static str },
    #[error("line {line}: category `{name}` is declared twice")]
    DuplicateCategory { line: usize, name: String },
    #[error("line {line}: calculator slug `{slug}` already used on line {first_line}")]
    DuplicateCalculator {
        line: usize,
        slug: String,
        first_line: usize,
    },
    #[error("cannot read catalog {path}: {reason}")]
    Io { path: String, reason: String },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<&'static str>,
    pub popular: bool,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,
    pub slug: String,
    pub calculators: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub description: &'static str,
    pub icon: &'static str,
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.subcategories.iter().flat_map(|s| s.calculators.iter())
    }

    pub fn calculator_count(&self) -> usize {
        self.subcategories.iter().map(|s| s.calculators.len()).sum()
    }

    pub fn popular_count(&self) -> usize {
        self.entries().filter(|e| e.popular).count()
    }

    /// Union of the tags of every calculator in the category.
    pub fn tags(&self) -> BTreeSet<&'static str> {
        self.entries().flat_map(|e| e.tags.iter().copied()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        parse_catalog(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        parse_catalog(&text)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.categories.iter().flat_map(Category::entries)
    }

    pub fn calculator_count(&self) -> usize {
        self.categories.iter().map(Category::calculator_count).sum()
    }
}
