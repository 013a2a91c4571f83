use std::str::FromStr;

use serde::Serialize;

use super::{Catalog, CatalogEntry, Category};

/// Category ordering. Parsed with `FromStr`, which accepts kebab, snake and
/// camel case spellings plus a few short aliases.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Alphabetical,
    MostCalculators,
    MostPopular,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "alphabetical" | "name" | "alpha" => Ok(SortKey::Alphabetical),
            "most-calculators" | "most_calculators" | "mostcalculators" | "count" => {
                Ok(SortKey::MostCalculators)
            }
            "most-popular" | "most_popular" | "mostpopular" | "popular" => Ok(SortKey::MostPopular),
            other => Err(format!(
                "unknown sort `{other}`; expected alphabetical, most-calculators or most-popular"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub slug: String,
    pub description: &'static str,
    pub icon: &'static str,
    pub calculator_count: usize,
    pub popular_count: usize,
    pub subcategories: Vec<String>,
    pub tags: Vec<&'static str>,
}

impl CategorySummary {
    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description,
            icon: category.icon,
            calculator_count: category.calculator_count(),
            popular_count: category.popular_count(),
            subcategories: category.subcategories.iter().map(|s| s.name.clone()).collect(),
            tags: category.tags().into_iter().collect(),
        }
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn category_matches(category: &Category, needle: &str) -> bool {
    contains(&category.name, needle)
        || contains(category.description, needle)
        || category.tags().iter().any(|t| contains(t, needle))
        || category.subcategories.iter().any(|s| contains(&s.name, needle))
}

/// Filter categories by a free-text query and order them. A blank query
/// keeps every category; no match yields an empty list.
pub fn search_categories(catalog: &Catalog, query: &str, sort: SortKey) -> Vec<CategorySummary> {
    let needle = normalize(query);
    let mut matches: Vec<CategorySummary> = catalog
        .categories
        .iter()
        .filter(|c| needle.is_empty() || category_matches(c, &needle))
        .map(CategorySummary::from_category)
        .collect();

    // sort_by is stable, so ties keep catalog order.
    match sort {
        SortKey::Alphabetical => matches.sort_by_key(|c| c.name.to_lowercase()),
        SortKey::MostCalculators => {
            matches.sort_by(|a, b| b.calculator_count.cmp(&a.calculator_count))
        }
        SortKey::MostPopular => matches.sort_by(|a, b| b.popular_count.cmp(&a.popular_count)),
    }
    matches
}

pub fn search_calculators<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a CatalogEntry> {
    let needle = normalize(query);
    catalog
        .entries()
        .filter(|e| {
            needle.is_empty()
                || contains(&e.name, &needle)
                || e.tags.iter().any(|t| contains(t, &needle))
                || contains(&e.category, &needle)
                || contains(&e.subcategory, &needle)
        })
        .collect()
}

pub fn find_category<'a>(catalog: &'a Catalog, slug: &str) -> Option<&'a Category> {
    catalog.categories.iter().find(|c| c.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const SAMPLE: &str = "\
CATEGORY: Sports
NFL Passer Rating *
Running Pace *

CATEGORY: automotive
Tire Life *
Fuel Cost
Car Depreciation

CATEGORY: Pets
Pet Boarding Cost
Dog Food Cost

CATEGORY: Financial
Sub-category: Mortgages
Mortgage Payment *
Mortgage Affordability *
Sub-category: Taxes
Sales Tax
";

    fn catalog() -> Catalog {
        parse_catalog(SAMPLE).expect("valid sample")
    }

    fn slugs(summaries: &[CategorySummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.slug.as_str()).collect()
    }

    #[test]
    fn alphabetical_ignores_case() {
        let result = search_categories(&catalog(), "", SortKey::Alphabetical);
        assert_eq!(slugs(&result), vec!["automotive", "financial", "pets", "sports"]);
    }

    #[test]
    fn most_calculators_is_non_increasing_and_stable() {
        let result = search_categories(&catalog(), "  ", SortKey::MostCalculators);
        // automotive and financial both have 3; automotive comes first in the file
        assert_eq!(slugs(&result), vec!["automotive", "financial", "sports", "pets"]);
        for pair in result.windows(2) {
            assert!(pair[0].calculator_count >= pair[1].calculator_count);
        }
    }

    #[test]
    fn most_popular_orders_by_popular_count() {
        let result = search_categories(&catalog(), "", SortKey::MostPopular);
        assert_eq!(slugs(&result), vec!["sports", "financial", "automotive", "pets"]);
    }

    #[test]
    fn query_matches_description_tags_and_subcategories() {
        assert_eq!(
            slugs(&search_categories(&catalog(), "PETS", SortKey::Alphabetical)),
            vec!["pets"]
        );
        assert_eq!(
            slugs(&search_categories(&catalog(), "football", SortKey::Alphabetical)),
            vec!["sports"]
        );
        assert_eq!(
            slugs(&search_categories(&catalog(), "taxes", SortKey::Alphabetical)),
            vec!["financial"]
        );
    }

    #[test]
    fn no_match_is_empty_not_error() {
        assert!(search_categories(&catalog(), "zzz-nothing", SortKey::MostPopular).is_empty());
        assert!(search_calculators(&catalog(), "zzz-nothing").is_empty());
    }

    #[test]
    fn calculator_search_covers_name_tags_and_category() {
        let catalog = catalog();
        let names: Vec<&str> = search_calculators(&catalog, "mortgage")
            .iter()
            .map(|e| e.slug.as_str())
            .collect();
        assert_eq!(names, vec!["mortgage-payment", "mortgage-affordability"]);

        let by_category = search_calculators(&catalog, "automotive");
        assert_eq!(by_category.len(), 3);
    }

    #[test]
    fn find_category_by_slug() {
        let catalog = catalog();
        assert_eq!(
            find_category(&catalog, "pets").map(|c| c.calculator_count()),
            Some(2)
        );
        assert!(find_category(&catalog, "gardening").is_none());
    }

    #[test]
    fn sort_key_parses_common_spellings() {
        assert_eq!("most-calculators".parse::<SortKey>(), Ok(SortKey::MostCalculators));
        assert_eq!("Most_Popular".parse::<SortKey>(), Ok(SortKey::MostPopular));
        assert_eq!("".parse::<SortKey>(), Ok(SortKey::Alphabetical));
        assert_eq!("mostCalculators".parse::<SortKey>(), Ok(SortKey::MostCalculators));
        assert!("newest".parse::<SortKey>().is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_filtered_results_keep_sort_order(query in "[a-z]{0,3}") {
            let catalog = catalog();
            let all = search_categories(&catalog, "", SortKey::MostCalculators);
            let filtered = search_categories(&catalog, &query, SortKey::MostCalculators);
            prop_assert!(filtered.len() <= all.len());
            for pair in filtered.windows(2) {
                prop_assert!(pair[0].calculator_count >= pair[1].calculator_count);
            }
            // filtering then sorting equals sorting then filtering
            let expected: Vec<&str> = all
                .iter()
                .filter(|s| filtered.iter().any(|f| f.slug == s.slug))
                .map(|s| s.slug.as_str())
                .collect();
            prop_assert_eq!(slugs(&filtered), expected);
        }
    }
}
