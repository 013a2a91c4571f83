use std::collections::HashMap;

use tracing::debug;

use super::{Catalog, CatalogEntry, CatalogError, Category, Difficulty, Subcategory};

const IMPLICIT_SUBCATEGORY: &str = "General";
const POPULAR_MARKER: char = '*';

/// Whole-word keyword to tag. Several keywords may map to one tag.
const TAG_KEYWORDS: &[(&str, &str)] = &[
    ("mortgage", "mortgage"),
    ("refinance", "mortgage"),
    ("amortization", "loan"),
    ("loan", "loan"),
    ("payoff", "loan"),
    ("interest", "interest"),
    ("savings", "savings"),
    ("retirement", "retirement"),
    ("investment", "investing"),
    ("return", "investing"),
    ("yield", "investing"),
    ("tax", "tax"),
    ("gains", "tax"),
    ("home", "housing"),
    ("rent", "housing"),
    ("rental", "housing"),
    ("market", "housing"),
    ("closing", "housing"),
    ("affordability", "budget"),
    ("cost", "budget"),
    ("costs", "budget"),
    ("price", "budget"),
    ("pet", "pets"),
    ("dog", "pets"),
    ("cat", "pets"),
    ("boarding", "pets"),
    ("tire", "car"),
    ("car", "car"),
    ("auto", "car"),
    ("fuel", "car"),
    ("oil", "car"),
    ("nfl", "football"),
    ("football", "football"),
    ("passer", "football"),
    ("running", "running"),
    ("pace", "running"),
    ("marathon", "running"),
    ("bmi", "health"),
    ("calorie", "health"),
    ("protein", "nutrition"),
    ("water", "nutrition"),
    ("food", "nutrition"),
    ("age", "time"),
    ("date", "time"),
    ("days", "time"),
    ("time", "time"),
    ("percentage", "math"),
    ("unit", "math"),
];

/// Checked top to bottom; the first level with a matching keyword wins.
const DIFFICULTY_KEYWORDS: &[(Difficulty, &[&str])] = &[
    (
        Difficulty::Advanced,
        &["amortization", "affordability", "refinance", "retirement", "depreciation", "capital"],
    ),
    (
        Difficulty::Intermediate,
        &["mortgage", "loan", "interest", "investment", "tax", "rating", "yield", "proceeds"],
    ),
];

struct CategoryInfo {
    keywords: &'static [&'static str],
    icon: &'static str,
    description: &'static str,
}

const CATEGORY_INFO: &[CategoryInfo] = &[
    CategoryInfo {
        keywords: &["financial", "finance", "money"],
        icon: "piggy-bank",
        description: "Loans, savings, investing and taxes.",
    },
    CategoryInfo {
        keywords: &["real", "estate", "housing", "property"],
        icon: "house",
        description: "Buying, selling and renting property.",
    },
    CategoryInfo {
        keywords: &["pets", "pet", "animals"],
        icon: "paw",
        description: "Costs and care for dogs, cats and other pets.",
    },
    CategoryInfo {
        keywords: &["automotive", "auto", "cars", "vehicles"],
        icon: "car",
        description: "Running costs and maintenance for your vehicle.",
    },
    CategoryInfo {
        keywords: &["sports", "sport", "athletics"],
        icon: "trophy",
        description: "Stats and performance numbers for athletes and fans.",
    },
    CategoryInfo {
        keywords: &["health", "fitness", "wellness"],
        icon: "heart-pulse",
        description: "Body measurements, nutrition and exercise.",
    },
    CategoryInfo {
        keywords: &["math", "everyday"],
        icon: "sigma",
        description: "Quick everyday arithmetic.",
    },
];

const GENERIC_ICON: &str = "calculator";
const GENERIC_DESCRIPTION: &str = "Assorted calculators.";

enum LineKind<'a> {
    Category(&'a str),
    Subcategory(&'a str),
    Calculator(&'a str),
}

fn classify_line(line: &str) -> LineKind<'_> {
    if let Some((head, rest)) = line.split_once(':') {
        match head.trim().to_ascii_lowercase().as_str() {
            "category" => return LineKind::Category(rest.trim()),
            "sub-category" | "subcategory" => return LineKind::Subcategory(rest.trim()),
            _ => {}
        }
    }
    LineKind::Calculator(line)
}

/// Lowercase ASCII slug. `&` reads as "and"; any other run of
/// non-alphanumerics becomes one `-`.
pub fn slugify(name: &str) -> String {
    let expanded = name.replace('&', " and ");
    let mut slug = String::with_capacity(expanded.len());
    let mut pending_dash = false;
    for ch in expanded.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

fn tags_for(name: &str) -> Vec<&'static str> {
    let words = words(name);
    let mut tags: Vec<&'static str> = Vec::new();
    for &(keyword, tag) in TAG_KEYWORDS {
        if words.iter().any(|w| w == keyword) && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.sort_unstable();
    tags
}

fn difficulty_for(name: &str) -> Difficulty {
    let words = words(name);
    DIFFICULTY_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map(|(level, _)| *level)
        .unwrap_or(Difficulty::Basic)
}

fn category_info(name: &str) -> (&'static str, &'static str) {
    let words = words(name);
    CATEGORY_INFO
        .iter()
        .find(|info| words.iter().any(|w| info.keywords.contains(&w.as_str())))
        .map(|info| (info.icon, info.description))
        .unwrap_or((GENERIC_ICON, GENERIC_DESCRIPTION))
}

fn new_subcategory(name: &str) -> Subcategory {
    Subcategory {
        name: name.to_string(),
        slug: slugify(name),
        calculators: Vec::new(),
    }
}

// A repeated sub-category continues the earlier group in place.
fn subcategory_index(category: &mut Category, name: &str, slug: &str) -> usize {
    match category.subcategories.iter().position(|s| s.slug == slug) {
        Some(pos) => pos,
        None => {
            category.subcategories.push(new_subcategory(name));
            category.subcategories.len() - 1
        }
    }
}

pub fn parse_catalog(text: &str) -> Result<Catalog, CatalogError> {
    let mut categories: Vec<Category> = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    // Index of the sub-category new entries go into, within the last category.
    let mut current: Option<usize> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match classify_line(line) {
            LineKind::Category(name) => {
                let slug = slugify(name);
                if slug.is_empty() {
                    return Err(CatalogError::EmptyName {
                        line: line_no,
                        kind: "category",
                    });
                }
                if categories.iter().any(|c| c.slug == slug) {
                    return Err(CatalogError::DuplicateCategory {
                        line: line_no,
                        name: name.to_string(),
                    });
                }
                let (icon, description) = category_info(name);
                categories.push(Category {
                    name: name.to_string(),
                    slug,
                    description,
                    icon,
                    subcategories: Vec::new(),
                });
                current = None;
            }
            LineKind::Subcategory(name) => {
                let Some(category) = categories.last_mut() else {
                    return Err(CatalogError::SubcategoryOutsideCategory {
                        line: line_no,
                        name: name.to_string(),
                    });
                };
                let slug = slugify(name);
                if slug.is_empty() {
                    return Err(CatalogError::EmptyName {
                        line: line_no,
                        kind: "sub-category",
                    });
                }
                current = Some(subcategory_index(category, name, &slug));
            }
            LineKind::Calculator(line) => {
                let (name, popular) = match line.strip_suffix(POPULAR_MARKER) {
                    Some(rest) => (rest.trim_end(), true),
                    None => (line, false),
                };
                let Some(category) = categories.last_mut() else {
                    return Err(CatalogError::EntryOutsideCategory {
                        line: line_no,
                        name: name.to_string(),
                    });
                };
                let slug = slugify(name);
                if slug.is_empty() {
                    return Err(CatalogError::EmptyName {
                        line: line_no,
                        kind: "calculator",
                    });
                }
                if let Some(first_line) = first_seen.get(&slug) {
                    return Err(CatalogError::DuplicateCalculator {
                        line: line_no,
                        slug,
                        first_line: *first_line,
                    });
                }
                first_seen.insert(slug.clone(), line_no);

                let index = match current {
                    Some(index) => index,
                    None => {
                        let index = subcategory_index(
                            category,
                            IMPLICIT_SUBCATEGORY,
                            &slugify(IMPLICIT_SUBCATEGORY),
                        );
                        current = Some(index);
                        index
                    }
                };
                let category_name = category.name.clone();
                let Some(subcategory) = category.subcategories.get_mut(index) else {
                    continue;
                };
                subcategory.calculators.push(CatalogEntry {
                    name: name.to_string(),
                    slug,
                    category: category_name,
                    subcategory: subcategory.name.clone(),
                    tags: tags_for(name),
                    popular,
                    difficulty: difficulty_for(name),
                });
            }
        }
    }

    let catalog = Catalog { categories };
    debug!(
        categories = catalog.categories.len(),
        calculators = catalog.calculator_count(),
        "catalog parsed"
    );
    Ok(catalog)
}
