//! Read-only catalog view with deterministic concrete and pump resolution.
//!
//! Concrete resolution walks an explicit rule table. Scopes are tried in
//! [`SCOPE_FALLBACK_ORDER`]: the first scope that yields any candidate is the
//! only one searched. Inside a scope, products are visited in catalog order and
//! the first one accepted by any of [`RESISTANCE_MATCHERS`] wins.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::domain::product::{Product, ProductId};

const PAVEMENT_MARKER: &str = "pavimento";
const PUMP_CATEGORY_MARKERS: [&str; 2] = ["bombeable", "bomba"];
const PUMP_PRODUCT_MARKERS: [&str; 2] = ["bombeo", "bomba"];
const PAVEMENT_NAME_MARKERS: [&str; 2] = ["pavi", "vial"];
const PAVEMENT_GRADE_PREFIX: &str = "mr";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// CONCRETE products whose category and the requested label contain one another.
    CategoryMatches,
    /// Every CONCRETE product in the catalog.
    AllConcrete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceMatcher {
    /// Normalized name contains the normalized resistance label.
    NameContainsToken,
    /// `MR <n>` grades: name contains `<n>` and a pavement marker.
    PavementGrade,
}

pub const SCOPE_FALLBACK_ORDER: [SearchScope; 2] =
    [SearchScope::CategoryMatches, SearchScope::AllConcrete];

pub const RESISTANCE_MATCHERS: [ResistanceMatcher; 2] =
    [ResistanceMatcher::NameContainsToken, ResistanceMatcher::PavementGrade];

/// Lowercases and strips every whitespace character.
pub fn normalize(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).flat_map(char::to_lowercase).collect()
}

pub fn label_denotes_pump(label: &str) -> bool {
    let label = normalize(label);
    PUMP_CATEGORY_MARKERS.iter().any(|marker| label.contains(marker))
}

pub fn label_is_pavement(label: &str) -> bool {
    normalize(label).contains(PAVEMENT_MARKER)
}

pub fn name_denotes_pump(name: &str) -> bool {
    let name = normalize(name);
    PUMP_PRODUCT_MARKERS.iter().any(|marker| name.contains(marker))
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResolutionKey {
    pub category: String,
    pub resistance: String,
}

impl ResolutionKey {
    pub fn new(category: &str, resistance: &str) -> Self {
        Self { category: normalize(category), resistance: normalize(resistance) }
    }

    fn category_matches(&self, product_category: &str) -> bool {
        let product_category = normalize(product_category);
        if product_category.is_empty() {
            return false;
        }
        product_category.contains(&self.category) || self.category.contains(&product_category)
    }

    fn accepts(&self, matcher: ResistanceMatcher, normalized_name: &str) -> bool {
        match matcher {
            ResistanceMatcher::NameContainsToken => normalized_name.contains(&self.resistance),
            ResistanceMatcher::PavementGrade => {
                let Some(grade) = self.pavement_grade() else {
                    return false;
                };
                normalized_name.contains(grade)
                    && PAVEMENT_NAME_MARKERS.iter().any(|marker| normalized_name.contains(marker))
            }
        }
    }

    fn pavement_grade(&self) -> Option<&str> {
        let grade = self
            .resistance
            .strip_prefix(PAVEMENT_GRADE_PREFIX)?
            .trim_start_matches(|ch: char| !ch.is_ascii_alphanumeric());
        (!grade.is_empty()).then_some(grade)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: String,
    pub is_pavement: bool,
    pub denotes_pump: bool,
}

impl Category {
    fn from_label(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            is_pavement: label_is_pavement(label),
            denotes_pump: label_denotes_pump(label),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl CatalogIndex {
    pub fn new(products: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let categories = products
            .iter()
            .filter(|product| product.is_concrete())
            .filter(|product| {
                let key = normalize(&product.category);
                !key.is_empty() && seen.insert(key)
            })
            .map(|product| Category::from_label(&product.category))
            .collect();

        Self { products, categories }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    /// Distinct CONCRETE categories in catalog order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn first_category(&self) -> Option<&str> {
        self.categories.first().map(|category| category.label.as_str())
    }

    pub fn category(&self, label: &str) -> Option<&Category> {
        let key = normalize(label);
        self.categories.iter().find(|category| normalize(&category.label) == key)
    }

    /// Uses the flag computed at index build time, falling back to the label itself.
    pub fn is_pavement(&self, label: &str) -> bool {
        self.category(label).map_or_else(|| label_is_pavement(label), |c| c.is_pavement)
    }

    pub fn denotes_pump(&self, label: &str) -> bool {
        self.category(label).map_or_else(|| label_denotes_pump(label), |c| c.denotes_pump)
    }

    pub fn resolve_concrete_product(&self, category: &str, resistance: &str) -> Option<&Product> {
        self.resolve_concrete_with_scope(&ResolutionKey::new(category, resistance))
            .map(|(product, _)| product)
    }

    /// Like [`Self::resolve_concrete_product`] but also reports which scope answered.
    pub fn resolve_concrete_with_scope(
        &self,
        key: &ResolutionKey,
    ) -> Option<(&Product, SearchScope)> {
        if key.resistance.is_empty() {
            return None;
        }

        for scope in SCOPE_FALLBACK_ORDER {
            let mut candidates = self
                .products
                .iter()
                .filter(|product| product.is_concrete())
                .filter(|product| match scope {
                    SearchScope::CategoryMatches => key.category_matches(&product.category),
                    SearchScope::AllConcrete => true,
                })
                .peekable();

            if candidates.peek().is_none() {
                continue;
            }

            return candidates
                .find(|product| {
                    let name = normalize(&product.name);
                    RESISTANCE_MATCHERS.iter().any(|matcher| key.accepts(*matcher, &name))
                })
                .map(|product| (product, scope));
        }

        None
    }

    /// First non-concrete product whose name mentions pumping.
    pub fn resolve_pump_product(&self) -> Option<&Product> {
        self.products
            .iter()
            .filter(|product| !product.is_concrete())
            .find(|product| name_denotes_pump(&product.name))
    }

    /// Resolution outcome for every known category crossed with `resistances`.
    pub fn resolution_table(
        &self,
        resistances: &[&str],
    ) -> BTreeMap<ResolutionKey, Option<ProductId>> {
        self.categories
            .iter()
            .flat_map(|category| {
                resistances.iter().map(move |resistance| {
                    ResolutionKey::new(&category.label, resistance)
                })
            })
            .map(|key| {
                let resolved =
                    self.resolve_concrete_with_scope(&key).map(|(product, _)| product.id.clone());
                (key, resolved)
            })
            .collect()
    }
}
