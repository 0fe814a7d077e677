//! The spending-category catalog.
//!
//! The catalog is compiled into the binary and built once at start-up; after
//! that it is only ever borrowed. Whether it actually partitions the codes of a
//! given dataset is decided by `coverage::verify_coverage`.

use std::collections::HashSet;

use crate::domain::{CategoryDefinition, ClassificationCode};
use crate::error::DataError;

/// `(id, name, description, code prefixes)`.
type CategoryRow = (&'static str, &'static str, &'static str, &'static [&'static str]);

const BUILTIN: &[CategoryRow] = &[
    (
        "food",
        "Jídlo",
        "Všechno, co se dá jíst, od chleba až po kaviár.",
        &["011", "012"],
    ),
    (
        "restaurants",
        "Restaurace",
        "Náklady na hotové jídlo z restaurací.",
        &["111"],
    ),
    (
        "alcohol",
        "Alkohol a tabák",
        "Všechny druhy alkoholických nápojů a tabákové výrobky.",
        &["02"],
    ),
    // 04 is split between rent, owner-occupied housing and utilities.
    (
        "housing_rent",
        "Nájem bytu",
        "Náklady na nájem bytu.",
        &["041"],
    ),
    (
        "housing_own",
        "Vlastní bydlení",
        "Náklady na vlastní bydlení, tzv imputovaný nájem.",
        &["042"],
    ),
    (
        "clothing",
        "Oblečení a obuv",
        "Oblečení, obuv a doplňky.",
        &["03"],
    ),
    (
        "housing_utilities",
        "Energie, voda a služby",
        "Obsahuje ceny energií, vody a služeb spojených s bydlením.",
        &["043", "044", "045"],
    ),
    (
        "furniture",
        "Nábytek a vybavení domácnosti",
        "Nábytek, spotřebiče a jiné vybavení domácnosti.",
        &["05"],
    ),
    (
        "health",
        "Zdravotní péče",
        "Léky, zdravotní péče a pomůcky.",
        &["06"],
    ),
    (
        "transport_personal",
        "Osobní doprava",
        "Náklady na osobní dopravu.",
        &["071", "072"],
    ),
    (
        "transport_public",
        "Veřejná doprava",
        "Náklady na veřejnou dopravu.",
        &["073"],
    ),
    (
        "communication",
        "Komunikace",
        "Telekomunikační služby.",
        &["081", "083"],
    ),
    (
        "computers",
        "Výpočetní technika",
        "Mobilní telefony, počítače a jiná elektronika.",
        &["082", "091"],
    ),
    (
        "recreation",
        "Rekreace a kultura",
        "Vstupy do kina, na koncerty, knihy, ale i sportovní vyžití, včetně sportovní výbavy.",
        &["092", "093", "094", "095", "096"],
    ),
    (
        "education",
        "Vzdělávání",
        "Náklady na vzdělání.",
        &["10"],
    ),
    (
        "hotels",
        "Ubytovací služby",
        "Náklady na ubytování v hotelech a podobných ubytovacích zařízeních.",
        &["112"],
    ),
    // The export does not break 12 down any further.
    (
        "miscellaneous",
        "Ostatní výrobky a služby",
        "Všechno ostatní.",
        &["12"],
    ),
];

/// An ordered, read-only list of categories with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<CategoryDefinition>,
}

impl CategoryCatalog {
    pub fn new(categories: Vec<CategoryDefinition>) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.id.as_str()) {
                return Err(DataError::DuplicateCategory {
                    id: category.id.clone(),
                });
            }
        }
        Ok(Self { categories })
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self, DataError> {
        let categories = BUILTIN
            .iter()
            .map(|(id, name, description, prefixes)| CategoryDefinition {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                code_prefixes: prefixes.iter().copied().map(ClassificationCode::from).collect(),
            })
            .collect();
        Self::new(categories)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryDefinition> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Every `(category, prefix)` pair, in catalog order.
    pub fn prefixes(&self) -> impl Iterator<Item = (&CategoryDefinition, &ClassificationCode)> {
        self.categories
            .iter()
            .flat_map(|c| c.code_prefixes.iter().map(move |p| (c, p)))
    }
}

impl<'a> IntoIterator for &'a CategoryCatalog {
    type Item = &'a CategoryDefinition;
    type IntoIter = std::slice::Iter<'a, CategoryDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
