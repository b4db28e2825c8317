//! Financing policy per property category.
//!
//! Thresholds are policy constants, not derived values. `RuleCatalog::standard()` carries the
//! institution's published table; narrower catalogs can be built for alternative products.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::domain::{DocumentKey, PropertyType, UnknownPropertyType};

/// Ceiling on (current debt + projected installment) / monthly income.
pub const DEBT_TO_INCOME_CEILING: Decimal = dec!(0.50);
pub const MINIMUM_EMPLOYMENT_YEARS: u32 = 1;
pub const MIN_TERM_YEARS: u32 = 1;
pub const MAX_TERM_YEARS: u32 = 30;

pub const FIRST_HOME_POLICY: CategoryPolicy = CategoryPolicy {
    rate_range: RateRange {
        min_rate: dec!(3.5),
        max_rate: dec!(5.0),
    },
    max_loan_to_value: dec!(0.80),
};

pub const SECOND_HOME_POLICY: CategoryPolicy = CategoryPolicy {
    rate_range: RateRange {
        min_rate: dec!(4.0),
        max_rate: dec!(6.0),
    },
    max_loan_to_value: dec!(0.70),
};

pub const COMMERCIAL_POLICY: CategoryPolicy = CategoryPolicy {
    rate_range: RateRange {
        min_rate: dec!(5.0),
        max_rate: dec!(7.0),
    },
    max_loan_to_value: dec!(0.60),
};

pub const RENOVATION_POLICY: CategoryPolicy = CategoryPolicy {
    rate_range: RateRange {
        min_rate: dec!(4.5),
        max_rate: dec!(6.0),
    },
    max_loan_to_value: dec!(0.50),
};

/// Inclusive annual percentage band offered for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRange {
    pub min_rate: Decimal,
    pub max_rate: Decimal,
}

impl RateRange {
    pub fn contains(&self, rate: Decimal) -> bool {
        rate >= self.min_rate && rate <= self.max_rate
    }
}

impl fmt::Display for RateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% - {}%", self.min_rate, self.max_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPolicy {
    pub rate_range: RateRange,
    pub max_loan_to_value: Decimal,
}

/// Immutable policy table shared by intake validation and the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCatalog {
    categories: BTreeMap<PropertyType, CategoryPolicy>,
    debt_to_income_ceiling: Decimal,
    minimum_employment_years: u32,
    required_documents: Vec<DocumentKey>,
}

impl RuleCatalog {
    pub fn standard() -> Self {
        Self::with_categories([
            (PropertyType::FirstHome, FIRST_HOME_POLICY),
            (PropertyType::SecondHome, SECOND_HOME_POLICY),
            (PropertyType::Commercial, COMMERCIAL_POLICY),
            (PropertyType::Renovation, RENOVATION_POLICY),
        ])
    }

    /// Catalog offering only the given categories, with the standard underwriting thresholds.
    pub fn with_categories(
        categories: impl IntoIterator<Item = (PropertyType, CategoryPolicy)>,
    ) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            debt_to_income_ceiling: DEBT_TO_INCOME_CEILING,
            minimum_employment_years: MINIMUM_EMPLOYMENT_YEARS,
            required_documents: DocumentKey::REQUIRED.to_vec(),
        }
    }

    pub fn policy_for(
        &self,
        property_type: PropertyType,
    ) -> Result<&CategoryPolicy, UnknownPropertyType> {
        self.categories
            .get(&property_type)
            .ok_or_else(|| UnknownPropertyType(property_type.code().to_string()))
    }

    pub fn range_for(&self, property_type: PropertyType) -> Result<RateRange, UnknownPropertyType> {
        self.policy_for(property_type).map(|policy| policy.rate_range)
    }

    /// Same as [`RuleCatalog::range_for`] for a raw category code from the wire.
    pub fn range_for_code(&self, code: &str) -> Result<RateRange, UnknownPropertyType> {
        self.range_for(code.parse()?)
    }

    pub fn debt_to_income_ceiling(&self) -> Decimal {
        self.debt_to_income_ceiling
    }

    pub fn minimum_employment_years(&self) -> u32 {
        self.minimum_employment_years
    }

    pub fn required_documents(&self) -> &[DocumentKey] {
        &self.required_documents
    }

    pub fn categories(&self) -> impl Iterator<Item = (PropertyType, &CategoryPolicy)> {
        self.categories
            .iter()
            .map(|(property_type, policy)| (*property_type, policy))
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_publishes_rate_ranges() {
        let catalog = RuleCatalog::standard();

        let first_home = catalog
            .range_for(PropertyType::FirstHome)
            .expect("first home offered");
        assert_eq!(first_home.min_rate, dec!(3.5));
        assert_eq!(first_home.max_rate, dec!(5.0));

        let commercial = catalog
            .range_for_code("COMMERCIAL")
            .expect("commercial offered");
        assert!(commercial.contains(dec!(7.0)));
        assert!(!commercial.contains(dec!(4.9)));
    }

    #[test]
    fn loan_to_value_is_stricter_outside_first_home() {
        let catalog = RuleCatalog::standard();
        let first_home = catalog
            .policy_for(PropertyType::FirstHome)
            .expect("first home offered")
            .max_loan_to_value;

        for property_type in [
            PropertyType::SecondHome,
            PropertyType::Commercial,
            PropertyType::Renovation,
        ] {
            let policy = catalog.policy_for(property_type).expect("category offered");
            assert!(policy.max_loan_to_value < first_home);
        }
    }

    #[test]
    fn unknown_codes_and_missing_categories_are_rejected() {
        let catalog = RuleCatalog::with_categories([(PropertyType::FirstHome, FIRST_HOME_POLICY)]);

        assert_eq!(
            catalog.range_for_code("YACHT"),
            Err(UnknownPropertyType("YACHT".to_string()))
        );
        assert_eq!(
            catalog.range_for(PropertyType::Renovation),
            Err(UnknownPropertyType("RENOVATION".to_string()))
        );
        assert_eq!(catalog.required_documents(), &DocumentKey::REQUIRED);
    }
}
