//! Reference entities: projects, counterparties, cash accounts, categories, products.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::*;

macro_rules! impl_named_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identifiable for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }

            impl NamedEntity for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )+
    };
}

/// Construction project that entries are booked against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            address: None,
            start_date: None,
        }
    }
}

/// Vendor that issues expense entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Supplier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact: None,
            email: None,
        }
    }
}

/// Buyer that revenue entries are billed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact: None,
            email: None,
        }
    }
}

/// Bank or cash account that settlements move money through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CashAccount {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

impl CashAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bank: None,
            agency: None,
            account_number: None,
        }
    }
}

impl Displayable for CashAccount {
    fn display_label(&self) -> String {
        match (&self.bank, &self.account_number) {
            (Some(bank), Some(number)) => format!("{} ({} {})", self.name, bank, number),
            (Some(bank), None) => format!("{} ({})", self.name, bank),
            _ => self.name.clone(),
        }
    }
}

/// Classification target for revenue line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevenueCategory {
    pub id: String,
    pub name: String,
}

impl RevenueCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Catalogued material or service bought through expense line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit: UnitOfMeasure,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit: UnitOfMeasure) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit,
        }
    }
}

impl Displayable for Product {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.unit)
    }
}

impl_named_entity!(Project, Supplier, Customer, CashAccount, RevenueCategory, Product);

/// Units of measure used on line items and products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum UnitOfMeasure {
    SquareMeter,
    CubicMeter,
    Kilogram,
    #[default]
    Unit,
    Hour,
    Lump,
    Custom(String),
}

impl UnitOfMeasure {
    pub fn symbol(&self) -> &str {
        match self {
            UnitOfMeasure::SquareMeter => "m²",
            UnitOfMeasure::CubicMeter => "m³",
            UnitOfMeasure::Kilogram => "kg",
            UnitOfMeasure::Unit => "un",
            UnitOfMeasure::Hour => "hr",
            UnitOfMeasure::Lump => "vb",
            UnitOfMeasure::Custom(symbol) => symbol,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "m²" | "m2" => UnitOfMeasure::SquareMeter,
            "m³" | "m3" => UnitOfMeasure::CubicMeter,
            "kg" => UnitOfMeasure::Kilogram,
            "un" | "" => UnitOfMeasure::Unit,
            "hr" | "h" => UnitOfMeasure::Hour,
            "vb" => UnitOfMeasure::Lump,
            other => UnitOfMeasure::Custom(other.to_string()),
        }
    }
}

impl From<String> for UnitOfMeasure {
    fn from(value: String) -> Self {
        UnitOfMeasure::parse(&value)
    }
}

impl From<UnitOfMeasure> for String {
    fn from(value: UnitOfMeasure) -> Self {
        value.symbol().to_string()
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_symbols_roundtrip_through_json() {
        let product = Product::new("prod1", "Brita 1", UnitOfMeasure::CubicMeter);
        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("\"m³\""));
        let decoded: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.unit, UnitOfMeasure::CubicMeter);
    }

    #[test]
    fn unknown_units_are_preserved() {
        assert_eq!(
            UnitOfMeasure::parse("sc"),
            UnitOfMeasure::Custom("sc".into())
        );
        assert_eq!(UnitOfMeasure::parse("m2"), UnitOfMeasure::SquareMeter);
    }

    #[test]
    fn lookup_degrades_to_placeholder() {
        let suppliers = vec![Supplier::new("sup-001", "Casa do Construtor")];
        assert_eq!(name_or_unresolved(&suppliers, "sup-001"), "Casa do Construtor");
        assert_eq!(name_or_unresolved(&suppliers, "sup-999"), UNRESOLVED_LABEL);
    }
}
