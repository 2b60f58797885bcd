//! `key=value` argument parsing shared by the command handlers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use obra_core::LineItemDraft;
use obra_domain::{DateRange, Money, UnitOfMeasure};
use rust_decimal::Decimal;

use crate::cli::core::CommandError;

/// Positional words plus `key=value` options; repeated keys keep every value.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    pub positional: Vec<String>,
    options: BTreeMap<String, Vec<String>>,
}

impl ParsedArgs {
    pub fn parse(args: &[&str]) -> Self {
        let mut parsed = ParsedArgs::default();
        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) if !key.is_empty() => parsed
                    .options
                    .entry(key.to_ascii_lowercase())
                    .or_default()
                    .push(value.to_string()),
                _ => parsed.positional.push(arg.to_string()),
            }
        }
        parsed
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.options.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn require(&self, key: &str) -> Result<&str, CommandError> {
        self.get(key)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing `{}=`", key)))
    }

    pub fn positional(&self, index: usize, what: &str) -> Result<&str, CommandError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing {}", what)))
    }

    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, CommandError> {
        self.get(key).map(parse_date).transpose()
    }

    pub fn amount(&self, key: &str) -> Result<Option<Money>, CommandError> {
        self.get(key).map(parse_amount).transpose()
    }

    /// `from=` / `to=` as an inclusive range.
    pub fn range(&self) -> Result<DateRange, CommandError> {
        DateRange::new(self.date("from")?, self.date("to")?)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))
    }

    pub fn flag(&self, key: &str) -> Result<Option<bool>, CommandError> {
        self.get(key).map(|value| parse_flag(key, value)).transpose()
    }
}

/// Accepts `YYYY-MM-DD` or `dd/mm/yyyy`.
pub fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| {
            CommandError::InvalidArguments(format!(
                "invalid date `{}` (use YYYY-MM-DD or DD/MM/YYYY)",
                input
            ))
        })
}

/// Accepts `1234.56`, `1234,56` and `1.234,56`.
pub fn parse_amount(input: &str) -> Result<Decimal, CommandError> {
    let trimmed = input.trim().trim_start_matches("R$").trim();
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<Decimal>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{}`", input)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, CommandError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" | "sim" => Ok(true),
        "no" | "false" | "off" | "0" | "nao" | "não" => Ok(false),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{}=` expects yes or no",
            key
        ))),
    }
}

/// `desc|qty|unit|price|target[|product]`
pub fn parse_item(raw: &str) -> Result<LineItemDraft, CommandError> {
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    if !(5..=6).contains(&parts.len()) {
        return Err(CommandError::InvalidArguments(format!(
            "item `{}` must look like desc|qty|unit|price|target[|product]",
            raw
        )));
    }
    let mut line = LineItemDraft::priced(
        parts[0],
        parse_amount(parts[1])?,
        UnitOfMeasure::parse(parts[2]),
        parse_amount(parts[3])?,
        parts[4],
    );
    if let Some(product) = parts.get(5).filter(|value| !value.is_empty()) {
        line = line.with_product(*product);
    }
    Ok(line)
}

/// `desc|amount|target`
pub fn parse_lump(raw: &str) -> Result<LineItemDraft, CommandError> {
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    let [description, amount, target] = parts.as_slice() else {
        return Err(CommandError::InvalidArguments(format!(
            "lump `{}` must look like desc|amount|target",
            raw
        )));
    };
    Ok(LineItemDraft::lump_sum(
        *description,
        parse_amount(amount)?,
        *target,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn options_and_positionals_are_split() {
        let parsed = ParsedArgs::parse(&["EXP-2024-00001", "amount=10", "item=a", "item=b"]);
        assert_eq!(parsed.positional, vec!["EXP-2024-00001"]);
        assert_eq!(parsed.get("amount"), Some("10"));
        assert_eq!(parsed.all("item").len(), 2);
        assert!(parsed.require("date").is_err());
    }

    #[test]
    fn amounts_accept_brazilian_notation() {
        assert_eq!(parse_amount("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("R$ 10,5").unwrap(), dec!(10.5));
        assert_eq!(parse_amount("99.90").unwrap(), dec!(99.90));
        assert!(parse_amount("dez").is_err());
    }

    #[test]
    fn dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09").unwrap(), expected);
        assert_eq!(parse_date("09/03/2024").unwrap(), expected);
        assert!(parse_date("2024/03/09").is_err());
    }

    #[test]
    fn line_specs_parse() {
        let item = parse_item("Cimento|10|sc|32,50|cc-prod-cimento|prod1").unwrap();
        assert_eq!(item.quantity, Some(dec!(10)));
        assert_eq!(item.unit_price, Some(dec!(32.50)));
        assert_eq!(item.product_id.as_deref(), Some("prod1"));
        let lump = parse_lump("Mão de obra|1500|cc-admin-mo").unwrap();
        assert_eq!(lump.amount, Some(dec!(1500)));
        assert!(parse_lump("only|two").is_err());
    }
}
