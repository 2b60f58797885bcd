use chrono::NaiveDate;
use obra_domain::Money;

use crate::totals::round_money;

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: Money) -> String;
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// Brazilian real: `R$ 1.234,56`, negatives as `-R$ 1.234,56`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrlFormatter;

impl CurrencyFormatter for BrlFormatter {
    fn format_amount(&self, amount: Money) -> String {
        let rounded = round_money(amount);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{:.2}", rounded.abs());
        let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        format!("{sign}R$ {},{fraction}", group_thousands(integer, '.'))
    }
}

/// Plain `CODE 1234.56`, used when the configured currency has no dedicated formatter.
#[derive(Debug, Clone)]
pub struct CodeFormatter {
    pub code: String,
}

impl CurrencyFormatter for CodeFormatter {
    fn format_amount(&self, amount: Money) -> String {
        format!("{} {:.2}", self.code, round_money(amount))
    }
}

pub fn formatter_for(currency: &str) -> Box<dyn CurrencyFormatter> {
    if currency.eq_ignore_ascii_case("BRL") {
        Box::new(BrlFormatter)
    } else {
        Box::new(CodeFormatter {
            code: currency.to_uppercase(),
        })
    }
}

/// `dd/mm/yyyy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrazilianDateFormatter;

impl DateFormatter for BrazilianDateFormatter {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IsoDateFormatter;

impl DateFormatter for IsoDateFormatter {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

pub fn date_formatter_for(locale: &str) -> Box<dyn DateFormatter> {
    if locale.eq_ignore_ascii_case("pt-BR") {
        Box::new(BrazilianDateFormatter)
    } else {
        Box::new(IsoDateFormatter)
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn brl_groups_thousands_with_dots() {
        assert_eq!(BrlFormatter.format_amount(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(BrlFormatter.format_amount(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(BrlFormatter.format_amount(dec!(12)), "R$ 12,00");
    }

    #[test]
    fn brl_prefixes_negative_sign() {
        assert_eq!(BrlFormatter.format_amount(dec!(-150)), "-R$ 150,00");
        assert_eq!(BrlFormatter.format_amount(dec!(-0.001)), "R$ 0,00");
    }

    #[test]
    fn other_currencies_fall_back_to_code() {
        assert_eq!(formatter_for("usd").format_amount(dec!(3.5)), "USD 3.50");
    }

    #[test]
    fn dates_follow_locale() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(date_formatter_for("pt-BR").format_date(date), "09/03/2024");
        assert_eq!(date_formatter_for("en").format_date(date), "2024-03-09");
    }
}
