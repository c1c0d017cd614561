//! Monetary rollup and currency presentation.
//!
//! All currency arithmetic runs on [`rust_decimal::Decimal`]. Inputs from
//! optional columns are normalized to zero at the boundary instead of being
//! branched on at every display site.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pricing breakdown of an order. The `total` is always derived, never
/// accepted from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Build totals from the component amounts, deriving
    /// `total = subtotal + shipping_cost + tax - discount`.
    pub fn compute(
        subtotal: Decimal,
        shipping_cost: Option<Decimal>,
        tax: Option<Decimal>,
        discount: Option<Decimal>,
    ) -> Self {
        let shipping_cost = normalize(shipping_cost);
        let tax = normalize(tax);
        let discount = normalize(discount);
        Self {
            subtotal,
            shipping_cost,
            tax,
            discount,
            total: subtotal + shipping_cost + tax - discount,
        }
    }
}

/// Absent monetary values count as zero.
pub fn normalize(amount: Option<Decimal>) -> Decimal {
    amount.unwrap_or(Decimal::ZERO)
}

/// One rendered line of the pricing breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: Decimal,
    pub formatted: String,
}

/// Currency presentation settings. The default matches the Indonesian
/// Rupiah convention: whole units only, '.' as the thousands separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub code: String,
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub decimal_places: u32,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            code: "IDR".to_string(),
            symbol: "Rp".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
            decimal_places: 0,
        }
    }
}

impl CurrencyFormat {
    /// Render an amount as `{symbol} {grouped integer}[{sep}{fraction}]`.
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp(self.decimal_places);
        let negative = rounded.is_sign_negative();
        let unsigned = rounded.abs();

        let as_text = format!("{:.*}", self.decimal_places as usize, unsigned);
        let (int_part, frac_part) = match as_text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (as_text.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        let digits = int_part.as_bytes();
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(*digit as char);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push(' ');
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out
    }

    /// Breakdown lines for display. Subtotal, shipping and total always
    /// appear; tax and discount only when strictly positive. Zero-valued tax
    /// and discount remain valid stored data, they are just not rendered.
    pub fn breakdown(&self, totals: &OrderTotals) -> Vec<BreakdownLine> {
        let mut lines = vec![
            self.line("Subtotal", totals.subtotal),
            self.line("Shipping", totals.shipping_cost),
        ];
        if totals.tax > Decimal::ZERO {
            lines.push(self.line("Tax", totals.tax));
        }
        if totals.discount > Decimal::ZERO {
            lines.push(self.line("Discount", -totals.discount));
        }
        lines.push(self.line("Total", totals.total));
        lines
    }

    fn line(&self, label: &str, amount: Decimal) -> BreakdownLine {
        BreakdownLine {
            label: label.to_string(),
            amount,
            formatted: self.format(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn compute_derives_total() {
        let totals = OrderTotals::compute(
            dec!(100000),
            Some(dec!(10000)),
            Some(dec!(5000)),
            Some(dec!(2000)),
        );
        assert_eq!(totals.total, dec!(113000));
    }

    #[test]
    fn missing_components_count_as_zero() {
        let totals = OrderTotals::compute(dec!(100000), None, None, None);
        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.total, dec!(100000));
    }

    #[test]
    fn idr_formatting_groups_thousands_without_fraction() {
        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format(dec!(110000)), "Rp 110.000");
        assert_eq!(fmt.format(dec!(1500000)), "Rp 1.500.000");
        assert_eq!(fmt.format(dec!(0)), "Rp 0");
        assert_eq!(fmt.format(dec!(999)), "Rp 999");
    }

    #[test]
    fn fractional_currency_renders_decimal_places() {
        let fmt = CurrencyFormat {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
            decimal_places: 2,
        };
        assert_eq!(fmt.format(dec!(1234.5)), "$ 1,234.50");
        assert_eq!(fmt.format(dec!(-20)), "-$ 20.00");
    }

    #[test]
    fn zero_tax_and_discount_lines_are_omitted() {
        let fmt = CurrencyFormat::default();
        let totals = OrderTotals::compute(dec!(100000), Some(dec!(10000)), None, None);
        let lines = fmt.breakdown(&totals);
        let labels: Vec<&str> = lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "Shipping", "Total"]);
        assert_eq!(lines.last().unwrap().formatted, "Rp 110.000");
    }

    #[test]
    fn positive_tax_line_is_shown() {
        let fmt = CurrencyFormat::default();
        let totals =
            OrderTotals::compute(dec!(100000), Some(dec!(10000)), Some(dec!(5000)), None);
        let lines = fmt.breakdown(&totals);
        assert!(lines.iter().any(|l| l.label == "Tax"));
        assert_eq!(lines.last().unwrap().formatted, "Rp 115.000");
    }

    #[test]
    fn discount_renders_negative() {
        let fmt = CurrencyFormat::default();
        let totals = OrderTotals::compute(
            dec!(100000),
            Some(dec!(10000)),
            None,
            Some(dec!(25000)),
        );
        let discount = fmt
            .breakdown(&totals)
            .into_iter()
            .find(|l| l.label == "Discount")
            .unwrap();
        assert_eq!(discount.formatted, "-Rp 25.000");
        assert_eq!(totals.total, dec!(85000));
    }
}
