//! Widget configuration and state binding for the loan calculator.
//!
//! The embeddable widget is driven by declarative string attributes
//! (`loan-amount`, `interest-rate`, `loan-term`, `theme`). This module parses
//! those into a typed [`WidgetConfig`] and provides
//! [`LoanCalculatorWidget`], a reactive holder that recomputes the
//! amortization whenever an input changes and broadcasts the fresh result to
//! registered listeners.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::{compute_amortization, AmortizationOutput, LoanInput};
use crate::error::LoanCalcError;
use crate::types::{Money, Rate};
use crate::LoanCalcResult;

/// Display theme for the hosting UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Parse a `theme` attribute value. Anything other than `dark` renders
    /// with the default light theme.
    pub fn from_attribute(value: &str) -> Self {
        if value.eq_ignore_ascii_case("dark") {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Typed widget configuration, with the stock defaults of the hosted
/// component: $250,000 at 5% over 30 years, light theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub term_years: u32,
    pub theme: Theme,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        WidgetConfig {
            loan_amount: dec!(250000),
            interest_rate: dec!(5.0),
            term_years: 30,
            theme: Theme::Light,
        }
    }
}

impl WidgetConfig {
    /// Build a config from declarative attribute pairs.
    ///
    /// Recognized keys are `loan-amount`, `interest-rate`, `loan-term` and
    /// `theme`; unknown keys are ignored so hosts can pass through their own
    /// attributes. A recognized numeric attribute that fails to parse is
    /// `InvalidInput`.
    pub fn from_attributes<'a, I>(attributes: I) -> LoanCalcResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = WidgetConfig::default();

        for (key, value) in attributes {
            match key {
                "loan-amount" => config.loan_amount = parse_decimal("loan-amount", value)?,
                "interest-rate" => config.interest_rate = parse_decimal("interest-rate", value)?,
                "loan-term" => {
                    config.term_years =
                        value
                            .trim()
                            .parse()
                            .map_err(|_| LoanCalcError::InvalidInput {
                                field: "loan-term".into(),
                                reason: format!("'{value}' is not a whole number of years"),
                            })?
                }
                "theme" => config.theme = Theme::from_attribute(value),
                _ => {}
            }
        }

        Ok(config)
    }

    fn loan_input(&self) -> LoanInput {
        LoanInput {
            principal: self.loan_amount,
            annual_rate_pct: self.interest_rate,
            term_years: self.term_years,
        }
    }
}

fn parse_decimal(field: &str, value: &str) -> LoanCalcResult<Decimal> {
    value
        .trim()
        .parse()
        .map_err(|_| LoanCalcError::InvalidInput {
            field: field.into(),
            reason: format!("'{value}' is not a number"),
        })
}

/// Fire-and-forget result listener.
type Listener = Box<dyn FnMut(&AmortizationOutput)>;

/// Reactive state holder for the calculator widget.
///
/// Each input change triggers a synchronous recompute. A valid result
/// replaces the cached calculation and is broadcast to listeners; invalid
/// input clears the cache without notifying, so consumers never render a
/// stale schedule.
pub struct LoanCalculatorWidget {
    config: WidgetConfig,
    result: Option<AmortizationOutput>,
    listeners: Vec<Listener>,
}

impl LoanCalculatorWidget {
    pub fn new(config: WidgetConfig) -> Self {
        let mut widget = LoanCalculatorWidget {
            config,
            result: None,
            listeners: Vec::new(),
        };
        widget.recompute();
        widget
    }

    /// Construct directly from attribute pairs, as the embeddable element
    /// does on mount.
    pub fn from_attributes<'a, I>(attributes: I) -> LoanCalcResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Ok(Self::new(WidgetConfig::from_attributes(attributes)?))
    }

    pub fn set_loan_amount(&mut self, amount: Money) {
        self.config.loan_amount = amount;
        self.recompute();
    }

    pub fn set_interest_rate(&mut self, rate_pct: Rate) {
        self.config.interest_rate = rate_pct;
        self.recompute();
    }

    pub fn set_term_years(&mut self, years: u32) {
        self.config.term_years = years;
        self.recompute();
    }

    /// Re-parse attributes and recompute, as on an attribute-changed
    /// callback. The previous configuration is kept if parsing fails.
    pub fn update_from_attributes<'a, I>(&mut self, attributes: I) -> LoanCalcResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.config = WidgetConfig::from_attributes(attributes)?;
        self.recompute();
        Ok(())
    }

    /// Register a listener invoked with every fresh calculation. No
    /// acknowledgment, no retry; listeners are never told about invalid
    /// input.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&AmortizationOutput) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    /// The current calculation, absent while the inputs are not computable.
    pub fn calculation(&self) -> Option<&AmortizationOutput> {
        self.result.as_ref()
    }

    fn recompute(&mut self) {
        match compute_amortization(&self.config.loan_input()) {
            Ok(output) => {
                for listener in &mut self.listeners {
                    listener(&output.result);
                }
                self.result = Some(output.result);
            }
            // Expected during interactive editing. Suppress the display
            // rather than keep a stale result.
            Err(_) => self.result = None,
        }
    }
}

/// Format a monetary amount as US dollars: `$1,234.56`.
pub fn format_currency(amount: Money) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .abs();
    let text = rounded.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{f:0<2}")),
        None => (text, "00".to_string()),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_config_computes_on_construction() {
        let widget = LoanCalculatorWidget::new(WidgetConfig::default());
        let calc = widget.calculation().expect("default inputs are valid");
        assert_eq!(calc.schedule.len(), 360);
        // $250,000 at 5% over 30 years
        assert!((calc.monthly_payment - dec!(1342.05)).abs() < dec!(0.01));
    }

    #[test]
    fn test_setter_triggers_recompute() {
        let mut widget = LoanCalculatorWidget::new(WidgetConfig::default());
        widget.set_loan_amount(dec!(100000));
        widget.set_interest_rate(dec!(5));
        widget.set_term_years(30);
        let calc = widget.calculation().unwrap();
        assert!((calc.monthly_payment - dec!(536.82)).abs() < dec!(0.01));
    }

    #[test]
    fn test_invalid_input_clears_result() {
        let mut widget = LoanCalculatorWidget::new(WidgetConfig::default());
        assert!(widget.calculation().is_some());
        widget.set_loan_amount(dec!(0));
        assert!(widget.calculation().is_none());
        // The next valid input simply produces a new result.
        widget.set_loan_amount(dec!(50000));
        assert!(widget.calculation().is_some());
    }

    #[test]
    fn test_listener_broadcast() {
        let seen: Rc<RefCell<Vec<Decimal>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut widget = LoanCalculatorWidget::new(WidgetConfig::default());
        widget.subscribe(move |calc| sink.borrow_mut().push(calc.monthly_payment));

        widget.set_loan_amount(dec!(100000));
        widget.set_loan_amount(dec!(-1)); // no broadcast
        widget.set_loan_amount(dec!(200000));

        let payments = seen.borrow();
        assert_eq!(payments.len(), 2);
        assert!((payments[0] - dec!(536.82)).abs() < dec!(0.01));
        assert!((payments[1] - dec!(1073.64)).abs() < dec!(0.01));
    }

    #[test]
    fn test_from_attributes() {
        let config = WidgetConfig::from_attributes([
            ("loan-amount", "300000"),
            ("interest-rate", "4.5"),
            ("loan-term", "15"),
            ("theme", "dark"),
            ("class", "embedded"), // unknown, ignored
        ])
        .unwrap();

        assert_eq!(config.loan_amount, dec!(300000));
        assert_eq!(config.interest_rate, dec!(4.5));
        assert_eq!(config.term_years, 15);
        assert_eq!(config.theme, Theme::Dark);
    }

    #[test]
    fn test_missing_attributes_fall_back_to_defaults() {
        let config = WidgetConfig::from_attributes([("theme", "dark")]).unwrap();
        assert_eq!(config.loan_amount, dec!(250000));
        assert_eq!(config.interest_rate, dec!(5.0));
        assert_eq!(config.term_years, 30);
    }

    #[test]
    fn test_malformed_attribute_is_invalid_input() {
        let err = WidgetConfig::from_attributes([("loan-amount", "lots")]).unwrap_err();
        match err {
            LoanCalcError::InvalidInput { field, .. } => assert_eq!(field, "loan-amount"),
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_theme_parsing() {
        assert_eq!(Theme::from_attribute("dark"), Theme::Dark);
        assert_eq!(Theme::from_attribute("DARK"), Theme::Dark);
        assert_eq!(Theme::from_attribute("light"), Theme::Light);
        assert_eq!(Theme::from_attribute("solarized"), Theme::Light);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(536.8216)), "$536.82");
        assert_eq!(format_currency(dec!(1342.054)), "$1,342.05");
        assert_eq!(format_currency(dec!(250000)), "$250,000.00");
        assert_eq!(format_currency(dec!(1234567.8)), "$1,234,567.80");
        assert_eq!(format_currency(dec!(0.5)), "$0.50");
        assert_eq!(format_currency(dec!(-42.136)), "-$42.14");
    }
}
