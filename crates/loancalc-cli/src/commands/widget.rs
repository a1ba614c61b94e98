use clap::Args;
use serde_json::{json, Value};

use loancalc_core::widget::{format_currency, LoanCalculatorWidget};

/// Arguments for the widget-attribute mode
#[derive(Args)]
pub struct WidgetArgs {
    /// Widget attribute as key=value; may be repeated.
    /// Recognized keys: loan-amount, interest-rate, loan-term, theme
    #[arg(long = "attr", value_name = "KEY=VALUE")]
    pub attrs: Vec<String>,
}

pub fn run_widget(args: WidgetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(args.attrs.len());
    for attr in &args.attrs {
        let (key, value) = attr
            .split_once('=')
            .ok_or_else(|| format!("Malformed attribute '{attr}'; expected key=value"))?;
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }

    let widget =
        LoanCalculatorWidget::from_attributes(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    let calc = widget
        .calculation()
        .ok_or("Inputs are not computable; nothing to display")?;

    // The summary stats the embedded widget renders, plus the raw values.
    Ok(json!({
        "theme": widget.theme(),
        "config": widget.config(),
        "result": {
            "monthly_payment": calc.monthly_payment.to_string(),
            "total_payment": calc.total_payment.to_string(),
            "total_interest": calc.total_interest.to_string(),
        },
        "display": {
            "monthly_payment": format_currency(calc.monthly_payment),
            "total_payment": format_currency(calc.total_payment),
            "total_interest": format_currency(calc.total_interest),
        },
    }))
}
