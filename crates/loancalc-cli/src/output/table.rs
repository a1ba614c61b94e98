use rust_decimal::Decimal;
use serde_json::Value;
use tabled::{builder::Builder, Table};

use loancalc_core::widget::format_currency;

/// Fields rendered as dollar amounts in table output.
const MONEY_FIELDS: &[&str] = &[
    "monthly_payment",
    "total_payment",
    "total_interest",
    "payment",
    "principal_portion",
    "interest_portion",
    "remaining_balance",
];

/// Format output as tables using the tabled crate: a field/value summary,
/// then the amortization schedule month by month when one is present.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_schedule_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            if key == "schedule" {
                continue;
            }
            builder.push_record([key.as_str(), &format_field(key, val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);

        if let Some(Value::Array(schedule)) = res_map.get("schedule") {
            println!();
            print_schedule_table(schedule);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_field(key, val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_schedule_table(periods: &[Value]) {
    if periods.is_empty() {
        println!("(empty schedule)");
        return;
    }

    let headers = match periods.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect::<Vec<String>>(),
        _ => {
            for item in periods {
                println!("{}", format_field("", item));
            }
            return;
        }
    };

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in periods {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    map.get(h.as_str())
                        .map(|v| format_field(h, v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }
    }

    let table = Table::from(builder);
    println!("{}", table);
}

/// Money fields render as dollars; everything else as-is.
fn format_field(key: &str, value: &Value) -> String {
    if MONEY_FIELDS.contains(&key) {
        if let Some(amount) = as_decimal(value) {
            return format_currency(amount);
        }
    }

    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_field("", v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
