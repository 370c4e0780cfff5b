use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_table(result, map),
            None => print_field_table(map.iter()),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    let Value::Object(res_map) = result else {
        print_field_table(envelope.iter());
        return;
    };

    // Ranked rows first, then any nested objects (call/put quotes) side by side
    if let Some(Value::Array(rows)) = res_map.get("rows") {
        print_array_table(rows);
    }
    let nested: Vec<Value> = res_map
        .iter()
        .filter(|(key, val)| val.is_object() && key.as_str() != "payoff_curve")
        .map(|(_, val)| val.clone())
        .collect();
    if !nested.is_empty() {
        print_array_table(&nested);
    }

    print_field_table(
        res_map
            .iter()
            .filter(|(key, val)| key.as_str() != "rows" && key.as_str() != "payoff_curve" && !val.is_object()),
    );

    if let Some(Value::Object(curve)) = res_map.get("payoff_curve") {
        if let Some(Value::String(title)) = res_map.get("chart_title") {
            println!("\n{}", title);
        }
        print_payoff_curve(curve);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_field_table<'a>(fields: impl Iterator<Item = (&'a String, &'a Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_payoff_curve(curve: &Map<String, Value>) {
    let (Some(Value::Array(prices)), Some(Value::Array(payoffs))) =
        (curve.get("stock_prices"), curve.get("payoffs"))
    else {
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Stock price", "Payoff"]);
    for (price, payoff) in prices.iter().zip(payoffs) {
        builder.push_record([format_value(price), format_value(payoff)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
