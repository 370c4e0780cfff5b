use serde_json::Value;

/// Print just the headline answer.
///
/// For a search that is the best row, comma separated in reporting order;
/// for a quote the call and put premiums.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Object(best)) = result.get("rows").and_then(|rows| rows.get(0)) {
        let fields: Vec<String> = best.values().map(format_minimal).collect();
        println!("{}", fields.join(","));
        return;
    }

    let premium = |leg: &str| result.get(leg).and_then(|q| q.get("price"));
    if let (Some(call), Some(put)) = (premium("call"), premium("put")) {
        println!("call {} put {}", format_minimal(call), format_minimal(put));
        return;
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_minimal(val));
        return;
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
