use crate::value::Value;

pub fn format_value(v: &Value) -> String {
    match v {
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => {
            if f.fract() == 0.0 { format!("{:.1}", f) } else { f.to_string() }
        }
        Value::BigReal(s) => s.clone(),
        Value::Rational { num, den } => format!("{}/{}", num, den),
        Value::String(s) => format!("\"{}\"", s),
        Value::Symbol(s) => s.clone(),
        Value::Boolean(b) => if *b { "True".into() } else { "False".into() },
        Value::Bytes(bytes) => format!("ByteArray[{}]", bytes.len()),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Assoc(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("\"{}\" -> {}", k, format_value(&map[k])))
                .collect();
            format!("<|{}|>", parts.join(", "))
        }
        Value::Expr { head, args } => {
            let h = format_value(head);
            let a: Vec<String> = args.iter().map(format_value).collect();
            format!("{}[{}]", h, a.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_common_shapes() {
        assert_eq!(format_value(&Value::Integer(42)), "42");
        assert_eq!(format_value(&Value::Real(2.0)), "2.0");
        assert_eq!(format_value(&Value::Boolean(true)), "True");
        assert_eq!(
            format_value(&Value::list(vec![Value::Integer(1), Value::Integer(2)])),
            "{1, 2}"
        );
        assert_eq!(
            format_value(&Value::expr(Value::symbol("f"), vec![Value::symbol("x"), Value::Integer(2)])),
            "f[x, 2]"
        );
        assert_eq!(
            format_value(&Value::assoc(vec![("b", Value::Integer(2)), ("a", Value::Integer(1))])),
            "<|\"a\" -> 1, \"b\" -> 2|>"
        );
    }
}
