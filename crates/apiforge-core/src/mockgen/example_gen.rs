//! Example-directed mock generation: keep the structure of a captured
//! example, vary its values. Strings are sniffed for well-known shapes so a
//! UUID stays a UUID and a date stays a date.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde_json::Value;

use crate::mockgen::{self, MockDataOptions};
use crate::parsers::postman::infer_schema;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern")
});
static DATE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}").expect("static pattern")
});
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static pattern")
});

/// Generate a value with the same structure as `example` but fresh content.
pub fn generate(example: &Value, options: &MockDataOptions, rng: &mut impl Rng) -> Value {
    regenerate(example, options, rng)
}

fn regenerate(example: &Value, options: &MockDataOptions, rng: &mut impl Rng) -> Value {
    match example {
        Value::Null => Value::Null,
        Value::Bool(original) => {
            // Keep the original most of the time.
            Value::Bool(if rng.gen_bool(0.7) {
                *original
            } else {
                !*original
            })
        }
        Value::Number(_) => perturb_number(example, rng),
        Value::String(original) => Value::String(regenerate_string(original, options, rng)),
        Value::Array(elements) => {
            if elements.is_empty() {
                return Value::Array(Vec::new());
            }
            // Original length plus or minus up to 2, never below 1, cycling
            // the original elements as templates.
            let delta = rng.gen_range(-2_i64..=2);
            let len = (elements.len() as i64 + delta).max(1) as usize;
            let values = (0..len)
                .map(|i| regenerate(&elements[i % elements.len()], options, rng))
                .collect();
            Value::Array(values)
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map {
                let value = options
                    .apply_rules(key, &infer_schema(entry))
                    .or_else(|| options.custom_templates.get(key).cloned())
                    .unwrap_or_else(|| regenerate(entry, options, rng));
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
    }
}

/// Vary a number by up to 20 percent, keeping integers integral.
fn perturb_number(example: &Value, rng: &mut impl Rng) -> Value {
    if let Some(original) = example.as_i64() {
        let span = (original.abs() / 5).max(1);
        return Value::Number((original + rng.gen_range(-span..=span)).into());
    }
    if let Some(original) = example.as_f64() {
        let varied = original * (1.0 + rng.gen_range(-0.2..=0.2));
        if let Some(number) = serde_json::Number::from_f64(varied) {
            return Value::Number(number);
        }
    }
    example.clone()
}

fn regenerate_string(original: &str, options: &MockDataOptions, rng: &mut impl Rng) -> String {
    if original.contains('@') && original.contains('.') {
        return mockgen::gen_email(rng);
    }
    if original.starts_with("http") || original.contains("www.") {
        return mockgen::gen_url(rng);
    }
    if DATE_RE.is_match(original) {
        return mockgen::gen_date(rng);
    }
    if DATE_TIME_RE.is_match(original) {
        return mockgen::gen_date_time(rng);
    }
    if UUID_RE.is_match(original) {
        return mockgen::gen_uuid(rng);
    }
    // JSON embedded in a string: regenerate the parsed value, re-serialize.
    let trimmed = original.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Value>(original) {
            let varied = regenerate(&parsed, options, rng);
            if let Ok(text) = serde_json::to_string(&varied) {
                return text;
            }
        }
    }
    // Plain text: lorem in the same length band as the original.
    let band = match original.len() {
        0..=10 => 10,
        11..=50 => 50,
        51..=200 => 200,
        _ => 400,
    };
    mockgen::lorem(rng, band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use serde_json::json;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn object_keeps_the_key_set() {
        let example = json!({"id": 3, "name": "Rex", "tags": ["a", "b"]});
        let value = generate(&example, &MockDataOptions::default(), &mut rng());
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["id", "name", "tags"]);
    }

    #[test]
    fn null_stays_null() {
        assert_eq!(
            generate(&json!(null), &MockDataOptions::default(), &mut rng()),
            json!(null)
        );
    }

    #[test]
    fn integer_perturbation_stays_integral() {
        let mut rng = rng();
        for _ in 0..20 {
            let value = generate(&json!(100), &MockDataOptions::default(), &mut rng);
            let varied = value.as_i64().unwrap();
            assert!((80..=120).contains(&varied), "got {varied}");
        }
    }

    #[test]
    fn float_perturbation_stays_float() {
        let value = generate(&json!(10.0), &MockDataOptions::default(), &mut rng());
        assert!(value.is_f64());
        let varied = value.as_f64().unwrap();
        assert!((8.0..=12.0).contains(&varied));
    }

    #[test]
    fn array_length_varies_within_two_of_original() {
        let example = json!([1, 2, 3]);
        let mut rng = rng();
        for _ in 0..20 {
            let value = generate(&example, &MockDataOptions::default(), &mut rng);
            let len = value.as_array().unwrap().len();
            assert!((1..=5).contains(&len), "length {len}");
        }
    }

    #[test]
    fn empty_array_stays_empty() {
        let value = generate(&json!([]), &MockDataOptions::default(), &mut rng());
        assert_eq!(value, json!([]));
    }

    #[test]
    fn email_string_regenerates_as_email() {
        let value = generate(
            &json!("alice@example.org"),
            &MockDataOptions::default(),
            &mut rng(),
        );
        let s = value.as_str().unwrap();
        assert!(s.contains('@') && s.contains('.'));
    }

    #[test]
    fn uuid_string_regenerates_as_uuid() {
        let value = generate(
            &json!("6fa1b0c2-9d3e-4f5a-8b7c-0d1e2f3a4b5c"),
            &MockDataOptions::default(),
            &mut rng(),
        );
        assert!(UUID_RE.is_match(value.as_str().unwrap()));
    }

    #[test]
    fn date_string_regenerates_as_date() {
        let value = generate(&json!("2023-04-05"), &MockDataOptions::default(), &mut rng());
        assert!(DATE_RE.is_match(value.as_str().unwrap()));
    }

    #[test]
    fn long_text_regenerates_in_the_top_band() {
        let original = "x".repeat(250);
        let value = generate(&json!(original), &MockDataOptions::default(), &mut rng());
        let s = value.as_str().unwrap();
        assert!(s.len() > 200, "got {} chars", s.len());
        assert!(s.len() <= 400);
    }

    #[test]
    fn json_in_string_reserialized() {
        let value = generate(
            &json!("{\"inner\": 5}"),
            &MockDataOptions::default(),
            &mut rng(),
        );
        let reparsed: Value = serde_json::from_str(value.as_str().unwrap()).unwrap();
        assert!(reparsed.get("inner").is_some());
    }

    #[test]
    fn rules_apply_to_object_keys() {
        let options = mockgen::MockDataOptions::new()
            .with_rule(mockgen::Rule::exact("id", |_, _| json!(777)));
        let value = generate(&json!({"id": 1, "name": "x"}), &options, &mut rng());
        assert_eq!(value["id"], 777);
    }
}
