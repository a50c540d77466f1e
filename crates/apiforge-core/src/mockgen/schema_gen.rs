//! Schema-directed mock generation: exhaustive dispatch over the resolved
//! schema, with format generators and field-name heuristics for strings.

use rand::Rng;
use serde_json::{Value, json};

use crate::document::Schema;
use crate::mockgen::{self, MockDataOptions};

/// Generate a value conforming to `schema`.
pub fn generate(schema: &Schema, options: &MockDataOptions, rng: &mut impl Rng) -> Value {
    generate_named(None, schema, options, rng)
}

fn generate_named(
    field: Option<&str>,
    schema: &Schema,
    options: &MockDataOptions,
    rng: &mut impl Rng,
) -> Value {
    if options.use_examples {
        if let Some(example) = schema.example() {
            return example.clone();
        }
    }

    match schema {
        Schema::Object { properties, .. } => {
            let mut out = serde_json::Map::new();
            for (name, prop) in properties {
                let value = options
                    .apply_rules(name, prop)
                    .or_else(|| options.custom_templates.get(name).cloned())
                    .unwrap_or_else(|| generate_named(Some(name), prop, options, rng));
                out.insert(name.clone(), value);
            }
            Value::Object(out)
        }
        Schema::Array {
            items,
            min_items,
            max_items,
            ..
        } => {
            let min = min_items.unwrap_or(1);
            let max = max_items.unwrap_or(5).max(min);
            let len = rng.gen_range(min..=max);
            let values = (0..len)
                .map(|_| generate_named(field, items, options, rng))
                .collect();
            Value::Array(values)
        }
        Schema::String {
            format,
            title,
            enum_values,
            ..
        } => {
            if let Some(values) = enum_values {
                if !values.is_empty() {
                    return values[rng.gen_range(0..values.len())].clone();
                }
            }
            if let Some(value) = format_string(format.as_deref(), rng) {
                return Value::String(value);
            }
            // Field name first, then the schema title, then plain lorem.
            let hint = field.or(title.as_deref());
            Value::String(match hint.and_then(|h| keyword_string(h, options, rng)) {
                Some(value) => value,
                None => {
                    let len = rng.gen_range(5..30);
                    mockgen::lorem(rng, len)
                }
            })
        }
        Schema::Integer {
            minimum, maximum, ..
        } => {
            let min = minimum.unwrap_or(-1000);
            let max = maximum.unwrap_or(1000).max(min);
            Value::Number(rng.gen_range(min..=max).into())
        }
        Schema::Number {
            minimum, maximum, ..
        } => {
            let min = minimum.unwrap_or(-1000.0);
            let max = maximum.unwrap_or(1000.0).max(min);
            let value = if (max - min).abs() < f64::EPSILON {
                min
            } else {
                rng.gen_range(min..=max)
            };
            // Rounding to two decimals may leave a tight window; clamp back.
            json!(((value * 100.0).round() / 100.0).clamp(min, max))
        }
        Schema::Boolean { .. } => Value::Bool(rng.gen_bool(0.5)),
        Schema::Null => Value::Null,
        // Residual refs should not survive resolution; a generic default
        // keeps generation total.
        Schema::Ref { .. } => json!({}),
    }
}

fn format_string(format: Option<&str>, rng: &mut impl Rng) -> Option<String> {
    let value = match format? {
        "email" => mockgen::gen_email(rng),
        "uri" | "url" => mockgen::gen_url(rng),
        "uuid" => mockgen::gen_uuid(rng),
        "date" => mockgen::gen_date(rng),
        "date-time" => mockgen::gen_date_time(rng),
        "ipv4" => mockgen::gen_ipv4(rng),
        "ipv6" => mockgen::gen_ipv6(rng),
        "hostname" => mockgen::gen_hostname(rng),
        "phone" => mockgen::gen_phone(rng),
        _ => return None,
    };
    Some(value)
}

fn pick(list: &[&str], rng: &mut impl Rng) -> String {
    list[rng.gen_range(0..list.len())].to_string()
}

/// Human-looking value by field-name keyword. Case-insensitive substring
/// match, most specific keywords first.
fn keyword_string(field: &str, options: &MockDataOptions, rng: &mut impl Rng) -> Option<String> {
    let field = field.to_lowercase();
    let locale = options.locale;
    let value = if field.contains("email") {
        mockgen::gen_email(rng)
    } else if field.contains("phone") {
        mockgen::gen_phone(rng)
    } else if field.contains("username") {
        format!("user_{}", rng.gen_range(1..9999_u32))
    } else if field.contains("password") {
        format!("P@ss{}", rng.gen_range(1000..9999_u32))
    } else if field.contains("url") {
        mockgen::gen_url(rng)
    } else if field.contains("address") {
        format!("{} {}", rng.gen_range(1..999_u16), pick(locale.streets(), rng))
    } else if field.contains("city") {
        pick(locale.cities(), rng)
    } else if field.contains("country") {
        pick(locale.countries(), rng)
    } else if field.contains("zip") || field.contains("postal") {
        format!("{:05}", rng.gen_range(10000..99999_u32))
    } else if field.contains("description") {
        mockgen::lorem(rng, 60)
    } else if field.contains("title") {
        mockgen::lorem(rng, 20)
    } else if field.contains("uuid") || field == "id" || field.ends_with("_id") {
        mockgen::gen_uuid(rng)
    } else if field.contains("name") {
        pick(locale.names(), rng)
    } else {
        return None;
    };
    Some(value)
}
