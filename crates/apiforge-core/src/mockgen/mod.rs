//! Mock data synthesis.
//!
//! Two strategies share the same options: schema-directed generation
//! ([`schema_gen`]) for endpoints that declare schemas, and example-directed
//! generation ([`example_gen`]) that perturbs a captured example while
//! preserving its structure. Both are pure in `(input, options, rng)`.

pub mod example_gen;
pub mod schema_gen;

use std::collections::HashMap;

use rand::Rng;
use regex::Regex;
use serde_json::Value;

use crate::document::Schema;

/// Per-field generation rule. Rules are checked in order before any other
/// strategy; the first matching rule wins.
pub struct Rule {
    pub pattern: FieldPattern,
    pub generate: Box<dyn Fn(&str, &Schema) -> Value + Send + Sync>,
}

impl Rule {
    #[must_use]
    pub fn exact(
        name: impl Into<String>,
        generate: impl Fn(&str, &Schema) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            pattern: FieldPattern::Exact(name.into()),
            generate: Box::new(generate),
        }
    }

    #[must_use]
    pub fn matching(
        pattern: Regex,
        generate: impl Fn(&str, &Schema) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            pattern: FieldPattern::Matches(pattern),
            generate: Box::new(generate),
        }
    }
}

/// How a rule selects field names.
pub enum FieldPattern {
    Exact(String),
    Matches(Regex),
}

impl FieldPattern {
    #[must_use]
    pub fn matches(&self, field: &str) -> bool {
        match self {
            Self::Exact(name) => name == field,
            Self::Matches(re) => re.is_match(field),
        }
    }
}

/// Word lists for human-looking values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "zh" | "zh-CN" => Self::Zh,
            _ => Self::En,
        }
    }

    pub(crate) fn names(self) -> &'static [&'static str] {
        match self {
            Self::En => &["Alice Johnson", "Bob Smith", "Carol White", "David Brown"],
            Self::Zh => &["王伟", "李娜", "张敏", "刘洋"],
        }
    }

    pub(crate) fn cities(self) -> &'static [&'static str] {
        match self {
            Self::En => &["Springfield", "Riverton", "Lakewood", "Fairview"],
            Self::Zh => &["北京", "上海", "广州", "深圳"],
        }
    }

    pub(crate) fn countries(self) -> &'static [&'static str] {
        match self {
            Self::En => &["United States", "Canada", "Germany", "Japan"],
            Self::Zh => &["中国", "日本", "德国", "美国"],
        }
    }

    pub(crate) fn streets(self) -> &'static [&'static str] {
        match self {
            Self::En => &["Main St", "Oak Ave", "Maple Dr", "Cedar Ln"],
            Self::Zh => &["中山路", "人民路", "解放路", "建设路"],
        }
    }
}

/// Shared knobs for both generation strategies. Built per call site, never
/// global; holds closures, so deliberately not `Clone` or serializable.
pub struct MockDataOptions {
    /// Emit schema-carried examples verbatim instead of generating.
    pub use_examples: bool,
    pub locale: Locale,
    /// Fixed values keyed by field name, checked after rules.
    pub custom_templates: HashMap<String, Value>,
    pub rules: Vec<Rule>,
}

impl Default for MockDataOptions {
    fn default() -> Self {
        Self {
            use_examples: true,
            locale: Locale::En,
            custom_templates: HashMap::new(),
            rules: Vec::new(),
        }
    }
}

impl MockDataOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_examples(mut self, use_examples: bool) -> Self {
        self.use_examples = use_examples;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_template(mut self, field: impl Into<String>, value: Value) -> Self {
        self.custom_templates.insert(field.into(), value);
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// First matching rule's output for a field, if any.
    pub(crate) fn apply_rules(&self, field: &str, schema: &Schema) -> Option<Value> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(field))
            .map(|rule| (rule.generate)(field, schema))
    }
}

const LOREM: [&str; 16] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "do", "eiusmod", "tempor", "incididunt", "labore", "magna", "aliqua",
];

/// One lorem word.
pub(crate) fn word(rng: &mut impl Rng) -> &'static str {
    LOREM[rng.gen_range(0..LOREM.len())]
}

/// Space-joined lorem words up to roughly `target_len` characters.
pub(crate) fn lorem(rng: &mut impl Rng, target_len: usize) -> String {
    let mut out = String::new();
    while out.len() < target_len {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word(rng));
    }
    out.truncate(target_len.max(1));
    out
}

pub(crate) fn gen_email(rng: &mut impl Rng) -> String {
    format!("user{}@example.com", rng.gen_range(1..9999_u32))
}

pub(crate) fn gen_url(rng: &mut impl Rng) -> String {
    format!("https://example.com/{}", word(rng))
}

pub(crate) fn gen_uuid(rng: &mut impl Rng) -> String {
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        rng.r#gen::<u32>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>() & 0x0FFF,
        (rng.r#gen::<u16>() & 0x3FFF) | 0x8000,
        rng.r#gen::<u64>() & 0xFFFF_FFFF_FFFF,
    )
}

pub(crate) fn gen_date(rng: &mut impl Rng) -> String {
    format!(
        "202{}-{:02}-{:02}",
        rng.gen_range(0..6_u8),
        rng.gen_range(1..=12_u8),
        rng.gen_range(1..=28_u8),
    )
}

pub(crate) fn gen_date_time(rng: &mut impl Rng) -> String {
    format!(
        "{}T{:02}:{:02}:{:02}Z",
        gen_date(rng),
        rng.gen_range(0..24_u8),
        rng.gen_range(0..60_u8),
        rng.gen_range(0..60_u8),
    )
}

pub(crate) fn gen_ipv4(rng: &mut impl Rng) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(1..255_u8),
        rng.gen_range(0..=255_u8),
        rng.gen_range(0..=255_u8),
        rng.gen_range(1..255_u8),
    )
}

pub(crate) fn gen_ipv6(rng: &mut impl Rng) -> String {
    format!(
        "2001:db8:{:x}:{:x}:{:x}:{:x}:{:x}:{:x}",
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>(),
    )
}

pub(crate) fn gen_hostname(rng: &mut impl Rng) -> String {
    format!("{}.example.com", word(rng))
}

pub(crate) fn gen_phone(rng: &mut impl Rng) -> String {
    format!(
        "+1-{:03}-{:03}-{:04}",
        rng.gen_range(200..999_u16),
        rng.gen_range(100..999_u16),
        rng.gen_range(0..9999_u16),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use serde_json::json;

    #[test]
    fn rule_order_first_match_wins() {
        let options = MockDataOptions::new()
            .with_rule(Rule::exact("id", |_, _| json!(1)))
            .with_rule(Rule::matching(Regex::new("^id$").unwrap(), |_, _| json!(2)));
        let value = options.apply_rules("id", &Schema::string());
        assert_eq!(value, Some(json!(1)));
        assert_eq!(options.apply_rules("other", &Schema::string()), None);
    }

    #[test]
    fn regex_rule_matches_by_pattern() {
        let options = MockDataOptions::new().with_rule(Rule::matching(
            Regex::new("_at$").unwrap(),
            |_, _| json!("2024-01-01T00:00:00Z"),
        ));
        assert!(options.apply_rules("created_at", &Schema::string()).is_some());
        assert!(options.apply_rules("name", &Schema::string()).is_none());
    }

    #[test]
    fn lorem_respects_target_length() {
        let mut rng = SmallRng::seed_from_u64(42);
        let text = lorem(&mut rng, 50);
        assert!(!text.is_empty());
        assert!(text.len() <= 50);
    }

    #[test]
    fn email_shape() {
        let mut rng = SmallRng::seed_from_u64(42);
        let email = gen_email(&mut rng);
        assert!(email.contains('@'));
        assert!(email.contains('.'));
    }

    #[test]
    fn uuid_shape() {
        let mut rng = SmallRng::seed_from_u64(42);
        let uuid = gen_uuid(&mut rng);
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid.matches('-').count(), 4);
    }

    #[test]
    fn locale_parse_defaults_to_en() {
        assert_eq!(Locale::parse("zh"), Locale::Zh);
        assert_eq!(Locale::parse("fr"), Locale::En);
    }
}
