//! OpenAPI 3.x parser.

use serde_json::Value;

use crate::document::{Endpoint, Example, ParamLocation, ParamSpec, ParsedDocument};
use crate::error::ParseError;
use crate::parsers::{ApiParser, Format};
use crate::resolve::resolve;

const METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

pub struct OpenApiV3Parser;

impl ApiParser for OpenApiV3Parser {
    fn format(&self) -> Format {
        Format::OpenApi
    }

    fn parse_document(&self, raw: &Value) -> Result<ParsedDocument, ParseError> {
        raw.get("openapi")
            .and_then(Value::as_str)
            .filter(|v| v.starts_with("3."))
            .ok_or_else(|| ParseError::missing("document", "openapi"))?;

        let info = raw.get("info").cloned().unwrap_or_default();
        let mut doc = ParsedDocument {
            title: str_or(&info, "title", "Untitled API"),
            version: str_or(&info, "version", "0.0.0"),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            base_url: base_url(raw),
            ..ParsedDocument::default()
        };

        if let Some(paths) = raw.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                let shared_params = item
                    .get("parameters")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for method in METHODS {
                    if let Some(op) = item.get(method) {
                        doc.push_endpoint(parse_operation(
                            method,
                            path,
                            op,
                            &shared_params,
                            raw,
                        ));
                    }
                }
            }
        }

        if let Some(schemas) = raw
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
        {
            for (name, node) in schemas {
                doc.schemas.insert(name.clone(), resolve(node, raw));
            }
        }

        Ok(doc)
    }
}

fn parse_operation(
    method: &str,
    path: &str,
    op: &Value,
    shared_params: &[Value],
    root: &Value,
) -> Endpoint {
    let mut endpoint = Endpoint::new(method.to_uppercase(), path);
    endpoint.summary = op.get("summary").and_then(Value::as_str).map(String::from);
    endpoint.description = op
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    // Path-level parameters apply to every operation; operation-level ones
    // with the same name and location override them (map insert order).
    let own_params = op
        .get("parameters")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for param in shared_params.iter().chain(own_params.iter()) {
        add_parameter(&mut endpoint, param, root);
    }

    if let Some(body) = op.get("requestBody") {
        let body = deref(body, root);
        if let Some((media_type, media)) = pick_media(body.get("content")) {
            endpoint.request_content_type = Some(media_type.clone());
            endpoint.request_schema = media.get("schema").map(|s| resolve(s, root));
            endpoint
                .request_examples
                .extend(media_examples(media, &media_type, None));
        }
    }

    if let Some(responses) = op.get("responses").and_then(Value::as_object) {
        for (status, response) in responses {
            let response = deref(response, root);
            if let Some((media_type, media)) = pick_media(response.get("content")) {
                if let Some(schema) = media.get("schema") {
                    endpoint
                        .response_schemas
                        .insert(status.clone(), resolve(schema, root));
                }
                endpoint.response_examples.extend(media_examples(
                    media,
                    &media_type,
                    Some(status.as_str()),
                ));
            }
        }
    }

    endpoint
}

fn add_parameter(endpoint: &mut Endpoint, param: &Value, root: &Value) {
    let param = deref(param, root);
    let Some(name) = param.get("name").and_then(Value::as_str) else {
        return;
    };
    let Some(location) = param
        .get("in")
        .and_then(Value::as_str)
        .and_then(param_location)
    else {
        return;
    };
    let schema = param
        .get("schema")
        .map(|s| resolve(s, root))
        .unwrap_or_else(crate::document::Schema::string);
    endpoint.parameters.entry(location).or_default().insert(
        name.to_string(),
        ParamSpec {
            required: param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(location == ParamLocation::Path),
            schema,
            description: param
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            example: param.get("example").cloned(),
        },
    );
}

fn param_location(raw: &str) -> Option<ParamLocation> {
    match raw {
        "path" => Some(ParamLocation::Path),
        "query" => Some(ParamLocation::Query),
        "header" => Some(ParamLocation::Header),
        "cookie" => Some(ParamLocation::Cookie),
        _ => None,
    }
}

/// `servers[0].url`, with `{var}` templates replaced by their declared
/// defaults when available.
fn base_url(raw: &Value) -> Option<String> {
    let server = raw.get("servers")?.as_array()?.first()?;
    let mut url = server.get("url")?.as_str()?.to_string();
    if let Some(variables) = server.get("variables").and_then(Value::as_object) {
        for (name, variable) in variables {
            if let Some(default) = variable.get("default").and_then(Value::as_str) {
                url = url.replace(&format!("{{{name}}}"), default);
            }
        }
    }
    Some(url)
}

/// Pick a media type from a `content` map, preferring JSON.
fn pick_media(content: Option<&Value>) -> Option<(String, &Value)> {
    let content = content?.as_object()?;
    let key = content
        .keys()
        .find(|k| k.contains("json"))
        .or_else(|| content.keys().next())?;
    Some((key.clone(), &content[key]))
}

/// Examples from a media-type object: the named `examples` map entries and
/// the singular `example`.
fn media_examples(media: &Value, content_type: &str, status: Option<&str>) -> Vec<Example> {
    let mut out = Vec::new();
    if let Some(named) = media.get("examples").and_then(Value::as_object) {
        for (name, entry) in named {
            let value = entry.get("value").cloned().unwrap_or(Value::Null);
            out.push(Example {
                name: name.clone(),
                content_type: Some(content_type.to_string()),
                status_code: status.map(String::from),
                value,
            });
        }
    }
    if let Some(value) = media.get("example") {
        out.push(Example {
            name: "example".to_string(),
            content_type: Some(content_type.to_string()),
            status_code: status.map(String::from),
            value: value.clone(),
        });
    }
    out
}

/// Follow a `$ref` on a non-schema node (parameter, requestBody, response).
fn deref<'a>(node: &'a Value, root: &'a Value) -> &'a Value {
    if let Some(pointer) = node.get("$ref").and_then(Value::as_str) {
        if let Some(path) = pointer.strip_prefix("#/") {
            let mut current = root;
            for segment in path.split('/') {
                match current.get(segment) {
                    Some(next) => current = next,
                    None => return node,
                }
            }
            return current;
        }
    }
    node
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
