use std::collections::HashMap;
use std::sync::Mutex;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use tera::{Context, Tera};

use mocksmith_core::RequestParams;
use mocksmith_generate::{Dataset, GenerationContext, GeneratorRegistry, normalize};

use crate::errors::FormatError;
use crate::json::un_flatten;
use crate::options::FormatOptions;

const TEMPLATE_NAME: &str = "payload";

/// Root element used when the schema names none.
pub const DEFAULT_ROOT_NODE: &str = "root";

/// Build an XML template with one element per column.
///
/// Leaf elements come before nested groups; an empty `root` leaves the rows
/// unwrapped.
pub fn xml_template<'a>(
    columns: impl IntoIterator<Item = &'a str>,
    root: &str,
    nested_separator: Option<&str>,
) -> String {
    let placeholders: Map<String, Value> = columns
        .into_iter()
        .map(|name| (name.to_string(), Value::String(placeholder(name))))
        .collect();
    if placeholders.is_empty() {
        return String::new();
    }
    let placeholders = match nested_separator {
        Some(separator) => un_flatten(placeholders, separator),
        None => placeholders,
    };

    let body = xml_elements(&placeholders);
    if root.is_empty() {
        format!("{{% for r in records %}}{body}{{% endfor %}}")
    } else {
        format!("<{root}>{{% for r in records %}}{body}{{% endfor %}}</{root}>")
    }
}

fn placeholder(name: &str) -> String {
    let quote = ['"', '\'', '`']
        .into_iter()
        .find(|quote| !name.contains(*quote))
        .unwrap_or('"');
    format!("{{{{ r[{quote}{name}{quote}] }}}}")
}

fn xml_elements(children: &Map<String, Value>) -> String {
    let mut xml = String::new();
    let mut groups = String::new();
    for (key, value) in children {
        match value {
            Value::Object(group) => {
                groups.push_str(&format!("<{key}>{}</{key}>", xml_elements(group)));
            }
            Value::String(text) => xml.push_str(&format!("<{key}>{text}</{key}>")),
            other => xml.push_str(&format!("<{key}>{other}</{key}>")),
        }
    }
    xml.push_str(&groups);
    xml
}

/// Render `template` once over every row of the dataset.
pub fn render_template(
    template: &str,
    dataset: &Dataset,
    options: &FormatOptions,
    params: &RequestParams,
    registry: &'static GeneratorRegistry,
    ctx: &mut GenerationContext,
) -> Result<String, FormatError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, template)?;
    tera.register_function(
        "fake",
        FakeFunction {
            registry,
            rng: Mutex::new(ChaCha8Rng::from_rng(ctx.rng())),
        },
    );
    let request = params.clone();
    tera.register_function(
        "request_param",
        move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = args
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| tera::Error::msg("request_param requires a `name` argument"))?;
            Ok(request
                .get(name)
                .map(|value| Value::String(value.to_string()))
                .or_else(|| args.get("default").cloned())
                .unwrap_or(Value::Null))
        },
    );

    let mut context = Context::new();
    context.insert("records", &dataset.rows());
    context.insert("include_header", &options.include_header);
    context.insert("exclude_null", &options.exclude_null);
    context.insert("request_param", params);
    context.insert("params", params);

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// `fake(method="name", ...)`: one draw from the generator registry.
struct FakeFunction {
    registry: &'static GeneratorRegistry,
    rng: Mutex<ChaCha8Rng>,
}

impl tera::Function for FakeFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let method = args
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("fake requires a `method` argument"))?;
        let kwargs: Map<String, Value> = args
            .iter()
            .filter(|(key, _)| key.as_str() != "method")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| tera::Error::msg("fake random state is poisoned"))?;
        let value = self
            .registry
            .generate(method, &kwargs, &mut *rng)
            .map_err(|err| tera::Error::msg(err.root().to_string()))?;
        normalize(&value, None).map_err(|err| tera::Error::msg(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_template_puts_groups_after_leaves() {
        let template = xml_template(["b.c", "a"], "root", Some("."));
        assert_eq!(
            template,
            "<root>{% for r in records %}<a>{{ r[\"a\"] }}</a><b><c>{{ r[\"b.c\"] }}</c></b>{% endfor %}</root>"
        );
    }

    #[test]
    fn xml_template_without_root_or_columns() {
        assert_eq!(
            xml_template(["id"], "", None),
            "{% for r in records %}<id>{{ r[\"id\"] }}</id>{% endfor %}"
        );
        assert_eq!(xml_template(std::iter::empty(), "root", None), "");
    }
}
