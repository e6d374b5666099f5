//! Render expressions in canonical and parameterized form

use std::collections::HashMap;

use super::CliError;
use crate::{
    json::json_to_value,
    parse,
    translate::{ParameterizedRenderer, RenderOptions, Rendered},
    value::Value,
};

/// Options for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderCommandOptions {
    pub expression: String,
    /// Identification variable for object paths
    pub root: Option<String>,
    /// Named parameter values, bound before rendering
    pub params: Vec<(String, Value)>,
}

#[derive(Debug)]
pub struct RenderResult {
    pub canonical: String,
    pub parameterized: Rendered,
}

/// Split `name=value`. The value is read as JSON when it parses as JSON and
/// as a plain string otherwise.
pub fn parse_param(raw: &str) -> Result<(String, Value), CliError> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::InvalidParam(raw.to_string()))?;
    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => json_to_value(json),
        Err(_) => Value::String(value.to_string()),
    };
    Ok((name.trim_start_matches('$').to_string(), value))
}

pub fn execute_render(options: &RenderCommandOptions) -> Result<RenderResult, CliError> {
    let mut expr = parse(&options.expression)?;

    if !options.params.is_empty() {
        let values: HashMap<String, Value> = options.params.iter().cloned().collect();
        // Every parameter is either bound here or rejected
        if let Some(bound) = expr.params(&values, false)? {
            expr = bound;
        }
    }

    let render_options = RenderOptions {
        root_alias: options.root.clone(),
        ..RenderOptions::default()
    };
    let parameterized = ParameterizedRenderer::new(render_options).render(&expr)?;

    Ok(RenderResult {
        canonical: expr.to_string(),
        parameterized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_params() {
        assert_eq!(parse_param("n=3").unwrap(), ("n".to_string(), Value::Integer(3)));
        assert_eq!(
            parse_param("$name=Picasso").unwrap(),
            ("name".to_string(), Value::from("Picasso"))
        );
        assert!(parse_param("=3").is_err());
        assert!(parse_param("novalue").is_err());
    }

    #[test]
    fn renders_both_forms() {
        let options = RenderCommandOptions {
            expression: "artistName = $name and price > 10".to_string(),
            root: Some("a".to_string()),
            params: vec![("name".to_string(), Value::from("Picasso"))],
        };
        let result = execute_render(&options).unwrap();
        assert_eq!(result.canonical, r#"artistName = "Picasso" and price > 10"#);
        assert_eq!(result.parameterized.text, "a.artistName = ?1 and a.price > ?2");
        assert_eq!(
            result.parameterized.bindings,
            vec![Value::from("Picasso"), Value::Integer(10)]
        );
    }
}
