//! Evaluate expressions against JSON input

use super::CliError;
use crate::{
    Evaluator, Lexer, Parser,
    json::{JsonObjectModel, json_to_value, value_to_json},
    value::Value,
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed; carries the canonical form
    SyntaxValid(String),
    /// Evaluation result, or the matching elements of an input array
    Success(serde_json::Value),
}

/// Execute a check operation
///
/// An input array is filtered: the output holds the elements the expression
/// matches. Any other input is evaluated and the result printed.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let lexer = Lexer::new(&options.expression);
    let expr = Parser::new(lexer)?.parse()?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid(expr.to_string()));
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;

    let model = JsonObjectModel::new();
    let evaluator = Evaluator::new(&model);

    let output = match json_to_value(json_value) {
        Value::List(items) => {
            let matched = evaluator.filter(&expr, &items)?;
            log::debug!("{} of {} element(s) matched", matched.len(), items.len());
            serde_json::Value::Array(matched.into_iter().map(value_to_json).collect())
        }
        subject => value_to_json(&evaluator.evaluate(&expr, &subject)?),
    };
    Ok(CheckResult::Success(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(expression: &str, input: &str) -> serde_json::Value {
        let options = CheckOptions {
            expression: expression.to_string(),
            input: Some(input.to_string()),
            ..Default::default()
        };
        match execute_check(&options).unwrap() {
            CheckResult::Success(v) => v,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn filters_arrays() {
        let out = check("age > 30", r#"[{"age": 25}, {"age": 40}]"#);
        assert_eq!(out, serde_json::json!([{"age": 40}]));
    }

    #[test]
    fn evaluates_objects() {
        assert_eq!(check("a.b * 2", r#"{"a": {"b": 21}}"#), serde_json::json!(42));
    }

    #[test]
    fn syntax_only_returns_canonical_form() {
        let options = CheckOptions {
            expression: "x = 'y'".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        match execute_check(&options).unwrap() {
            CheckResult::SyntaxValid(text) => assert_eq!(text, r#"x = "y""#),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_input() {
        let options = CheckOptions {
            expression: "a = 1".to_string(),
            ..Default::default()
        };
        assert!(matches!(execute_check(&options), Err(CliError::NoInput)));
    }
}
