//! Four-function arithmetic.

use serde_json::{Value, json};
use toolchat_core::tools::{CALCULATOR, CalculatorArgs, Operation, ToolResult};

use crate::tool::Tool;

pub struct CalculatorTool;

impl Tool for CalculatorTool {
    type Args = CalculatorArgs;

    fn name(&self) -> &'static str {
        CALCULATOR
    }

    fn description(&self) -> &'static str {
        "Perform basic arithmetic (add, subtract, multiply, divide) on two numbers"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["operation", "a", "b"],
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide"],
                    "description": "The arithmetic operation to perform"
                },
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" }
            }
        })
    }

    fn run(&self, args: &CalculatorArgs) -> ToolResult {
        match evaluate(args.operation, args.a, args.b) {
            Ok(value) => ToolResult::text(format!(
                "{} {} {} = {}",
                format_number(args.a),
                args.operation.symbol(),
                format_number(args.b),
                format_number(value)
            )),
            Err(message) => ToolResult::error(message),
        }
    }
}

/// Compute `a <op> b`. Never yields NaN or infinity.
pub fn evaluate(operation: Operation, a: f64, b: f64) -> Result<f64, String> {
    let value = match operation {
        Operation::Add => a + b,
        Operation::Subtract => a - b,
        Operation::Multiply => a * b,
        Operation::Divide => {
            if b == 0.0 {
                return Err("Error: Division by zero is not allowed".to_string());
            }
            a / b
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("Error: result of {operation} is out of range"))
    }
}

/// Render integral values without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let int = value as i64;
        int.to_string()
    } else {
        let rendered = format!("{value:.6}");
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
