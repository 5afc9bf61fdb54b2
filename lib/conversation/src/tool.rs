//! Tool registry for conversation mode.
//!
//! A tool pairs a [`ToolDescriptor`], which is what the model sees, with a
//! [`ToolExecutor`] that runs it locally. The [`ToolRegistry`] is the dispatch
//! table from tool name to executor. A name that is not in the table is an
//! ordinary miss that produces [`TOOL_NOT_RECOGNIZED`](crate::error::TOOL_NOT_RECOGNIZED).

use crate::error::ToolError;
use crate::message::ToolCallRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Signed 64-bit integer.
    Integer,
    /// UTF-8 string.
    String,
}

impl ParamType {
    /// Returns the JSON Schema type name.
    #[must_use]
    pub fn json_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
        }
    }
}

/// A named, typed tool parameter. All parameters are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Argument name.
    pub name: String,
    /// Argument type.
    pub param_type: ParamType,
}

/// Definition of a tool the model may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Purpose, shown to the model verbatim.
    pub description: String,
    /// Parameters, in declaration order.
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a required parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.parameters.push(ToolParameter {
            name: name.into(),
            param_type,
        });
        self
    }

    /// Returns the JSON Schema for the argument object.
    #[must_use]
    pub fn input_schema(&self) -> JsonValue {
        let properties: JsonMap<String, JsonValue> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({ "type": p.param_type.json_type() }),
                )
            })
            .collect();
        let required: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Decodes raw JSON arguments and checks them against the parameters.
    ///
    /// Integers also arrive from models as integral floats (`6.0`) or numeric
    /// strings (`"6"`); both are accepted and normalized. Undeclared
    /// arguments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the text is not a JSON
    /// object, or an argument is missing or has the wrong type.
    pub fn validate(&self, raw: &str) -> Result<ToolArguments, ToolError> {
        let invalid = |reason: String| ToolError::InvalidArguments {
            name: self.name.clone(),
            reason,
        };

        let decoded: JsonValue =
            serde_json::from_str(raw).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
        let JsonValue::Object(mut supplied) = decoded else {
            return Err(invalid("expected a JSON object".to_string()));
        };

        let mut values = JsonMap::new();
        for param in &self.parameters {
            let value = supplied
                .remove(&param.name)
                .ok_or_else(|| invalid(format!("missing required argument '{}'", param.name)))?;
            let value = match param.param_type {
                ParamType::Integer => coerce_integer(&value)
                    .map(|n| JsonValue::Number(Number::from(n)))
                    .ok_or_else(|| {
                        invalid(format!("argument '{}' must be an integer", param.name))
                    })?,
                ParamType::String if value.is_string() => value,
                ParamType::String => {
                    return Err(invalid(format!("argument '{}' must be a string", param.name)));
                }
            };
            values.insert(param.name.clone(), value);
        }

        Ok(ToolArguments {
            tool: self.name.clone(),
            values,
        })
    }
}

fn coerce_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // i64::MAX is not representable; the bound is exclusive.
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Arguments that passed [`ToolDescriptor::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    tool: String,
    values: JsonMap<String, JsonValue>,
}

impl ToolArguments {
    /// Returns an integer argument.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the argument is absent or
    /// was not declared as an integer.
    pub fn integer(&self, name: &str) -> Result<i64, ToolError> {
        self.values
            .get(name)
            .and_then(JsonValue::as_i64)
            .ok_or_else(|| self.missing(name, "integer"))
    }

    /// Returns a string argument.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the argument is absent or
    /// was not declared as a string.
    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        self.values
            .get(name)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| self.missing(name, "string"))
    }

    fn missing(&self, name: &str, kind: &str) -> ToolError {
        ToolError::InvalidArguments {
            name: self.tool.clone(),
            reason: format!("no {kind} argument '{name}'"),
        }
    }
}

/// A locally executable tool.
///
/// Executors only compute a result; they never see or touch the transcript.
/// Failures the model should hear about, such as an unreachable service,
/// belong in the returned `Ok` text.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Executes the tool with validated arguments.
    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError>;
}

/// Dispatch table of available tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: impl ToolExecutor + 'static) {
        let descriptor = tool.descriptor().clone();
        self.descriptors.retain(|d| d.name != descriptor.name);
        self.executors.insert(descriptor.name.clone(), Arc::new(tool));
        self.descriptors.push(descriptor);
    }

    /// Registers a tool, builder style.
    #[must_use]
    pub fn with(mut self, tool: impl ToolExecutor + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Gets a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ToolExecutor> {
        self.executors.get(name).map(|tool| tool.as_ref())
    }

    /// Returns all descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Looks up, validates and executes one request.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotRecognized`] for an unknown name, otherwise
    /// whatever validation or the executor reports.
    pub async fn try_dispatch(&self, call: &ToolCallRequest) -> Result<String, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::NotRecognized {
            name: call.name.clone(),
        })?;
        let arguments = tool.descriptor().validate(&call.arguments)?;
        tool.execute(&arguments).await
    }

    /// Executes one request and always yields the tool-result text.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> String {
        match self.try_dispatch(call).await {
            Ok(output) => {
                debug!(tool = %call.name, id = %call.id, "tool executed");
                output
            }
            Err(e) => {
                warn!(tool = %call.name, id = %call.id, error = %e, "tool call rejected");
                e.tool_result()
            }
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.descriptors.iter().map(|d| &d.name).collect::<Vec<_>>())
            .finish()
    }
}
