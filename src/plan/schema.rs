//! JSON Schema (Draft-07) for orchestration requests.

use serde_json::{json, Map, Value};

use super::step::StepName;

/// Schema of the request document accepted by [`OrchestrationRequest`].
///
/// [`OrchestrationRequest`]: super::OrchestrationRequest
pub fn request_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "clinflow orchestration request",
        "description": "Which pipeline steps to run, with per-step options",
        "type": "object",
        "properties": {
            "steps": steps_schema(),
            "context": {
                "type": "object",
                "description": "Opaque data handed to every executor"
            }
        }
    })
}

fn steps_schema() -> Value {
    let properties: Map<String, Value> = StepName::ALL
        .into_iter()
        .map(|step| (step.as_str().to_string(), step_schema(step)))
        .collect();

    json!({
        "type": "object",
        "description": "Steps to enable; absent or false means disabled",
        "properties": properties,
        "additionalProperties": false
    })
}

fn step_schema(step: StepName) -> Value {
    let requires: Vec<&str> = step.dependencies().iter().map(|d| d.as_str()).collect();
    let description = if requires.is_empty() {
        "No dependencies".to_string()
    } else {
        format!("Requires {}", requires.join(", "))
    };

    json!({
        "description": description,
        "oneOf": [
            { "type": "boolean" },
            {
                "type": "object",
                "description": "Options for the step; an empty object leaves it disabled"
            },
            { "type": "null" }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_step() {
        let schema = request_schema();
        let steps = schema["properties"]["steps"]["properties"]
            .as_object()
            .unwrap();
        assert_eq!(steps.len(), StepName::ALL.len());
        assert!(steps.contains_key("scheduleCall"));
    }

    #[test]
    fn unknown_steps_are_disallowed() {
        let schema = request_schema();
        assert_eq!(
            schema["properties"]["steps"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn descriptions_name_dependencies() {
        let schema = request_schema();
        let prepare = &schema["properties"]["steps"]["properties"]["prepareEmail"];
        assert_eq!(prepare["description"], "Requires generateSummary");
        let ingest = &schema["properties"]["steps"]["properties"]["ingest"];
        assert_eq!(ingest["description"], "No dependencies");
    }
}
