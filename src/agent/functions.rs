use serde_json::json;

use crate::model::FunctionSpec;

pub const GET_RANDOM_FACT: &str = "get_random_fact";

pub fn available_functions() -> Vec<FunctionSpec> {
    vec![FunctionSpec {
        name: GET_RANDOM_FACT.to_string(),
        description: "Fetches a random useless fact from the public facts API.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {},
        }),
    }]
}
