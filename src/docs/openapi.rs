//! OpenAPI document generation
//!
//! Every student endpoint is described once in [`ENDPOINTS`]; the OpenAPI 3.0
//! document served to Swagger UI is assembled from that table.

use serde_json::{json, Map, Value};

pub const API_TITLE: &str = "Student CRUD API";
pub const API_VERSION: &str = "1.0.0";

/// Request body accepted by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBody {
    /// Full student with `name` and `age` both required
    NewStudent,
    /// Replacement fields, none required
    ReplaceStudent,
}

/// Description of one documented endpoint
#[derive(Debug)]
pub struct EndpointDoc {
    pub method: &'static str,
    /// OpenAPI path template, e.g. `/students/{id}`
    pub path: &'static str,
    pub summary: &'static str,
    pub request_body: Option<RequestBody>,
    pub responses: &'static [(u16, &'static str)],
}

pub const ENDPOINTS: &[EndpointDoc] = &[
    EndpointDoc {
        method: "post",
        path: "/students",
        summary: "Create a new student",
        request_body: Some(RequestBody::NewStudent),
        responses: &[(201, "Student created successfully")],
    },
    EndpointDoc {
        method: "get",
        path: "/students",
        summary: "Get all students",
        request_body: None,
        responses: &[(200, "List of students")],
    },
    EndpointDoc {
        method: "get",
        path: "/students/{id}",
        summary: "Get a student by ID",
        request_body: None,
        responses: &[(200, "Student found"), (404, "Student not found")],
    },
    EndpointDoc {
        method: "put",
        path: "/students/{id}",
        summary: "Update a student by ID",
        request_body: Some(RequestBody::ReplaceStudent),
        responses: &[
            (200, "Student updated successfully"),
            (404, "Student not found"),
        ],
    },
    EndpointDoc {
        method: "delete",
        path: "/students/{id}",
        summary: "Delete a student by ID",
        request_body: None,
        responses: &[(204, "Student deleted successfully")],
    },
];

impl RequestBody {
    fn schema(self) -> Value {
        match self {
            Self::NewStudent => json!({
                "type": "object",
                "required": ["name", "age"],
                "properties": {
                    "name": { "type": "string", "example": "Alice" },
                    "age": { "type": "integer", "example": 20 }
                }
            }),
            Self::ReplaceStudent => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "age": { "type": "integer" }
                }
            }),
        }
    }
}

impl EndpointDoc {
    /// Names of `{param}` segments in the path template
    fn path_params(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
    }

    fn operation(&self) -> Value {
        let mut op = Map::new();
        op.insert("summary".to_string(), json!(self.summary));

        let params: Vec<Value> = self
            .path_params()
            .map(|name| {
                json!({
                    "in": "path",
                    "name": name,
                    "required": true,
                    "schema": { "type": "integer" }
                })
            })
            .collect();
        if !params.is_empty() {
            op.insert("parameters".to_string(), Value::Array(params));
        }

        if let Some(body) = self.request_body {
            op.insert(
                "requestBody".to_string(),
                json!({
                    "required": true,
                    "content": {
                        "application/json": { "schema": body.schema() }
                    }
                }),
            );
        }

        let responses: Map<String, Value> = self
            .responses
            .iter()
            .map(|(code, description)| (code.to_string(), json!({ "description": description })))
            .collect();
        op.insert("responses".to_string(), Value::Object(responses));

        Value::Object(op)
    }
}

/// Build the OpenAPI document for all student endpoints
pub fn build_document() -> Value {
    let mut paths: Map<String, Value> = Map::new();
    for endpoint in ENDPOINTS {
        let item = paths
            .entry(endpoint.path)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = item {
            methods.insert(endpoint.method.to_string(), endpoint.operation());
        }
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": API_TITLE,
            "version": API_VERSION
        },
        "paths": paths
    })
}
