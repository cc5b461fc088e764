//! API description served at the public documentation path.

use axum::Json;
use serde_json::{json, Value};

/// GET /v3/api-docs - OpenAPI description of the auth endpoints.
pub async fn api_docs() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let principal = json!({ "$ref": "#/components/schemas/Principal" });
    let error = json!({ "$ref": "#/components/schemas/Error" });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Admin Auth API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/auth/register": {
                "post": {
                    "summary": "Register an administrator",
                    "requestBody": body_ref("RegisterRequest"),
                    "responses": {
                        "200": response("Registered principal", principal.clone()),
                        "400": response("Duplicate identity or invalid input", error.clone()),
                    }
                }
            },
            "/auth/login": {
                "post": {
                    "summary": "Exchange credentials for a bearer token",
                    "requestBody": body_ref("LoginRequest"),
                    "responses": {
                        "200": response("Issued token", json!({ "$ref": "#/components/schemas/LoginResponse" })),
                        "401": response("Invalid credentials", error.clone()),
                    }
                }
            },
            "/admin/me": {
                "get": {
                    "summary": "The calling administrator",
                    "security": [{ "bearerAuth": [] }],
                    "responses": {
                        "200": response("Authenticated principal", principal.clone()),
                        "401": response("Missing or invalid token", error),
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            },
            "schemas": {
                "RegisterRequest": object(&["identityKey", "displayName", "secret"]),
                "LoginRequest": object(&["identityKey", "secret"]),
                "Principal": object(&["id", "displayName", "identityKey"]),
                "LoginResponse": {
                    "type": "object",
                    "required": ["token", "principal", "expiresInMs"],
                    "properties": {
                        "token": { "type": "string" },
                        "principal": principal,
                        "expiresInMs": { "type": "integer", "format": "int64" },
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": {
                        "error": {
                            "type": "object",
                            "required": ["code", "numeric_code", "message"],
                            "properties": {
                                "code": { "type": "string" },
                                "numeric_code": { "type": "integer" },
                                "message": { "type": "string" },
                                "details": { "type": "object" },
                            }
                        }
                    }
                }
            }
        }
    })
}

fn body_ref(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } }
        }
    })
}

fn response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn object(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "string" })))
        .collect();

    json!({ "type": "object", "required": fields, "properties": properties })
}
