use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataItem {
    pub name: String,
    pub value: i64,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "reqmeter" }))
}

pub async fn get_data() -> Json<Value> {
    let sample = DataItem {
        name: "test".into(),
        value: 1,
    };
    Json(json!({ "message": "Data retrieved", "data": [sample] }))
}

/// Echo a posted item. Malformed bodies are rejected by the `Json` extractor.
pub async fn post_data(Json(item): Json<DataItem>) -> Json<Value> {
    Json(json!({ "message": "Data processed", "received": item }))
}
