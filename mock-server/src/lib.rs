//! In-memory REST backend serving arbitrary collections of JSON records.
//!
//! Every path segment names a collection: `GET /notes` lists it,
//! `POST /notes` appends a record with a fresh id, and `/notes/{id}` supports
//! `GET`, `PUT` (replace all fields) and `DELETE`. Collections spring into
//! existence on first use and keep insertion order.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// A stored record. Serializes as a flat object with an `id` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Serve an existing store, e.g. one pre-filled with `seed`.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(db)
}

/// Insert records with known ids into `resource`.
pub async fn seed(db: &Db, resource: &str, records: impl IntoIterator<Item = Record>) {
    db.write()
        .await
        .entry(resource.to_string())
        .or_default()
        .extend(records);
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

async fn list_records(State(db): State<Db>, Path(resource): Path<String>) -> Json<Vec<Record>> {
    let db = db.read().await;
    Json(db.get(&resource).cloned().unwrap_or_default())
}

async fn create_record(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(mut fields): Json<Map<String, Value>>,
) -> (StatusCode, Json<Record>) {
    fields.remove("id");
    let record = Record {
        id: Uuid::new_v4().to_string(),
        fields,
    };
    debug!(%resource, id = %record.id, "created record");
    db.write()
        .await
        .entry(resource)
        .or_default()
        .push(record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, StatusCode> {
    let db = db.read().await;
    db.get(&resource)
        .and_then(|records| records.iter().find(|r| r.id == id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(mut fields): Json<Map<String, Value>>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let record = db
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| r.id == id))
        .ok_or(StatusCode::NOT_FOUND)?;
    fields.remove("id");
    record.fields = fields;
    debug!(%resource, %id, "updated record");
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> StatusCode {
    let mut db = db.write().await;
    let Some(records) = db.get_mut(&resource) else {
        return StatusCode::NOT_FOUND;
    };
    match records.iter().position(|r| r.id == id) {
        Some(index) => {
            records.remove(index);
            debug!(%resource, %id, "deleted record");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}
