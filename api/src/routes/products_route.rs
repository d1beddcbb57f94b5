//! GET /products and GET /products/{id}: catalog listing for the shop frontend.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use grounding::ItemInfo;
use serde::Serialize;

use crate::{core::app_state::AppState, error_handler::AppError, error_handler::AppResult};

/// One catalog entry with its id.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i64,
    #[serde(flatten)]
    pub info: ItemInfo,
}

/// Handler: GET /products, ascending by id.
pub async fn list_products(State(state): State<Arc<AppState>>) -> Json<Vec<ProductView>> {
    let items = state
        .catalog
        .items()
        .into_iter()
        .map(|(id, info)| ProductView {
            id,
            info: info.clone(),
        })
        .collect();
    Json(items)
}

/// Handler: GET /products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductView>> {
    let info = state.catalog.get(id).ok_or(AppError::ItemNotFound(id))?;
    Ok(Json(ProductView {
        id,
        info: info.clone(),
    }))
}
