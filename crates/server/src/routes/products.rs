//! Product CRUD handlers.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::get,
};
use serde::Serialize;

use crate::error::AppError;
use crate::models::Product;
use crate::state::AppState;
use crate::storage::{PRODUCTS_FOLDER, normalize_asset_id};
use crate::upload::{self, IMAGE_FORMATS};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            axum::routing::put(update_product).delete(delete_product),
        )
}

/// Response for create/update operations.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

/// Response for delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// `GET /products` - the full collection, empty if absent.
///
/// # Errors
///
/// Fails only on document store I/O errors.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products: Vec<Product> = state
        .documents()
        .ensure(Product::COLLECTION, Vec::new())
        .await?;
    Ok(Json(products))
}

/// `POST /products` - create a product from a multipart submission.
///
/// The image upload (and its validation) happens before the collection
/// is read, so a rejected file leaves the collection untouched.
///
/// # Errors
///
/// 400 when the `image` file is missing or invalid; 500 on store I/O.
pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let form = upload::read_form(multipart, "image").await?;
    let file = form.require_file("image")?;

    let asset = upload::store_image(state.blobs(), PRODUCTS_FOLDER, file, IMAGE_FORMATS).await?;

    let product = Product {
        id: upload::now_millis(),
        name: form.text_owned("name").unwrap_or_default(),
        price: form.text_owned("price").unwrap_or_default(),
        description: form.text_owned("description").unwrap_or_default(),
        image_url: asset.url,
        asset_id: asset.asset_id,
    };

    let mut products: Vec<Product> = state
        .documents()
        .ensure(Product::COLLECTION, Vec::new())
        .await?;
    products.push(product.clone());
    state.documents().save(Product::COLLECTION, &products).await?;

    tracing::info!(product_id = product.id, "product created");
    Ok(Json(ProductResponse {
        message: "Product added".to_string(),
        product,
    }))
}

/// `PUT /products/{id}` - partial update; optional replacement image.
///
/// Supplied fields replace stored ones, missing fields are retained.
/// When a new image arrives the old blob is deleted best-effort before
/// the replacement is stored.
///
/// # Errors
///
/// 404 for an unknown id (checked before any write); 400 for an invalid
/// replacement image; 500 on store I/O.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let form = upload::read_form(multipart, "image").await?;

    let mut products: Vec<Product> = state
        .documents()
        .ensure(Product::COLLECTION, Vec::new())
        .await?;
    let index = products
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if let Some(file) = &form.file {
        upload::validate_image(file, IMAGE_FORMATS)?;

        let old_id = deletion_asset_id(&products[index]);
        upload::discard_asset(state.blobs(), &old_id).await;

        let asset =
            upload::store_image(state.blobs(), PRODUCTS_FOLDER, file, IMAGE_FORMATS).await?;
        products[index].image_url = asset.url;
        products[index].asset_id = asset.asset_id;
    }

    products[index].apply_update(
        form.non_empty("name"),
        form.non_empty("price"),
        form.non_empty("description"),
    );

    let product = products[index].clone();
    state.documents().save(Product::COLLECTION, &products).await?;

    tracing::info!(product_id = id, "product updated");
    Ok(Json(ProductResponse {
        message: "Product updated".to_string(),
        product,
    }))
}

/// `DELETE /products/{id}` - remove a product and its image.
///
/// The blob delete is best-effort: a provider failure is logged and the
/// record is removed regardless.
///
/// # Errors
///
/// 404 for an unknown id; 500 on document store I/O.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let mut products: Vec<Product> = state
        .documents()
        .ensure(Product::COLLECTION, Vec::new())
        .await?;
    let index = products
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let asset_id = deletion_asset_id(&products[index]);
    upload::discard_asset(state.blobs(), &asset_id).await;

    products.remove(index);
    state.documents().save(Product::COLLECTION, &products).await?;

    tracing::info!(product_id = id, "product deleted");
    Ok(Json(DeleteResponse {
        message: "Product deleted".to_string(),
    }))
}

/// Derive the blob id to delete for a product.
///
/// Prefers the stored `assetId`; falls back to the last segment of the
/// image URL for records written before asset ids were persisted. Either
/// way the reference goes through the normalization rule, since stored
/// references may carry an extension or lack the folder prefix.
fn deletion_asset_id(product: &Product) -> String {
    let raw = if product.asset_id.is_empty() {
        product
            .image_url
            .rsplit('/')
            .next()
            .unwrap_or_default()
    } else {
        product.asset_id.as_str()
    };
    normalize_asset_id(raw, PRODUCTS_FOLDER)
}
