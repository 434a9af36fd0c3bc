//! Product type catalogue endpoints
//!
//! All calls carry the bearer token; the listing rejects anonymous callers.

use super::{ClientError, FetchClient, FetchOptions, RequestBody};
use crate::types::{
    CreatedResponse, MessageResponse, ProductType, ProductTypeInput, ProductTypePage,
    ProductTypeQuery, ProductTypeStatusUpdate,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const PRODUCT_TYPES_PATH: &str = "v1/tipo-producto/";

fn item_path(id: i64) -> String {
    format!("{PRODUCT_TYPES_PATH}{id}/")
}

fn status_path(id: i64) -> String {
    format!("{PRODUCT_TYPES_PATH}{id}/estado/")
}

impl FetchClient {
    /// List product types matching `query`, ordered by name
    pub async fn list_product_types(
        &self,
        query: &ProductTypeQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<ProductTypePage, ClientError> {
        let mut options = FetchOptions::get().authenticated();
        options.query = query.pairs();
        options.cancel = cancel;

        let value = self.fetch_json(PRODUCT_TYPES_PATH, options).await?;
        Ok(ProductTypePage::from_value(value)?)
    }

    pub async fn get_product_type(&self, id: i64) -> Result<ProductType, ClientError> {
        self.fetch(&item_path(id), FetchOptions::get().authenticated())
            .await
    }

    pub async fn create_product_type(
        &self,
        input: &ProductTypeInput,
    ) -> Result<CreatedResponse, ClientError> {
        let created: CreatedResponse = self
            .fetch(
                PRODUCT_TYPES_PATH,
                FetchOptions::post(RequestBody::json(input)?).authenticated(),
            )
            .await?;
        info!(id = created.id, nombre = %input.nombre, "Product type created");
        Ok(created)
    }

    /// Replace name, description and status
    pub async fn update_product_type(
        &self,
        id: i64,
        input: &ProductTypeInput,
    ) -> Result<MessageResponse, ClientError> {
        let response = self
            .fetch(
                &item_path(id),
                FetchOptions::put(RequestBody::json(input)?).authenticated(),
            )
            .await?;
        info!(id, "Product type updated");
        Ok(response)
    }

    /// Activate or deactivate; the server cascades the state to its products
    pub async fn set_product_type_active(
        &self,
        id: i64,
        activo: bool,
    ) -> Result<MessageResponse, ClientError> {
        let body = RequestBody::json(&ProductTypeStatusUpdate { activo })?;
        let response = self
            .fetch(&status_path(id), FetchOptions::patch(body).authenticated())
            .await?;
        info!(id, activo, "Product type status changed");
        Ok(response)
    }

    pub async fn delete_product_type(&self, id: i64) -> Result<(), ClientError> {
        self.fetch_json(&item_path(id), FetchOptions::delete().authenticated())
            .await?;
        info!(id, "Product type deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(item_path(7), "v1/tipo-producto/7/");
        assert_eq!(status_path(7), "v1/tipo-producto/7/estado/");
    }
}
