//! StockUpdateHandler — applies stock decrements from `stock_update` jobs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use venda_core::{Error, InventoryService, JobPayload, JobTopic, Result};

use crate::handler::JobHandler;

pub struct StockUpdateHandler {
    inventory: Arc<dyn InventoryService>,
}

impl StockUpdateHandler {
    pub fn new(inventory: Arc<dyn InventoryService>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl JobHandler for StockUpdateHandler {
    fn topic(&self) -> JobTopic {
        JobTopic::StockUpdate
    }

    async fn execute(&self, payload: JobPayload) -> Result<()> {
        let JobPayload::StockUpdate(update) = payload else {
            return Err(Error::InvalidInput(
                "stock_update handler received a payload for another topic".to_string(),
            ));
        };

        debug!(
            product_id = update.product_id,
            quantity = update.quantity,
            "Applying stock decrement"
        );

        self.inventory
            .update_stock(update.product_id, update.quantity)
            .await
    }
}
