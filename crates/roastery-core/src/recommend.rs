// Recommendation workflow
//
// One recommendation = counter + 1 on the coffee and one `recommend_coffee`
// event, committed together. On failure the transaction is rolled back and
// the error is returned to the caller; nothing is retried.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::coffee::{Coffee, CoffeeId};
use crate::error::Result;
use crate::event::NewEvent;
use crate::traits::TransactionFactory;
use crate::transaction::with_transaction;

#[derive(Clone)]
pub struct RecommendationWorkflow {
    transactions: Arc<dyn TransactionFactory>,
}

impl RecommendationWorkflow {
    pub fn new(transactions: Arc<dyn TransactionFactory>) -> Self {
        Self { transactions }
    }

    /// Recommend `coffee_id` once, returning the coffee with its new count
    #[instrument(skip(self))]
    pub async fn recommend(&self, coffee_id: CoffeeId) -> Result<Coffee> {
        let result = with_transaction(self.transactions.as_ref(), |tx| {
            Box::pin(async move {
                let coffee = tx.increment_recommendations(coffee_id).await?;
                tx.append_event(NewEvent::coffee_recommended(coffee_id))
                    .await?;
                Ok(coffee)
            })
        })
        .await;

        match &result {
            Ok(coffee) => info!(
                coffee_id,
                recommendations = coffee.recommendations,
                "coffee recommended"
            ),
            Err(e) => warn!(coffee_id, error = %e, "recommendation rolled back"),
        }

        result
    }
}
