use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::model::{ModelHandle, Validate};
use crate::error::{FinderError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceOffer {
    pub retailer_name: String,
    pub price: f64,
    pub product_url: String,
}

#[derive(Debug, Deserialize)]
struct PriceOutput {
    prices: Vec<PriceOffer>,
}

impl Validate for PriceOutput {
    fn validate(&self) -> std::result::Result<(), String> {
        for offer in &self.prices {
            if !offer.price.is_finite() || offer.price < 0.0 {
                return Err(format!(
                    "invalid price {} for {}",
                    offer.price, offer.retailer_name
                ));
            }
        }
        Ok(())
    }
}

fn output_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "prices": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "retailerName": { "type": "STRING" },
                        "price": { "type": "NUMBER", "description": "Price as a number, e.g. 59.99." },
                        "productUrl": { "type": "STRING", "description": "Direct link to the product page." }
                    },
                    "required": ["retailerName", "price", "productUrl"]
                }
            }
        },
        "required": ["prices"]
    })
}

fn prompt(game_name: &str) -> String {
    format!(
        "You are an expert video game price aggregation service.\n\
         Find the price of the game below at major online retailers such as Steam, Amazon, \
         Instant Gaming and the PlayStation Store.\n\
         For each retailer give its name, the price as a number and a direct product link.\n\
         If you cannot find any price, return an empty array.\n\n\
         Game: {game_name}"
    )
}

/// Retailer prices for `game_name`. `Ok(vec![])` means no prices were found; any
/// failure to obtain or validate a reply is an `Err`.
#[instrument(skip(model))]
pub async fn aggregate_prices(model: &ModelHandle, game_name: &str) -> Result<Vec<PriceOffer>> {
    let game_name = game_name.trim();
    if game_name.is_empty() {
        return Err(FinderError::InvalidInput("game name is empty".to_string()));
    }
    let output: PriceOutput = model
        .generate_structured(&prompt(game_name), &output_schema())
        .await?;
    info!(target: "advisor", offers = output.prices.len(), "price lookup completed");
    Ok(output.prices)
}
