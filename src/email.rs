//! Transactional email client and invoice rendering.
//!
//! The email API accepts `{sender, to, subject, htmlContent}` and returns a
//! message id. Invoice sending is best-effort; callers log failures.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::domain::order::{NewOrderItem, Order, PaymentMethod};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    sender_name: String,
    sender_address: String,
}

impl Mailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.api_key) {
            headers.insert("api-key", value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            sender_name: config.sender_name.clone(),
            sender_address: config.sender_address.clone(),
        })
    }

    /// Sends one HTML email and returns the provider's message id.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, EmailError> {
        let body = json!({
            "sender": { "name": self.sender_name, "email": self.sender_address },
            "to": [{ "email": to }],
            "subject": subject,
            "htmlContent": html,
        });

        let response = self.client.post(&self.api_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        #[derive(Deserialize)]
        struct SendResponse {
            #[serde(rename = "messageId")]
            message_id: String,
        }
        let sent: SendResponse = response.json().await?;
        Ok(sent.message_id)
    }
}

/// Renders the invoice for a freshly placed order.
pub fn invoice_html(order: &Order, items: &[NewOrderItem]) -> String {
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td align=\"right\">{}</td><td align=\"right\">{}</td></tr>",
            escape(&item.product_name),
            item.quantity,
            item.unit_price,
            item.total_price,
        ));
    }

    let payment = payment_label(&order.payment_method);

    format!(
        "<html><body style=\"font-family:Arial,sans-serif;color:#222\">\
         <h2>Order {number}</h2>\
         <p>Thanks for your order, {name}!</p>\
         <p>Shipping to: {address}</p>\
         <table width=\"100%\" cellpadding=\"6\" style=\"border-collapse:collapse\">\
         <tr><th align=\"left\">Item</th><th align=\"left\">Qty</th>\
         <th align=\"right\">Unit</th><th align=\"right\">Total</th></tr>\
         {rows}\
         </table>\
         <p>Subtotal: {subtotal} BDT<br>\
         Discount: -{discount} BDT<br>\
         Shipping: {shipping} BDT<br>\
         <strong>Total: {total} BDT</strong></p>\
         <p>Payment method: {payment}</p>\
         </body></html>",
        number = escape(&order.order_number),
        name = escape(&order.customer_name),
        address = escape(&order.shipping_address),
        rows = rows,
        subtotal = order.subtotal,
        discount = order.discount_amount,
        shipping = order.shipping_cost,
        total = order.total,
        payment = payment,
    )
}

/// Invoice label for a stored payment-method string.
fn payment_label(stored: &str) -> &'static str {
    match stored {
        "bkash" => PaymentMethod::Bkash.label(),
        _ => PaymentMethod::Cod.label(),
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_invoice_contains_order_details() {
        let order = Order {
            id: Uuid::new_v4(),
            order_number: "ORD-20260806-0042".to_string(),
            user_id: None,
            status: "pending".to_string(),
            subtotal: Decimal::from(1000),
            discount_amount: Decimal::from(100),
            shipping_cost: Decimal::from(60),
            total: Decimal::from(960),
            payment_method: "cod".to_string(),
            payment_status: "pending".to_string(),
            payment_trx_id: None,
            customer_name: "Rahim <Uddin>".to_string(),
            contact_number: "01712345678".to_string(),
            shipping_address: "House 7, Banani, Dhaka".to_string(),
            delivery_location: "inside".to_string(),
            discount_code: Some("SAVE10".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![NewOrderItem {
            product_id: Uuid::new_v4(),
            product_name: "Shirt & Tie".to_string(),
            product_sku: "SKU-SHIRT".to_string(),
            quantity: 2,
            unit_price: Decimal::from(500),
            total_price: Decimal::from(1000),
        }];

        let html = invoice_html(&order, &items);
        assert!(html.contains("ORD-20260806-0042"));
        assert!(html.contains("Shirt &amp; Tie"));
        assert!(html.contains("Rahim &lt;Uddin&gt;"));
        assert!(html.contains("Cash on Delivery"));
        assert!(html.contains("Total: 960"));
    }
}
