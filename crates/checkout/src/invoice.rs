//! Plain-text order invoices.

use domain::Customer;
use serde::Serialize;
use store::Order;

const SEPARATOR_WIDTH: usize = 50;
const STORE_NAME: &str = "Supadupastore";

/// A rendered invoice, ready to hand to a mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Invoice {
    /// Renders the invoice for a completed order.
    pub fn render(customer: &Customer, order: &Order) -> Self {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut body = format!(
            "Dear {},\n\n\
             Thank you for your order! Here is your invoice:\n\n\
             Order #{}\n\
             Date: {}\n\n\
             Items:\n\
             {separator}\n",
            customer.username,
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
        );

        for item in &order.items {
            body.push_str(&format!(
                "{}\n  Quantity: {}\n  Price: {}\n  Subtotal: {}\n\n",
                item.product_name,
                item.quantity,
                item.price,
                item.subtotal(),
            ));
        }

        body.push_str(&format!(
            "{separator}\n\
             Total: {}\n\n\
             Thank you for shopping with {STORE_NAME}!\n\n\
             Best regards,\n{STORE_NAME} Team",
            order.total_amount
        ));

        Self {
            to: customer.email.clone(),
            subject: format!("Order Confirmation - Order #{}", order.id),
            body,
        }
    }
}
