//! Record types for the six entities of the sales dataset.
//!
//! Field names match the column names declared in [`crate::sales_schema`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub category: Category,
    /// Unit price rounded to 2 decimals.
    pub price: f64,
    pub stock_quantity: i64,
    pub supplier_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sale_id: i64,
    pub customer_id: i64,
    pub employee_id: i64,
    pub sale_date: NaiveDate,
    /// Sum of `price * quantity` over the sale's line items, rounded to 2 decimals.
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
}

/// One row of `order_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub order_detail_id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Apparel,
    Books,
    #[serde(rename = "Home Goods")]
    HomeGoods,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Apparel,
        Category::Books,
        Category::HomeGoods,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Apparel => "Apparel",
            Category::Books => "Books",
            Category::HomeGoods => "Home Goods",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Cash,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_labels_match_stored_text() {
        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(categories, ["Electronics", "Apparel", "Books", "Home Goods"]);

        let json = serde_json::to_string(&PaymentMethod::BankTransfer).expect("serialize");
        assert_eq!(json, "\"Bank Transfer\"");
        assert_eq!(PaymentMethod::CreditCard.to_string(), "Credit Card");
    }
}
