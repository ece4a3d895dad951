// Customer model
//
// Customers are immutable once created as far as the order workflow is
// concerned: orders reference them by id, nothing in this crate updates
// them afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, StorefrontError};

/// The owner of orders
///
/// `email` is unique across customers; storage enforces this at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Storage-assigned identifier, immutable
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

impl NewCustomer {
    /// Reject blank names and obviously malformed emails
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StorefrontError::InvalidInput(
                "customer name cannot be empty".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(StorefrontError::InvalidInput(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}
