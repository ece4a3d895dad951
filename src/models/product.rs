// Product catalog model
//
// ## Money Representation
//
// Prices are stored as `price_cents: i64` - integer minor currency units.
// Integers keep arithmetic exact; a line subtotal is just
// `unit_price_cents * quantity` with no rounding surprises.
//
// ## Patch Semantics
//
// Partial updates go through [`ProductUpdate`], a struct with one `Option`
// field per mutable attribute. A field that is `None` is **left unchanged**;
// it is never conflated with "set to empty". The one thing this patch shape
// cannot express is clearing `description` back to `None` - callers that
// need that would require a dedicated operation, which nothing has asked
// for yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, StorefrontError};

/// A catalog item that can be ordered while stock remains
///
/// ## Invariants
///
/// - `price_cents >= 0` and `stock >= 0`, enforced at every mutation path
/// - `stock` is only ever decremented inside the storage commit of an
///   order placement, after a sufficiency re-check
/// - `id` is assigned by storage and never changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Storage-assigned identifier, immutable
    pub id: i64,
    /// Display title
    pub title: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Unit price in minor currency units, non-negative
    pub price_cents: i64,
    /// Units on hand, non-negative
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Apply a validated patch, bumping `updated_at`
    ///
    /// Only fields explicitly present in the patch are written. Call
    /// [`ProductUpdate::validate`] first; this method assumes the patch
    /// carries no negative values.
    pub fn apply(&mut self, patch: ProductUpdate) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price_cents) = patch.price_cents {
            self.price_cents = price_cents;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        self.updated_at = Utc::now();
    }
}

/// Payload for creating a new product
///
/// The `id` and timestamps are assigned by storage, so creation takes a
/// separate type rather than a half-initialized [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
}

impl NewProduct {
    /// Reject negative money or stock before anything touches storage
    pub fn validate(&self) -> Result<()> {
        if self.price_cents < 0 {
            return Err(StorefrontError::InvalidInput(format!(
                "price_cents must be >= 0, got {}",
                self.price_cents
            )));
        }
        if self.stock < 0 {
            return Err(StorefrontError::InvalidInput(format!(
                "stock must be >= 0, got {}",
                self.stock
            )));
        }
        Ok(())
    }
}

/// Explicit optional-field patch for a product
///
/// Each mutable attribute has its own named `Option` field. `None` means
/// "leave as is" - there is no dynamic attribute merging anywhere in the
/// codebase, so a typo'd field name is a compile error, not a silent no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

impl ProductUpdate {
    /// Validate whichever fields are present
    pub fn validate(&self) -> Result<()> {
        if let Some(price_cents) = self.price_cents {
            if price_cents < 0 {
                return Err(StorefrontError::InvalidInput(format!(
                    "price_cents must be >= 0, got {}",
                    price_cents
                )));
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(StorefrontError::InvalidInput(format!(
                    "stock must be >= 0, got {}",
                    stock
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            title: "Widget".to_string(),
            description: Some("A fine widget".to_string()),
            price_cents: 500,
            stock: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_product_rejects_negative_values() {
        let bad_price = NewProduct {
            title: "Widget".to_string(),
            description: None,
            price_cents: -1,
            stock: 0,
        };
        assert!(matches!(
            bad_price.validate(),
            Err(StorefrontError::InvalidInput(_))
        ));

        let bad_stock = NewProduct {
            title: "Widget".to_string(),
            description: None,
            price_cents: 0,
            stock: -5,
        };
        assert!(matches!(
            bad_stock.validate(),
            Err(StorefrontError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut product = sample_product();
        let before = product.clone();

        let patch = ProductUpdate {
            price_cents: Some(750),
            ..Default::default()
        };
        patch.validate().unwrap();
        product.apply(patch);

        assert_eq!(product.price_cents, 750);
        // Absent fields are untouched
        assert_eq!(product.title, before.title);
        assert_eq!(product.description, before.description);
        assert_eq!(product.stock, before.stock);
        assert!(product.updated_at >= before.updated_at);
    }

    #[test]
    fn test_patch_rejects_negative_values() {
        let patch = ProductUpdate {
            stock: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(StorefrontError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_patch_is_a_timestamp_bump_only() {
        let mut product = sample_product();
        let before = product.clone();

        product.apply(ProductUpdate::default());

        assert_eq!(product.title, before.title);
        assert_eq!(product.price_cents, before.price_cents);
        assert_eq!(product.stock, before.stock);
    }
}
