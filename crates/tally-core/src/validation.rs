//! # Validation Module
//!
//! Input validation for catalog, customer, sale and retention requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP adapter                                                 │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation, before any lock or row is touched       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  └── UNIQUE (invoice_number)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::types::{Cashier, CustomerUpdate, NewCustomer, NewProduct, NewSale, ProductUpdate};
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_RETENTION_DAYS, MAX_SALE_ITEMS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name (product or customer).
///
/// ```rust
/// use tally_core::validation::validate_name;
///
/// assert!(validate_name("name", "Wireless Mouse").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: positive and at most [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a money amount in cents (prices, costs, discounts):
/// `0..=MAX_AMOUNT_CENTS`.
///
/// ```rust
/// use tally_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("price", 0).is_ok());
/// assert!(validate_amount_cents("price", -1).is_err());
/// assert!(validate_amount_cents("price", i64::MAX / 2).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::must_not_be_negative(field));
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates a stock level: `0..=MAX_STOCK`.
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::must_not_be_negative("stock"));
    }
    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Validates a manual stock adjustment delta: non-zero, and no larger in
/// magnitude than [`MAX_STOCK`].
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must not be zero".to_string(),
        });
    }
    if !(-MAX_STOCK..=MAX_STOCK).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Validates a retention window.
///
/// `days > 30` is a business-rule rejection ([`CoreError::RangeExceeded`]),
/// not a malformed request, so callers can tell the two apart.
///
/// ```rust
/// use tally_core::validation::validate_retention_days;
///
/// assert!(validate_retention_days(30).is_ok());
/// assert!(validate_retention_days(31).is_err());
/// ```
pub fn validate_retention_days(days: i64) -> Result<(), CoreError> {
    if days < 0 {
        return Err(ValidationError::must_not_be_negative("days").into());
    }
    if days > MAX_RETENTION_DAYS {
        return Err(CoreError::RangeExceeded {
            requested: days,
            max: MAX_RETENTION_DAYS,
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request and the operator recording it.
///
/// ## Rules
/// - at least one line, at most [`MAX_SALE_ITEMS`]
/// - every line: product id present, quantity in range, price and line
///   discount non-negative
/// - sale discount non-negative
/// - cashier id present
pub fn validate_new_sale(sale: &NewSale, cashier: &Cashier) -> ValidationResult<()> {
    if cashier.id.trim().is_empty() {
        return Err(ValidationError::required("cashier"));
    }

    if sale.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if sale.items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    for item in &sale.items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::required("product_id"));
        }
        validate_quantity(item.quantity)?;
        validate_amount_cents("unit_price", item.unit_price_cents)?;
        validate_amount_cents("line discount", item.discount_cents)?;
    }

    validate_amount_cents("discount", sale.discount_cents)?;

    if let Some(customer_id) = &sale.customer_id {
        if customer_id.trim().is_empty() {
            return Err(ValidationError::required("customer_id"));
        }
    }

    Ok(())
}

/// Validates a new catalog product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_amount_cents("price", product.price_cents)?;
    validate_amount_cents("cost", product.cost_cents)?;
    validate_stock_level(product.stock)?;
    Ok(())
}

/// Validates a catalog update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    validate_name("name", &update.name)?;
    validate_amount_cents("price", update.price_cents)?;
    validate_amount_cents("cost", update.cost_cents)?;
    Ok(())
}

pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_name("name", &customer.name)
}

pub fn validate_customer_update(update: &CustomerUpdate) -> ValidationResult<()> {
    validate_name("name", &update.name)?;
    validate_amount_cents("loyalty_points", update.loyalty_points)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewSaleItem, PaymentMethod};

    fn cashier() -> Cashier {
        Cashier::new("u-1", "Cashier User")
    }

    fn sale_with(items: Vec<NewSaleItem>) -> NewSale {
        NewSale {
            items,
            customer_id: None,
            discount_cents: 0,
            payment_method: PaymentMethod::Cash,
        }
    }

    fn line(qty: i64, price: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: "p-1".to_string(),
            quantity: qty,
            unit_price_cents: price,
            discount_cents: 0,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_sale_rejected() {
        let err = validate_new_sale(&sale_with(vec![]), &cashier()).unwrap_err();
        assert_eq!(err.to_string(), "items is required");
    }

    #[test]
    fn test_sale_requires_cashier() {
        let err =
            validate_new_sale(&sale_with(vec![line(1, 100)]), &Cashier::new(" ", "")).unwrap_err();
        assert_eq!(err.to_string(), "cashier is required");
    }

    #[test]
    fn test_sale_rejects_negative_amounts() {
        assert!(validate_new_sale(&sale_with(vec![line(1, -1)]), &cashier()).is_err());

        let mut sale = sale_with(vec![line(1, 100)]);
        sale.discount_cents = -5;
        assert!(validate_new_sale(&sale, &cashier()).is_err());

        sale.discount_cents = 0;
        assert!(validate_new_sale(&sale, &cashier()).is_ok());
    }

    #[test]
    fn test_sale_rejects_oversized_prices() {
        let err = validate_new_sale(&sale_with(vec![line(3, i64::MAX / 2)]), &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. }));

        let mut sale = sale_with(vec![line(MAX_ITEM_QUANTITY, MAX_AMOUNT_CENTS)]);
        assert!(validate_new_sale(&sale, &cashier()).is_ok());
        assert!(sale.totals().is_ok());

        sale.discount_cents = i64::MAX;
        assert!(validate_new_sale(&sale, &cashier()).is_err());
    }

    #[test]
    fn test_stock_delta_bounds() {
        assert!(validate_stock_delta(MAX_STOCK).is_ok());
        assert!(validate_stock_delta(-MAX_STOCK).is_ok());
        assert!(validate_stock_delta(0).is_err());
        assert!(validate_stock_delta(i64::MAX).is_err());
        assert!(validate_stock_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_sale_rejects_too_many_lines() {
        let items = (0..=MAX_SALE_ITEMS).map(|_| line(1, 1)).collect();
        assert!(validate_new_sale(&sale_with(items), &cashier()).is_err());
    }

    #[test]
    fn test_retention_days() {
        assert!(validate_retention_days(0).is_ok());
        assert!(validate_retention_days(30).is_ok());
        assert!(matches!(
            validate_retention_days(31),
            Err(CoreError::RangeExceeded { requested: 31, max: 30 })
        ));
        assert!(matches!(
            validate_retention_days(-1),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_new_product() {
        let product = NewProduct {
            name: "Laptop".to_string(),
            description: None,
            price_cents: 99_999,
            cost_cents: 70_000,
            stock: 15,
            category: Some("Electronics".to_string()),
            barcode: None,
            image: None,
        };
        assert!(validate_new_product(&product).is_ok());

        let negative_stock = NewProduct {
            stock: -1,
            ..product.clone()
        };
        assert!(validate_new_product(&negative_stock).is_err());

        let flooded = NewProduct {
            stock: MAX_STOCK + 1,
            ..product.clone()
        };
        assert!(validate_new_product(&flooded).is_err());

        let unnamed = NewProduct {
            name: String::new(),
            ..product
        };
        assert!(validate_new_product(&unnamed).is_err());
    }
}
