//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with the inventory schema applied (feature: "postgres")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let name = builder.product_name("bolt");
//!     let quantity = builder.quantity(100);
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_product");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Unique product name for this test
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let name = TestDataBuilder::new(7).product_name("bolt");
    /// assert_eq!(name, "test-product-7-bolt");
    /// ```
    pub fn product_name(&self, suffix: &str) -> String {
        format!("test-product-{}-{}", self.seed, suffix)
    }

    /// Quantity in `0..upper`
    pub fn quantity(&self, upper: i32) -> i32 {
        if upper <= 0 {
            return 0;
        }
        (self.seed % upper as u64) as i32
    }

    /// Price with two decimal places in `[0.00, 999.99]`
    pub fn price(&self) -> f64 {
        (self.seed % 100_000) as f64 / 100.0
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert two prices match to the cent
    pub fn assert_price_eq(actual: f64, expected: f64, context: &str) {
        assert!(
            (actual - expected).abs() < 0.005,
            "{}: expected price {:.2}, got {:.2}",
            context,
            expected,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.product_name("bolt"), builder2.product_name("bolt"));
        assert_eq!(builder1.quantity(50), builder2.quantity(50));
        assert_eq!(builder1.price(), builder2.price());
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.product_name("x"), builder2.product_name("x"));
    }

    #[test]
    fn test_generated_values_stay_in_range() {
        let builder = TestDataBuilder::new(123_456_789);

        assert!((0..10).contains(&builder.quantity(10)));
        assert_eq!(builder.quantity(0), 0);
        let price = builder.price();
        assert!((0.0..1000.0).contains(&price));
        assert_eq!((price * 100.0).round() / 100.0, price);
    }

    #[test]
    #[should_panic(expected = "lookup: expected Some")]
    fn test_assert_some_panics_on_none() {
        assertions::assert_some::<i32>(None, "lookup");
    }
}
