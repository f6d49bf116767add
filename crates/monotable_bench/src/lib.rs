//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use monotable_core::{AttributeMap, IndexDeclaration, RepositoryConfig};
use serde_json::json;

/// Object name used by the benchmark layout.
pub const BENCH_OBJECT: &str = "Order";

/// A layout with one local and two global indexes.
pub fn order_config() -> RepositoryConfig {
    RepositoryConfig::builder(BENCH_OBJECT)
        .hash_key_fields(["customerId"])
        .sort_key_fields(["orderId"])
        .index("byDate", IndexDeclaration::local(0, ["placedAt", "orderId"]))
        .index(
            "byRegion",
            IndexDeclaration::local(1, ["country", "state", "city", "placedAt"]),
        )
        .index(
            "bySku",
            IndexDeclaration::global(0, ["sku"], ["placedAt", "customerId"]),
        )
        .index(
            "byWarehouse",
            IndexDeclaration::global(1, ["warehouse", "country"], ["placedAt"]),
        )
        .build()
        .expect("benchmark layout is valid")
}

/// Generates `count` orders spread over `customers` customers.
pub fn generate_orders(count: usize, customers: usize) -> Vec<AttributeMap> {
    (0..count)
        .map(|i| {
            let value = json!({
                "customerId": format!("customer{}", i % customers.max(1)),
                "orderId": format!("order{i:08}"),
                "placedAt": 1_600_000_000_000u64 + i as u64,
                "sku": format!("sku{}", i % 97),
                "warehouse": format!("wh{}", i % 7),
                "country": "usa",
                "state": "ut",
                "city": "provo",
                "quantity": i % 5 + 1,
            });
            match value {
                serde_json::Value::Object(map) => map,
                _ => AttributeMap::new(),
            }
        })
        .collect()
}
