//! Test fixtures and repository helpers.
//!
//! Provides the record types, repository layouts, and a seeded
//! in-memory store shared by the integration tests.

use std::sync::Arc;

use monotable_core::{ensure_tables, IndexDeclaration, Repository, RepositoryConfig};
use monotable_storage::InMemoryBackend;
use serde::{Deserialize, Serialize};

/// Table shared by every fixture repository.
pub const TEST_TABLE: &str = "monotable_test";

/// A purchase of one item by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Purchase id.
    pub id: String,
    /// Buyer.
    pub user_id: String,
    /// Item bought.
    pub item_id: String,
    /// Epoch milliseconds.
    pub purchase_date: u64,
    /// Country of delivery.
    pub country: String,
    /// State of delivery.
    pub state: String,
    /// City of delivery.
    pub city: String,
    /// Last modification, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl Purchase {
    /// Creates a purchase delivered to Provo, Utah.
    pub fn new(id: &str, user_id: &str, item_id: &str, purchase_date: u64) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            purchase_date,
            country: "usa".to_string(),
            state: "ut".to_string(),
            city: "provo".to_string(),
            created_at: None,
        }
    }

    /// Sets the delivery location.
    #[must_use]
    pub fn at(mut self, country: &str, state: &str, city: &str) -> Self {
        self.country = country.to_string();
        self.state = state.to_string();
        self.city = city.to_string();
        self
    }

    /// Primary key fields of this purchase.
    pub fn key(&self) -> PurchaseKey {
        PurchaseKey {
            user_id: self.user_id.clone(),
            item_id: self.item_id.clone(),
            id: self.id.clone(),
        }
    }
}

/// Primary key fields of a [`Purchase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseKey {
    /// Buyer.
    pub user_id: String,
    /// Item bought.
    pub item_id: String,
    /// Purchase id.
    pub id: String,
}

/// A user with no sort key fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: String,
    /// Payment provider id.
    pub stripe_id: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Layout of [`Purchase`] records.
///
/// | Tag | Index | Hash | Sort |
/// |-----|-------|------|------|
/// | primary | table | `userId` | `itemId`, `id` |
/// | `getPurchasersOfItem` | gsi0 | `itemId` | `purchaseDate`, `userId` |
/// | `mostRecentPurchases` | lsi0 | `userId` | `purchaseDate`, `itemId` |
/// | `latestPurchasesByCountry` | lsi1 | `userId` | `country`, `purchaseDate` |
/// | `location` | lsi2 | `userId` | `country`, `state`, `city`, `purchaseDate`, `itemId` |
pub fn purchase_config() -> RepositoryConfig {
    RepositoryConfig::builder("Purchase")
        .table_name(TEST_TABLE)
        .hash_key_fields(["userId"])
        .sort_key_fields(["itemId", "id"])
        .index(
            "getPurchasersOfItem",
            IndexDeclaration::global(0, ["itemId"], ["purchaseDate", "userId"]),
        )
        .index(
            "mostRecentPurchases",
            IndexDeclaration::local(0, ["purchaseDate", "itemId"]),
        )
        .index(
            "latestPurchasesByCountry",
            IndexDeclaration::local(1, ["country", "purchaseDate"]),
        )
        .index(
            "location",
            IndexDeclaration::local(2, ["country", "state", "city", "purchaseDate", "itemId"]),
        )
        .build()
        .expect("purchase layout is valid")
}

/// Layout of [`User`] records: hash on `id`, global index on `email`.
pub fn user_config() -> RepositoryConfig {
    RepositoryConfig::builder("User")
        .table_name(TEST_TABLE)
        .hash_key_fields(["id"])
        .index("byEmail", IndexDeclaration::global(1, ["email"], ["id"]))
        .build()
        .expect("user layout is valid")
}

/// Three purchases: two by `jim`, one by `dwight`.
pub fn sample_purchases() -> Vec<Purchase> {
    vec![
        Purchase::new("p1", "jim", "jello", 1_574_140_686_111),
        Purchase::new("p2", "dwight", "battlestar", 1_574_140_686_222).at("usa", "pa", "scranton"),
        Purchase::new("p3", "jim", "guitar", 1_574_140_686_333),
    ]
}

/// An in-memory table holding purchase and user repositories.
pub struct TestStore {
    /// The backend, for inspecting stored items.
    pub backend: Arc<InMemoryBackend>,
    /// Purchase repository.
    pub purchases: Repository<Purchase>,
    /// User repository.
    pub users: Repository<User>,
}

impl TestStore {
    /// Creates an empty store with both repositories provisioned.
    pub async fn new() -> Self {
        let purchase_config = purchase_config();
        let user_config = user_config();
        let backend = Arc::new(InMemoryBackend::new());
        ensure_tables(backend.as_ref(), &[&purchase_config, &user_config])
            .await
            .expect("failed to provision test table");
        Self {
            purchases: Repository::new(purchase_config, backend.clone()),
            users: Repository::new(user_config, backend.clone()),
            backend,
        }
    }

    /// Creates a store holding [`sample_purchases`].
    pub async fn seeded() -> Self {
        let store = Self::new().await;
        for purchase in sample_purchases() {
            store
                .purchases
                .overwrite(&purchase)
                .await
                .expect("failed to seed purchase");
        }
        store
    }

    /// Number of items stored in the test table, across object types.
    pub fn item_count(&self) -> usize {
        self.backend.item_count(TEST_TABLE)
    }
}
