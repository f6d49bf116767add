//! End-to-end repository behavior over the in-memory backend.

use monotable_codec::decode_key;
use monotable_core::{
    CoreError, Cursor, QueryError, SortDirection, GLOBAL_SLOT_COUNT, HASH_KEY_ATTRIBUTE,
    LOCAL_SLOT_COUNT, SORT_KEY_ATTRIBUTE,
};
use monotable_testkit::prelude::*;
use serde_json::json;

fn ids(purchases: &[Purchase]) -> Vec<&str> {
    purchases.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test]
async fn local_index_query_returns_user_purchases_by_date() {
    init_tracing();
    let store = TestStore::seeded().await;

    let page = store
        .purchases
        .index("mostRecentPurchases")
        .filter(&json!({"userId": "jim"}))
        .get()
        .await
        .unwrap();

    assert_eq!(ids(&page.results), vec!["p1", "p3"]);
    assert!(page.next_page.is_none());
}

#[tokio::test]
async fn field_filter_without_tag_uses_primary_index() {
    let store = TestStore::seeded().await;

    // Every index hashed on userId ties; the primary is declared first.
    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim"}))
        .get()
        .await
        .unwrap();

    assert_eq!(ids(&page.results), vec!["p3", "p1"]);
}

#[tokio::test]
async fn paginates_ascending_through_cursor() {
    let store = TestStore::seeded().await;

    let first = store
        .purchases
        .index("mostRecentPurchases")
        .filter(&json!({"userId": "jim"}))
        .limit(1)
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&first.results), vec!["p1"]);
    let cursor = first.next_page.expect("first page has a cursor");

    let second = store.purchases.resume(cursor).unwrap().get().await.unwrap();
    assert_eq!(ids(&second.results), vec!["p3"]);
    assert!(!second.has_more());
}

#[tokio::test]
async fn paginates_descending_through_serialized_cursor() {
    let store = TestStore::seeded().await;

    let first = store
        .purchases
        .index("mostRecentPurchases")
        .filter(&json!({"userId": "jim"}))
        .sort_direction(SortDirection::Desc)
        .limit(1)
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&first.results), vec!["p3"]);

    let token = serde_json::to_string(&first.next_page.unwrap()).unwrap();
    let cursor: Cursor = serde_json::from_str(&token).unwrap();
    assert_eq!(cursor.direction(), SortDirection::Desc);

    let second = store.purchases.resume(cursor).unwrap().get().await.unwrap();
    assert_eq!(ids(&second.results), vec!["p1"]);
    assert!(second.next_page.is_none());
}

#[tokio::test]
async fn global_index_query_finds_purchasers_of_item() {
    let store = TestStore::seeded().await;

    let chosen = store
        .purchases
        .find_index_for_query(["itemId"])
        .map(|index| index.tag().to_string());
    assert_eq!(chosen.as_deref(), Some("getPurchasersOfItem"));

    let page = store
        .purchases
        .query()
        .filter(&json!({"itemId": "jello"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p1"]);
}

#[tokio::test]
async fn sort_prefix_narrows_local_index_query() {
    let store = TestStore::seeded().await;
    store
        .purchases
        .put(&Purchase::new("p4", "jim", "stapler", 1_574_140_686_444).at("can", "on", "ottawa"))
        .await
        .unwrap();

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "country": "usa", "state": "ut"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p1", "p3"]);

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "country": "can"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p4"]);
}

#[tokio::test]
async fn filter_that_skips_a_sort_field_is_rejected() {
    let store = TestStore::seeded().await;

    let err = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "city": "provo"}))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Query(QueryError::NoMatchingIndex { .. })
    ));
}

#[tokio::test]
async fn get_returns_none_for_absent_record() {
    let store = TestStore::seeded().await;

    let found = store
        .purchases
        .get(&json!({"userId": "jim", "itemId": "nothing", "id": "p9"}))
        .await
        .unwrap();
    assert!(found.is_none());

    let p1 = sample_purchases().remove(0);
    let found = store.purchases.get(&p1.key()).await.unwrap();
    assert_eq!(found, Some(p1));
}

#[tokio::test]
async fn update_merges_changes() {
    let store = TestStore::seeded().await;
    let p1 = sample_purchases().remove(0);

    let updated = store
        .purchases
        .update(&p1.key(), &json!({"createdAt": 5}))
        .await
        .unwrap();
    assert_eq!(updated.created_at, Some(5));
    assert_eq!(updated.item_id, "jello");

    let stored = store.purchases.get(&p1.key()).await.unwrap().unwrap();
    assert_eq!(stored.created_at, Some(5));
}

#[tokio::test]
async fn update_moves_record_within_local_index() {
    let store = TestStore::seeded().await;
    let p1 = sample_purchases().remove(0);

    store
        .purchases
        .update(&p1.key(), &json!({"purchaseDate": 1_574_140_686_999u64}))
        .await
        .unwrap();

    let page = store
        .purchases
        .index("mostRecentPurchases")
        .filter(&json!({"userId": "jim"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p3", "p1"]);
}

#[tokio::test]
async fn delete_all_pages_through_every_match() {
    let store = TestStore::seeded().await;
    for (id, item) in [("m1", "jello"), ("m2", "guitar"), ("m3", "stapler")] {
        store
            .purchases
            .put(&Purchase::new(id, "meow", item, 1_574_140_686_000))
            .await
            .unwrap();
    }
    assert_eq!(store.item_count(), 6);

    let deleted = store
        .purchases
        .query()
        .filter(&json!({"userId": "meow"}))
        .limit(1)
        .delete_all()
        .await
        .unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(store.item_count(), 3);
    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "meow"}))
        .get()
        .await
        .unwrap();
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn user_repository_without_sort_fields() {
    let store = TestStore::seeded().await;
    let pam = User {
        id: "pam".to_string(),
        stripe_id: "cus_1".to_string(),
        email: Some("pam@example.com".to_string()),
    };
    let toby = User {
        id: "toby".to_string(),
        stripe_id: "cus_2".to_string(),
        email: None,
    };
    store.users.put(&pam).await.unwrap();
    store.users.put(&toby).await.unwrap();

    let found = store.users.get(&json!({"id": "pam"})).await.unwrap();
    assert_eq!(found, Some(pam.clone()));

    let stored = store
        .backend
        .items(TEST_TABLE)
        .into_iter()
        .find(|item| item.get("id") == Some(&json!("toby")))
        .unwrap();
    assert_eq!(stored[HASH_KEY_ATTRIBUTE], json!("User#id-toby"));
    assert_eq!(stored[SORT_KEY_ATTRIBUTE], json!("User"));
    // Without an email toby is left out of the byEmail index.
    assert!(stored.keys().all(|k| !k.starts_with("__gsi")));

    let page = store
        .users
        .query()
        .filter(&json!({"email": "pam@example.com"}))
        .get()
        .await
        .unwrap();
    assert_eq!(page.results, vec![pam]);
}

#[tokio::test]
async fn object_types_share_one_table() {
    let store = TestStore::seeded().await;
    store
        .users
        .put(&User {
            id: "jim".to_string(),
            stripe_id: "cus_3".to_string(),
            email: None,
        })
        .await
        .unwrap();

    let schema = store.backend.schema(TEST_TABLE).unwrap();
    assert!(schema.indexes.len() <= usize::from(LOCAL_SLOT_COUNT + GLOBAL_SLOT_COUNT));
    assert!(schema.index("gsi0").is_some());
    assert!(schema.index("gsi1").is_some());

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim"}))
        .get()
        .await
        .unwrap();
    assert_eq!(page.results.len(), 2);
}

#[tokio::test]
async fn stored_local_key_decodes_to_declared_fields() {
    let store = TestStore::seeded().await;
    let config = store.purchases.config();
    let index = config.index_by_tag("mostRecentPurchases").unwrap();

    let item = store
        .backend
        .items(TEST_TABLE)
        .into_iter()
        .find(|item| item.get("id") == Some(&json!("p1")))
        .unwrap();
    let sort_attribute = index.sort_key_attribute();
    let key = item[sort_attribute].as_str().unwrap();

    let segments = decode_key(
        key,
        index.sort_key_descriptor(),
        index.sort_key_fields().as_slice(),
        config.key_format(),
    )
    .unwrap();
    assert_eq!(segments[1], ("itemId".to_string(), "jello".to_string()));
    assert_eq!(segments[0].1.trim_start_matches('0'), "1574140686111");
}

#[tokio::test]
async fn overwrite_is_idempotent_across_derived_attributes() {
    let store = TestStore::new().await;
    let purchase = Purchase::new("p1", "jim", "jello", 1_574_140_686_111);

    store.purchases.overwrite(&purchase).await.unwrap();
    let once = store.backend.items(TEST_TABLE);
    store.purchases.overwrite(&purchase).await.unwrap();
    let twice = store.backend.items(TEST_TABLE);

    assert_eq!(once, twice);
    let item = &twice[0];
    for attribute in ["__lsi0", "__lsi1", "__lsi2", "__gsiHash0", "__gsiSort0"] {
        assert!(item.contains_key(attribute), "missing {attribute}");
    }
}

async fn store_with_similar_values() -> TestStore {
    let store = TestStore::new().await;
    for purchase in [
        Purchase::new("p1", "jim", "couch", 1_574_140_686_111),
        Purchase::new("p2", "jim", "couchtable", 1_574_140_686_222),
        Purchase::new("p3", "jim", "lamp", 1_574_140_686_333).at("us", "ut", "provo"),
    ] {
        store.purchases.put(&purchase).await.unwrap();
    }
    store
}

#[tokio::test]
async fn equality_filter_does_not_match_longer_values() {
    let store = store_with_similar_values().await;

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "country": "us"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p3"]);

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "itemId": "couch"}))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&page.results), vec!["p1"]);
}

#[tokio::test]
async fn delete_all_spares_records_outside_the_filter() {
    let store = store_with_similar_values().await;

    let deleted = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim", "itemId": "couch"}))
        .limit(1)
        .delete_all()
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let page = store
        .purchases
        .query()
        .filter(&json!({"userId": "jim"}))
        .get()
        .await
        .unwrap();
    let mut remaining: Vec<&str> = page.results.iter().map(|p| p.item_id.as_str()).collect();
    remaining.sort();
    assert_eq!(remaining, vec!["couchtable", "lamp"]);
}
