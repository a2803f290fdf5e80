mod common;

use common::{ALICE, ALICE_TOKEN, BOB_TOKEN, bearer, test_app};
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::time::Duration;

#[tokio::test]
async fn test_create_link_anonymous() {
    let app = test_app();

    let response = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "destination": "example.com/landing" }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body = response.json::<Value>();
    let code = body["short_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(body["short_url"], format!("https://sho.rt/{code}"));
    assert_eq!(body["destination"], "https://example.com/landing");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["click_count"], 0);

    assert_eq!(app.links.get(code).unwrap().user_id, None);
}

#[tokio::test]
async fn test_create_link_owned_by_token_user() {
    let app = test_app();

    let response = app
        .server
        .post("/api/v1/links")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .json(&json!({
            "url": "https://example.com",
            "custom_slug": "Promo2024",
            "title": "Spring promo",
            "expires_at": "2099-01-01T00:00:00Z"
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body = response.json::<Value>();
    assert_eq!(body["short_code"], "promo2024");
    assert_eq!(body["title"], "Spring promo");
    assert_eq!(body["expires_at"], "2099-01-01T00:00:00Z");

    assert_eq!(app.links.get("promo2024").unwrap().user_id, Some(ALICE));
}

#[tokio::test]
async fn test_created_link_redirects() {
    let app = test_app();

    let body = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "destination": "https://example.com/new" }))
        .await
        .json::<Value>();
    let code = body["short_code"].as_str().unwrap();

    let response = app.server.get(&format!("/{code}")).await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/new");
}

#[tokio::test]
async fn test_create_duplicate_slug_conflict() {
    let app = test_app();
    app.links.insert("taken1", "https://example.com", None);

    let response = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "destination": "https://example.org", "custom_slug": "TAKEN1" }))
        .await;

    assert_eq!(response.status_code(), 409);
    assert_eq!(response.json::<Value>()["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_concurrent_same_slug_single_winner() {
    let app = test_app();
    let request = || {
        app.server
            .post("/api/v1/links")
            .json(&json!({ "destination": "https://example.com", "custom_slug": "race1" }))
            .into_future()
    };

    let (a, b, c) = tokio::join!(request(), request(), request());
    let mut statuses = [a.status_code(), b.status_code(), c.status_code()].map(|s| s.as_u16());
    statuses.sort();

    assert_eq!(statuses, [201, 409, 409]);
    assert_eq!(app.links.len(), 1);
}

#[tokio::test]
async fn test_create_rejects_reserved_and_malformed_slugs() {
    let app = test_app();

    for slug in ["api", "Health", "no-dashes", "ab"] {
        let response = app
            .server
            .post("/api/v1/links")
            .json(&json!({ "destination": "https://example.com", "custom_slug": slug }))
            .await;

        assert_eq!(response.status_code(), 400, "slug {slug}");
        assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = test_app();

    let bad_url = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "destination": "ftp://example.com/file" }))
        .await;
    assert_eq!(bad_url.status_code(), 400);

    let bad_expiry = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "destination": "https://example.com", "expires_at": "tomorrow" }))
        .await;
    assert_eq!(bad_expiry.status_code(), 400);

    let malformed = app
        .server
        .post("/api/v1/links")
        .text("{not json")
        .await;
    assert_eq!(malformed.status_code(), 400);
    assert_eq!(malformed.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let app = test_app();

    let response = app
        .server
        .post("/api/v1/links")
        .add_header("Authorization", bearer("not-a-real-token"))
        .json(&json!({ "destination": "https://example.com" }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(app.links.len(), 0);
}

#[tokio::test]
async fn test_list_requires_token() {
    let app = test_app();

    let response = app.server.get("/api/v1/links").await;

    response.assert_status_unauthorized();
    assert!(response.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn test_list_only_own_links_paginated() {
    let app = test_app();
    for i in 0..3 {
        app.links
            .insert(&format!("alice{i}"), "https://example.com", Some(common::ALICE));
    }
    app.links.insert("bobs01", "https://example.com", Some(common::BOB));

    let response = app
        .server
        .get("/api/v1/links")
        .add_query_param("page", 1)
        .add_query_param("page_size", 2)
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["short_code"], "alice2");
}

#[tokio::test]
async fn test_list_clamps_paging() {
    let app = test_app();

    let response = app
        .server
        .get("/api/v1/links?page=0&page_size=1000")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
}

#[tokio::test]
async fn test_get_link_owner_and_stranger() {
    let app = test_app();
    app.links
        .insert("mine01", "https://example.com", Some(ALICE));

    let own = app
        .server
        .get("/api/v1/links/mine01")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await;
    own.assert_status_ok();
    assert_eq!(own.json::<Value>()["short_url"], "https://sho.rt/mine01");

    let stranger = app
        .server
        .get("/api/v1/links/mine01")
        .add_header("Authorization", bearer(BOB_TOKEN))
        .await;
    stranger.assert_status_forbidden();

    let missing = app
        .server
        .get("/api/v1/links/nope01")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await;
    missing.assert_status_not_found();
}

#[tokio::test]
async fn test_update_changes_redirect_target() {
    let app = test_app();
    app.links
        .insert("moving", "https://old.example.com", Some(ALICE));

    // Warm the cache with the old destination.
    let before = app.server.get("/moving").await;
    assert_eq!(before.header("location"), "https://old.example.com");

    let response = app
        .server
        .patch("/api/v1/links/moving")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .json(&json!({ "destination": "new.example.com", "title": "Moved" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["destination"], "https://new.example.com/");
    assert_eq!(body["title"], "Moved");

    let after = app.server.get("/moving").await;
    assert_eq!(after.status_code(), 302);
    assert_eq!(after.header("location"), "https://new.example.com/");
}

#[tokio::test]
async fn test_update_during_slow_redirect_lookup_is_not_cached_over() {
    let app = test_app();
    app.links
        .insert("race1", "https://old.example.com", Some(ALICE));
    app.links.stall_next_read(Duration::from_millis(200));

    let redirect = app.server.get("/race1").into_future();
    let update = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.server
            .patch("/api/v1/links/race1")
            .add_header("Authorization", bearer(ALICE_TOKEN))
            .json(&json!({ "destination": "https://new.example.com" }))
            .await
    };

    let (slow, updated) = tokio::join!(redirect, update);
    updated.assert_status_ok();
    assert_eq!(slow.header("location"), "https://old.example.com");

    let after = app.server.get("/race1").await;
    assert_eq!(after.header("location"), "https://new.example.com/");
}

#[tokio::test]
async fn test_deactivate_stops_redirect() {
    let app = test_app();
    app.links
        .insert("switch", "https://example.com", Some(ALICE));
    assert_eq!(app.server.get("/switch").await.status_code(), 302);

    app.server
        .put("/api/v1/links/switch")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .json(&json!({ "is_active": false }))
        .await
        .assert_status_ok();

    app.server.get("/switch").await.assert_status_not_found();
}

#[tokio::test]
async fn test_update_requires_ownership() {
    let app = test_app();
    app.links
        .insert("alices", "https://example.com", Some(ALICE));
    app.links.insert("public", "https://example.com", None);

    for code in ["alices", "public"] {
        let response = app
            .server
            .patch(&format!("/api/v1/links/{code}"))
            .add_header("Authorization", bearer(BOB_TOKEN))
            .json(&json!({ "title": "hijacked" }))
            .await;

        response.assert_status_forbidden();
    }
    assert_eq!(app.links.get("alices").unwrap().title, None);
}

#[tokio::test]
async fn test_delete_link() {
    let app = test_app();
    app.links
        .insert("gone01", "https://example.com", Some(ALICE));
    assert_eq!(app.server.get("/gone01").await.status_code(), 302);

    let forbidden = app
        .server
        .delete("/api/v1/links/gone01")
        .add_header("Authorization", bearer(BOB_TOKEN))
        .await;
    forbidden.assert_status_forbidden();

    let response = app
        .server
        .delete("/api/v1/links/gone01")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await;
    assert_eq!(response.status_code(), 204);

    app.server.get("/gone01").await.assert_status_not_found();
    app.server
        .delete("/api/v1/links/gone01")
        .add_header("Authorization", bearer(ALICE_TOKEN))
        .await
        .assert_status_not_found();
}
