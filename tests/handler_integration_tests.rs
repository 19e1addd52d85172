mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_document, delete, get, post, put, seed_user, test_app};

// --- Create ---

#[tokio::test]
async fn test_create_document_sets_owner_from_token() {
    let (app, state) = test_app();
    let (user, token) = seed_user(&state, "Grace Hopper", "grace@example.com", "user").await;

    let (status, body) = post(
        &app,
        "/api/v1/documents",
        &token,
        json!({ "title": "  COBOL notes ", "content": "Compilers", "accessType": "private" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Document created successfully");
    assert_eq!(body["document"]["title"], "COBOL notes");
    assert_eq!(body["document"]["owner"], "Grace Hopper");
    assert_eq!(body["document"]["userId"], user.id);
    assert_eq!(body["document"]["accessType"], "private");
}

#[tokio::test]
async fn test_duplicate_title_is_409() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Dup", "dup@example.com", "user").await;
    create_document(&app, &token, "Same Title", "public").await;

    let (status, body) = post(
        &app,
        "/api/v1/documents",
        &token,
        json!({ "title": "Same Title", "content": "again", "accessType": "public" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Sorry, this title already exists!");
}

#[tokio::test]
async fn test_create_document_validation() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Val", "val@example.com", "user").await;

    let cases = [
        (json!({ "content": "c", "accessType": "public" }), "Please enter a title"),
        (json!({ "title": "t", "accessType": "public" }), "Empty content. Please enter content here!"),
        (json!({ "title": "t", "content": "c" }), "Please enter an Access Type"),
        (json!({ "title": "t", "content": "c", "accessType": "pub1ic" }), "Access Type must contain letters only"),
        // Letters only, but neither public/private nor the requester's role.
        (json!({ "title": "t", "content": "c", "accessType": "admin" }), "Invalid Access Type"),
    ];

    for (payload, message) in cases {
        let (status, body) = post(&app, "/api/v1/documents", &token, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "expected 400 for {message}");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Json", "json@example.com", "user").await;

    let (status, body) = post(&app, "/api/v1/documents", &token, json!([1, 2, 3])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Sorry, an invalid JSON value found :(");
}

#[tokio::test]
async fn test_role_access_type_is_assignable_by_that_role() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Ed", "ed@example.com", "editor").await;

    let (status, _) = post(
        &app,
        "/api/v1/documents",
        &token,
        json!({ "title": "Style guide", "content": "Oxford comma", "accessType": "editor" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// --- Read ---

#[tokio::test]
async fn test_document_visibility_rule() {
    let (app, state) = test_app();
    let (_, admin) = seed_user(&state, "Admin", "admin@example.com", "admin").await;
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let (_, other) = seed_user(&state, "Other", "other@example.com", "user").await;
    let (_, editor) = seed_user(&state, "Editor", "editor@example.com", "editor").await;

    let public_id = create_document(&app, &admin, "Admin public", "public").await;
    let private_id = create_document(&app, &owner, "Owner private", "private").await;
    let role_id = create_document(&app, &owner, "For users", "user").await;

    // Public: anyone.
    let (status, body) = get(&app, &format!("/api/v1/documents/{public_id}"), &other).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Document found!");

    // Private: owner and admin only.
    let (status, body) = get(&app, &format!("/api/v1/documents/{private_id}"), &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized access");
    let (status, _) = get(&app, &format!("/api/v1/documents/{private_id}"), &owner).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/api/v1/documents/{private_id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);

    // Role-scoped: same role yes, different role no.
    let (status, _) = get(&app, &format!("/api/v1/documents/{role_id}"), &other).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/api/v1/documents/{role_id}"), &editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_document_bad_id_and_missing() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Ids", "ids@example.com", "user").await;

    for bad in ["abc", "0", "-4", "1.5"] {
        let (status, body) = get(&app, &format!("/api/v1/documents/{bad}"), &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {bad}");
        assert_eq!(body["message"], "Invalid ID. Please enter a valid ID");
    }

    let (status, body) = get(&app, "/api/v1/documents/999", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Sorry, the document does not exist!");
}

// --- List ---

#[tokio::test]
async fn test_list_documents_filters_and_paginates() {
    let (app, state) = test_app();
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let (_, viewer) = seed_user(&state, "Viewer", "viewer@example.com", "editor").await;

    for n in 1..=7 {
        create_document(&app, &owner, &format!("Public {n}"), "public").await;
    }
    create_document(&app, &owner, "Hidden", "private").await;

    let (status, body) = get(&app, "/api/v1/documents?limit=5&offset=5", &viewer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metaData"]["page"], 2);
    assert_eq!(body["metaData"]["pageCount"], 2);
    assert_eq!(body["metaData"]["count"], 2);
    assert_eq!(body["metaData"]["totalCount"], 7);
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);

    // Newest first.
    let (_, body) = get(&app, "/api/v1/documents?limit=1", &viewer).await;
    assert_eq!(body["documents"][0]["title"], "Public 7");

    // The owner also sees the private one.
    let (_, body) = get(&app, "/api/v1/documents", &owner).await;
    assert_eq!(body["metaData"]["totalCount"], 8);
    assert_eq!(body["metaData"]["count"], 8);
}

#[tokio::test]
async fn test_list_documents_rejects_bad_pagination() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Pager", "pager@example.com", "user").await;

    for query in ["limit=-1", "limit=abc", "offset=-3", "limit=0"] {
        let (status, body) = get(&app, &format!("/api/v1/documents?{query}"), &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
        assert_eq!(body["message"], "Limit and offset must be valid positive integers");
    }
}

#[tokio::test]
async fn test_list_documents_extreme_window_is_200() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Edge", "edge@example.com", "user").await;
    create_document(&app, &token, "First", "public").await;
    create_document(&app, &token, "Second", "public").await;

    let (status, body) = get(&app, "/api/v1/documents?limit=9223372036854775807", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);
    assert_eq!(body["metaData"]["page"], 1);
    assert_eq!(body["metaData"]["pageCount"], 1);

    let (status, body) = get(
        &app,
        "/api/v1/documents?limit=1&offset=9223372036854775807",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["documents"].as_array().unwrap().is_empty());
    assert_eq!(body["metaData"]["page"], i64::MAX);
    assert_eq!(body["metaData"]["pageCount"], 2);
}

#[tokio::test]
async fn test_empty_listing_is_200() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Lonely", "lonely@example.com", "user").await;

    let (status, body) = get(&app, "/api/v1/documents", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metaData"]["pageCount"], 0);
    assert_eq!(body["metaData"]["page"], 1);
}

// --- Update ---

#[tokio::test]
async fn test_update_document_owner_only() {
    let (app, state) = test_app();
    let (_, admin) = seed_user(&state, "Admin", "admin@example.com", "admin").await;
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let (_, other) = seed_user(&state, "Other", "other@example.com", "user").await;
    let id = create_document(&app, &owner, "Draft", "public").await;
    let uri = format!("/api/v1/documents/{id}");

    let (status, _) = put(&app, &uri, &other, json!({ "content": "defaced" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = put(&app, &uri, &admin, json!({ "content": "moderated" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = put(&app, &uri, &owner, json!({ "content": "Final", "accessType": "private" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Document Successfully Updated");
    assert_eq!(body["document"]["content"], "Final");
    assert_eq!(body["document"]["accessType"], "private");
    assert_eq!(body["document"]["title"], "Draft");
}

#[tokio::test]
async fn test_update_document_title_conflicts() {
    let (app, state) = test_app();
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    create_document(&app, &owner, "Taken", "public").await;
    let id = create_document(&app, &owner, "Mine", "public").await;
    let uri = format!("/api/v1/documents/{id}");

    let (status, _) = put(&app, &uri, &owner, json!({ "title": "Taken" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Re-saving its own title is fine.
    let (status, _) = put(&app, &uri, &owner, json!({ "title": "Mine" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_document_rejects_foreign_role_access_type() {
    let (app, state) = test_app();
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let id = create_document(&app, &owner, "Doc", "public").await;

    let (status, body) = put(
        &app,
        &format!("/api/v1/documents/{id}"),
        &owner,
        json!({ "accessType": "editor" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid Access Type");
}

// --- Delete ---

#[tokio::test]
async fn test_delete_document_owner_or_admin_then_404() {
    let (app, state) = test_app();
    let (_, admin) = seed_user(&state, "Admin", "admin@example.com", "admin").await;
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let (_, other) = seed_user(&state, "Other", "other@example.com", "user").await;

    let first = create_document(&app, &owner, "First", "public").await;
    let second = create_document(&app, &owner, "Second", "public").await;

    let (status, _) = delete(&app, &format!("/api/v1/documents/{first}"), &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = delete(&app, &format!("/api/v1/documents/{first}"), &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Document deleted successfully!");

    let (status, _) = delete(&app, &format!("/api/v1/documents/{first}"), &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = delete(&app, &format!("/api/v1/documents/{second}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
}

// --- Search ---

#[tokio::test]
async fn test_search_documents() {
    let (app, state) = test_app();
    let (_, owner) = seed_user(&state, "Owner", "owner@example.com", "user").await;
    let (_, editor) = seed_user(&state, "Editor", "editor@example.com", "editor").await;

    create_document(&app, &owner, "Rust Ownership", "public").await;
    create_document(&app, &owner, "Rust Lifetimes", "private").await;
    create_document(&app, &owner, "Go Channels", "public").await;

    let (status, body) = get(&app, "/api/v1/search/documents?q=RUST", &editor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Number of documents found: 1");
    assert_eq!(body["document"][0]["title"], "Rust Ownership");
    assert_eq!(body["metaData"]["totalCount"], 1);

    let (_, body) = get(&app, "/api/v1/search/documents?q=rust", &owner).await;
    assert_eq!(body["metaData"]["totalCount"], 2);

    // Wildcards are stripped before matching.
    let (status, body) = get(&app, "/api/v1/search/documents?q=%25", &owner).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter a keyword");

    let (status, body) = get(&app, "/api/v1/search/documents?q=python", &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No document found!");
}
