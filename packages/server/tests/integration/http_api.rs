use serde_json::json;
use uuid::Uuid;

use crate::common::{FilePart, TestApp, routes};

// ---------------------------------------------------------------------------
// Content endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_activity_with_cover_and_serve_it() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");

    let res = app
        .create_activity(&token, vec![FilePart::cover("photo.jpg")])
        .await;
    assert_eq!(res.body["owner_id"], "user-1");
    assert_eq!(res.body["kind"], "activity");
    assert_eq!(res.body["title"], "Sunrise hike");
    assert!(res.body["gallery_images"].as_array().unwrap().is_empty());
    assert!(res.body.get("capacity").is_none());

    let cover = res.body["cover_image"].as_str().unwrap();
    let prefix = app.url("/media/v1/activities/");
    assert!(cover.starts_with(&prefix), "unexpected cover URL {cover}");

    let path = cover.trim_start_matches(&app.url(""));
    let media = app.get(path).await;
    assert_eq!(media.status, 200);
    assert_eq!(media.text, "cover photo.jpg");
}

#[tokio::test]
async fn unknown_media_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get("/media/v1/activities/missing.jpg").await;
    assert_eq!(res.status, 404);
    let res = app.get("/media/v1/../secret.jpg").await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn create_without_token_is_rejected() {
    let app = TestApp::spawn().await;
    let payload = json!({ "title": "Sunrise hike" });

    let res = app
        .post_form(routes::ACTIVITIES, Some(&payload), vec![], None)
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}

#[tokio::test]
async fn create_with_bad_token_is_rejected() {
    let app = TestApp::spawn().await;
    let payload = json!({ "title": "Sunrise hike" });

    let res = app
        .post_form(routes::ACTIVITIES, Some(&payload), vec![], Some("not-a-jwt"))
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn create_without_payload_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");

    let res = app
        .post_form(routes::ACTIVITIES, None, vec![], Some(&token))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn gallery_on_event_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    let payload = json!({ "title": "Campfire night", "capacity": 4 });

    let res = app
        .post_form(
            routes::EVENTS,
            Some(&payload),
            vec![FilePart::gallery("a.jpg")],
            Some(&token),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_unknown_record_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get(&routes::activity(Uuid::now_v7())).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn update_by_non_owner_is_forbidden() {
    let app = TestApp::spawn().await;
    let owner = app.token("user-1");
    let other = app.token("user-2");
    let id = app.create_activity(&owner, vec![]).await.id();

    let patch = json!({ "title": "Hijacked" });
    let res = app
        .patch_form(&routes::activity(id), Some(&patch), vec![], Some(&other))
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    let stored = app.get(&routes::activity(id)).await;
    assert_eq!(stored.body["title"], "Sunrise hike");
}

#[tokio::test]
async fn update_replaces_cover_and_clears_location() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    let payload = json!({ "title": "Sunrise hike", "location": "North ridge" });
    let created = app
        .post_form(
            routes::ACTIVITIES,
            Some(&payload),
            vec![FilePart::cover("old.jpg")],
            Some(&token),
        )
        .await;
    assert_eq!(created.status, 201, "{}", created.text);
    let id = created.id();
    let old_cover = created.body["cover_image"].as_str().unwrap().to_string();

    let patch = json!({ "location": null });
    let res = app
        .patch_form(
            &routes::activity(id),
            Some(&patch),
            vec![FilePart::cover("new.jpg")],
            Some(&token),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["location"].is_null());
    assert_eq!(res.body["title"], "Sunrise hike");
    assert_ne!(res.body["cover_image"], old_cover.as_str());

    let old_path = old_cover.trim_start_matches(&app.url(""));
    assert_eq!(app.get(old_path).await.status, 404);
}

#[tokio::test]
async fn update_with_kept_gallery() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    let created = app
        .create_activity(
            &token,
            vec![FilePart::gallery("a.jpg"), FilePart::gallery("b.jpg")],
        )
        .await;
    let id = created.id();
    let first = created.body["gallery_images"][0].as_str().unwrap().to_string();

    let patch = json!({ "kept_gallery_images": [first] });
    let res = app
        .patch_form(
            &routes::activity(id),
            Some(&patch),
            vec![FilePart::gallery("c.jpg")],
            Some(&token),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let gallery = res.body["gallery_images"].as_array().unwrap();
    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery[0], first.as_str());
}

#[tokio::test]
async fn delete_reports_reclaimed_blobs() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    let id = app
        .create_activity(
            &token,
            vec![FilePart::cover("cover.jpg"), FilePart::gallery("a.jpg")],
        )
        .await
        .id();

    let other = app.token("user-2");
    let res = app.delete(&routes::activity(id), Some(&other)).await;
    assert_eq!(res.status, 403);

    let res = app.delete(&routes::activity(id), Some(&token)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["removal_attempts"], 2);
    assert_eq!(res.body["removed"], 2);

    assert_eq!(app.get(&routes::activity(id)).await.status, 404);
    let res = app.delete(&routes::activity(id), Some(&token)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(app.create_activity(&token, vec![]).await.id());
    }

    let res = app
        .get(&format!("{}?page=1&per_page=2", routes::ACTIVITIES))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 3);
    assert_eq!(res.body["pagination"]["total_pages"], 2);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], ids[2].to_string());

    let res = app
        .get(&format!("{}?owner_id=user-2", routes::ACTIVITIES))
        .await;
    assert_eq!(res.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn list_reports_clamped_pagination() {
    let app = TestApp::spawn().await;
    let token = app.token("user-1");
    app.create_activity(&token, vec![]).await;

    let res = app
        .get(&format!("{}?page=0&per_page=500", routes::ACTIVITIES))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["page"], 1);
    assert_eq!(res.body["pagination"]["per_page"], 100);
    assert_eq!(res.body["pagination"]["total_pages"], 1);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Participation endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_and_leave_flow() {
    let app = TestApp::spawn().await;
    let host = app.token("host");
    let alice = app.token("alice");
    let bob = app.token("bob");
    let event_id = app.create_event(&host, 1).await;

    let res = app.post(&routes::participation(event_id), Some(&alice)).await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["user_id"], "alice");

    let res = app.post(&routes::participation(event_id), Some(&bob)).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CAPACITY_EXCEEDED");

    let roster = app.get(&routes::participants(event_id)).await;
    assert_eq!(roster.status, 200);
    assert_eq!(roster.body["participant_count"], 1);
    assert_eq!(roster.body["capacity"], 1);

    let res = app.delete(&routes::participation(event_id), Some(&alice)).await;
    assert_eq!(res.status, 204);

    let res = app.delete(&routes::participation(event_id), Some(&alice)).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "NOT_PARTICIPATING");

    let res = app.post(&routes::participation(event_id), Some(&bob)).await;
    assert_eq!(res.status, 201);
}

#[tokio::test]
async fn joining_twice_conflicts() {
    let app = TestApp::spawn().await;
    let host = app.token("host");
    let alice = app.token("alice");
    let event_id = app.create_event(&host, 10).await;

    assert_eq!(
        app.post(&routes::participation(event_id), Some(&alice))
            .await
            .status,
        201
    );
    let res = app.post(&routes::participation(event_id), Some(&alice)).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "ALREADY_JOINED");
}

#[tokio::test]
async fn join_requires_token_and_event() {
    let app = TestApp::spawn().await;
    let alice = app.token("alice");

    let res = app.post(&routes::participation(Uuid::now_v7()), None).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");

    let res = app
        .post(&routes::participation(Uuid::now_v7()), Some(&alice))
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn event_record_exposes_capacity() {
    let app = TestApp::spawn().await;
    let host = app.token("host");
    let event_id = app.create_event(&host, 12).await;

    let res = app.get(&routes::event(event_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["kind"], "event");
    assert_eq!(res.body["capacity"], 12);
}

// ---------------------------------------------------------------------------
// API docs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::OPENAPI).await;
    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/activities")));
    assert!(paths.contains_key("/api/v1/events/{id}/participation"));
}
