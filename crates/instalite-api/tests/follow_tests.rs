mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, delete, get, json as json_req};

#[tokio::test]
async fn follow_and_unfollow_round_trip() {
    let app = app().await;
    let (alice, token) = app.user("alice");
    let (bob, _) = app.user("bob");
    let uri = format!("/api/users/{bob}/follow");

    let followed = app.send(json_req("POST", &uri, Some(&token), json!({}))).await;
    assert_eq!(followed.status, StatusCode::CREATED);
    assert_eq!(followed.body["success"], true);
    assert_eq!(followed.body["message"], "User followed successfully");
    let data = &followed.body["data"];
    assert_eq!(data["followerId"], alice);
    assert_eq!(data["followingId"], bob);
    assert_eq!(data["followingCount"], 1);
    assert!(data["followId"].as_i64().is_some());
    assert!(data["createdAt"].as_str().is_some());

    let again = app.send(json_req("POST", &uri, Some(&token), json!({}))).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.error(), "Already following this user");

    let unfollowed = app.send(delete(&uri, Some(&token))).await;
    assert_eq!(unfollowed.status, StatusCode::OK);
    assert_eq!(
        unfollowed.body,
        json!({
            "success": true,
            "message": "User unfollowed successfully",
            "data": { "followingId": bob, "followingCount": 0 },
        })
    );

    let not_following = app.send(delete(&uri, Some(&token))).await;
    assert_eq!(not_following.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_following.error(), "Not following this user");
}

#[tokio::test]
async fn follow_rejects_bad_targets() {
    let app = app().await;
    let (alice, token) = app.user("alice");

    let own = app
        .send(json_req("POST", &format!("/api/users/{alice}/follow"), Some(&token), json!({})))
        .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);
    assert_eq!(own.body, json!({ "success": false, "error": "Cannot follow yourself" }));

    let bad_id = app
        .send(json_req("POST", "/api/users/abc/follow", Some(&token), json!({})))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.error(), "Invalid user ID format");

    let unknown = app
        .send(json_req("POST", "/api/users/4242/follow", Some(&token), json!({})))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.error(), "User not found");

    let anonymous = app.send(json_req("POST", "/api/users/1/follow", None, json!({}))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn follow_id_uses_its_leading_digits() {
    let app = app().await;
    let (_, token) = app.user("alice");
    let (bob, _) = app.user("bob");

    let reply = app
        .send(json_req("POST", &format!("/api/users/{bob}abc/follow"), Some(&token), json!({})))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["followingId"], bob);
}

#[tokio::test]
async fn follow_lookup_failure_is_a_database_error() {
    let app = app().await;
    let (_, token) = app.user("alice");
    let (bob, _) = app.user("bob");
    app.state
        .db
        .with_conn(|c| Ok(c.execute_batch("DROP TABLE user_follows")?))
        .unwrap();

    let reply = app
        .send(json_req("POST", &format!("/api/users/{bob}/follow"), Some(&token), json!({})))
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, json!({ "success": false, "error": "Database error" }));
}

#[tokio::test]
async fn followers_are_paginated_with_limit_clamped() {
    let app = app().await;
    let (star, _) = app.user("star");
    let mut fans = Vec::new();
    for i in 0..3 {
        let (fan, _) = app.user(&format!("fan{i}"));
        app.state.db.follow_user(fan, star).unwrap();
        fans.push(fan);
    }

    let reply = app
        .send(get(&format!("/api/users/{star}/followers?page=2&limit=2"), None))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let data = &reply.body["data"];
    assert_eq!(data["page"], 2);
    assert_eq!(data["limit"], 2);
    assert_eq!(data["total"], 3);
    assert_eq!(data["totalPages"], 2);
    let followers = data["followers"].as_array().unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0]["id"], fans[0]);
    assert!(followers[0]["followedAt"].as_str().is_some());

    let clamped = app
        .send(get(&format!("/api/users/{star}/followers?limit=500&page=0"), None))
        .await;
    assert_eq!(clamped.body["data"]["limit"], 100);
    assert_eq!(clamped.body["data"]["page"], 1);
    assert_eq!(clamped.body["data"]["followers"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn following_is_listed_by_username() {
    let app = app().await;
    let (me, _) = app.user("me");
    for name in ["zoe", "adam", "mia"] {
        let (other, _) = app.user(name);
        app.state.db.follow_user(me, other).unwrap();
    }

    let reply = app.send(get(&format!("/api/users/{me}/following"), None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let names: Vec<&str> = reply.body["data"]["following"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["adam", "mia", "zoe"]);
    assert!(reply.body["data"]["following"][0]["followingSince"].as_str().is_some());
    assert_eq!(reply.body["data"]["totalPages"], 1);
}

#[tokio::test]
async fn listing_unknown_or_malformed_user_fails() {
    let app = app().await;

    let unknown = app.send(get("/api/users/77/following", None)).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.error(), "User not found");

    let malformed = app.send(get("/api/users/x1/followers", None)).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error(), "Invalid user ID format");
}

#[tokio::test]
async fn following_status_checks() {
    let app = app().await;
    let (alice, token) = app.user("alice");
    let (bob, _) = app.user("bob");

    let before = app
        .send(get(&format!("/api/users/{alice}/following-status/{bob}"), Some(&token)))
        .await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(
        before.body["data"],
        json!({
            "isFollowing": false,
            "followedAt": null,
            "targetUserId": bob,
            "currentUserId": alice,
        })
    );

    app.state.db.follow_user(alice, bob).unwrap();
    let after = app
        .send(get(&format!("/api/users/{alice}/following-status/{bob}"), Some(&token)))
        .await;
    assert_eq!(after.body["data"]["isFollowing"], true);
    assert!(after.body["data"]["followedAt"].as_str().is_some());

    let someone_else = app
        .send(get(&format!("/api/users/{bob}/following-status/{alice}"), Some(&token)))
        .await;
    assert_eq!(someone_else.status, StatusCode::FORBIDDEN);
    assert_eq!(someone_else.error(), "You can only check your own follow status");

    let myself = app
        .send(get(&format!("/api/users/{alice}/following-status/{alice}"), Some(&token)))
        .await;
    assert_eq!(myself.status, StatusCode::BAD_REQUEST);
    assert_eq!(myself.error(), "Cannot check follow status with yourself");

    let malformed = app
        .send(get(&format!("/api/users/{alice}/following-status/bob"), Some(&token)))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error(), "Invalid user ID format");
}
