mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{CannedModel, Part, RateLimitedModel, app, app_with_model, multipart, png};

const URI: &str = "/api/posts/generate-caption";

#[tokio::test]
async fn captions_come_back_from_the_model() {
    let app = app_with_model(CannedModel(Some(
        "Golden hour #sunset #sky #glow\n---\nCalm waters #sea #blue #peace\n---\n\n---\nThird #a #b #c\n---\nFourth #x #y #z",
    )))
    .await;
    let (_, token) = app.user("alice");

    let reply = app.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        json!({
            "success": true,
            "captions": [
                "Golden hour #sunset #sky #glow",
                "Calm waters #sea #blue #peace",
                "Third #a #b #c",
            ],
            "message": "Captions generated successfully",
        })
    );
    assert_eq!(reply.headers["ratelimit-limit"], "10");
    assert_eq!(reply.headers["ratelimit-remaining"], "9");
}

#[tokio::test]
async fn missing_image_and_wrong_type_are_rejected() {
    let app = app_with_model(CannedModel(Some("unused"))).await;
    let (_, token) = app.user("alice");

    let none = app
        .send(multipart("POST", URI, Some(&token), &[Part::Text("caption", "x")]))
        .await;
    assert_eq!(none.status, StatusCode::BAD_REQUEST);
    assert_eq!(none.body, json!({ "success": false, "error": "No image file provided" }));

    let pdf = app
        .send(multipart(
            "POST",
            URI,
            Some(&token),
            &[Part::File {
                field: "image",
                file_name: "doc.pdf",
                content_type: "application/pdf",
                bytes: b"%PDF",
            }],
        ))
        .await;
    assert_eq!(pdf.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        pdf.error(),
        "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed."
    );
}

#[tokio::test]
async fn service_errors_are_reported_verbatim() {
    let disabled = app().await;
    let (_, token) = disabled.user("alice");
    let reply = disabled.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.error(),
        "Caption generation service is not available. Please configure OPENAI_API_KEY."
    );

    let limited = app_with_model(RateLimitedModel).await;
    let (_, token) = limited.user("alice");
    let reply = limited.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Rate limit exceeded. Please try again later.");

    let silent = app_with_model(CannedModel(None)).await;
    let (_, token) = silent.user("alice");
    let reply = silent.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.error(), "No captions generated from the AI model");

    let blank = app_with_model(CannedModel(Some("---\n---"))).await;
    let (_, token) = blank.user("alice");
    let reply = blank.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.error(), "Failed to parse captions from AI response");
}

#[tokio::test]
async fn eleventh_request_in_the_window_is_throttled() {
    let app = app_with_model(CannedModel(Some("only one"))).await;

    // Unauthenticated attempts still count against the window.
    for _ in 0..10 {
        let reply = app.send(multipart("POST", URI, None, &[png("image")])).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    let (_, token) = app.user("alice");
    let reply = app.send(multipart("POST", URI, Some(&token), &[png("image")])).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        reply.body,
        json!({
            "success": false,
            "error": "Too many caption generation requests. Please try again in 15 minutes.",
        })
    );
    assert_eq!(reply.headers["ratelimit-remaining"], "0");
}
