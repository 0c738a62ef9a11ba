//! tests/api/subscriptions.rs

use crate::helpers::{extract_link_path, setup};
use newsletter_signup::domain::{ChangeAction, NewsletterId, SubscriptionStatus};
use serde_json::json;
use wiremock::{
    matchers::{any, method},
    Mock, ResponseTemplate,
};

#[tokio::test]
async fn subscribe_returns_a_200_naming_the_newsletter() {
    // Arrange
    let test = setup().await;
    test.accept_emails().await;

    // Act
    let response = test
        .post_subscribe(json!({ "email": "a@b.com", "newsletterId": "1" }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "response": "a@b.com was subscribed to the newsletter(s) Weekly" })
    );
}

#[tokio::test]
async fn subscribe_joins_the_names_of_all_requested_newsletters() {
    // Arrange
    let test = setup().await;
    test.accept_emails().await;

    // Act
    let response = test
        .post_subscribe(json!({ "email": "a@b.com", "newsletterId": ["1", 2] }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["response"],
        "a@b.com was subscribed to the newsletter(s) Weekly, Monthly Digest"
    );
}

#[tokio::test]
async fn subscribe_persists_exactly_one_unconfirmed_subscriber() {
    // Arrange
    let test = setup().await;
    test.accept_emails().await;

    // Act
    test.post_subscribe(json!({ "email": "ursula_le_guin@gmail.com", "newsletterId": ["1", "2"] }))
        .await;

    // Assert
    assert_eq!(test.subscribers.count(), 1);
    let saved = test.subscriber("ursula_le_guin@gmail.com").await;
    for id in ["1", "2"] {
        let id = NewsletterId::new(id);
        assert_eq!(saved.status(&id), Some(SubscriptionStatus::Unconfirmed));
        assert_eq!(saved.changes().get(&id), Some(&ChangeAction::Subscribe));
    }
}

#[tokio::test]
async fn subscribing_an_existing_email_reuses_the_subscriber() {
    // Arrange
    let test = setup().await;
    test.accept_emails().await;

    // Act
    for newsletter in ["1", "2"] {
        let response = test
            .post_subscribe(json!({ "email": "ursula_le_guin@gmail.com", "newsletterId": newsletter }))
            .await;
        assert_eq!(200, response.status().as_u16());
    }

    // Assert
    assert_eq!(test.subscribers.count(), 1);
    let saved = test.subscriber("ursula_le_guin@gmail.com").await;
    assert_eq!(saved.changes().len(), 2);
}

#[tokio::test]
async fn subscribe_sends_one_confirmation_email_with_a_combined_link() {
    // Arrange
    let test = setup().await;

    Mock::given(any())
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&test.email_server)
        .await;

    // Act
    test.post_subscribe(json!({ "email": "ursula_le_guin@gmail.com", "newsletterId": ["1", "2"] }))
        .await;

    // Assert
    let email = test.received_email().await;
    assert_eq!(email.to[0].email, "ursula_le_guin@gmail.com");
    let saved = test.subscriber("ursula_le_guin@gmail.com").await;
    let link = extract_link_path(&email.html_content);
    assert!(link.starts_with(&format!("/confirm-combined/{}/", saved.id)));
}

#[tokio::test]
async fn subscribe_rejects_invalid_emails_before_touching_storage() {
    // Arrange
    let test = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&test.email_server)
        .await;

    let test_cases = vec![
        (json!({ "newsletterId": "1" }), "missing the email"),
        (json!({ "email": "", "newsletterId": "1" }), "empty email"),
        (json!({ "email": "ursula_le_guin", "newsletterId": "1" }), "invalid email"),
        (json!({ "email": "@gmail.com", "newsletterId": "1" }), "missing local part"),
        (json!({ "email": 5, "newsletterId": "1" }), "a number"),
        (json!({ "email": ["a@b.com"], "newsletterId": "1" }), "a list"),
        (json!({ "email": true, "newsletterId": "1" }), "a bool"),
    ];

    for (body, error_message) in test_cases {
        // Act
        let response = test.post_subscribe(body).await;

        // Assert
        assert_eq!(
            500,
            response.status().as_u16(),
            "The API did not reject the payload when it was {}.",
            error_message
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "message": "Invalid or missing E-Mail." }));
    }

    assert_eq!(test.subscribers.count(), 0);
}

#[tokio::test]
async fn subscribe_requires_a_newsletter_id() {
    // Arrange
    let test = setup().await;
    let test_cases = vec![
        (json!({ "email": "a@b.com" }), "missing the newsletter id"),
        (json!({ "email": "a@b.com", "newsletterId": "" }), "empty newsletter id"),
        (json!({ "email": "a@b.com", "newsletterId": [] }), "empty list"),
        (json!({ "email": "a@b.com", "newsletterId": null }), "null newsletter id"),
        (json!({ "email": "a@b.com", "newsletterId": true }), "a bool"),
        (json!({ "email": "a@b.com", "newsletterId": -1 }), "a negative number"),
        (json!({ "email": "a@b.com", "newsletterId": 1.5 }), "a fraction"),
        (json!({ "email": "a@b.com", "newsletterId": [["1"]] }), "a nested list"),
    ];

    for (body, error_message) in test_cases {
        // Act
        let response = test.post_subscribe(body).await;

        // Assert
        assert_eq!(
            500,
            response.status().as_u16(),
            "The API did not reject the payload when it was {}.",
            error_message
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body["message"],
            "You must provide the newsletter id to subscribe to."
        );
    }

    assert_eq!(test.subscribers.count(), 0);
}

#[tokio::test]
async fn subscribe_rejects_unknown_newsletters() {
    // Arrange
    let test = setup().await;

    // Act
    let response = test
        .post_subscribe(json!({ "email": "a@b.com", "newsletterId": ["1", "99"] }))
        .await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unknown newsletter id: 99");
    assert_eq!(test.subscribers.count(), 0);
}

#[tokio::test]
async fn subscribe_accepts_json_bodies_without_a_json_content_type() {
    // Arrange
    let test = setup().await;
    test.accept_emails().await;
    let body = r#"{"email": "a@b.com", "newsletterId": "1"}"#;

    let test_cases = vec![
        (Some("text/plain"), "text/plain"),
        (Some("application/x-www-form-urlencoded"), "a form content type"),
        (None, "no content type"),
    ];

    for (content_type, description) in test_cases {
        // Act
        let response = test.post_with_content_type("/subscribe", body, content_type).await;

        // Assert
        assert_eq!(
            200,
            response.status().as_u16(),
            "The API did not accept the body when it was sent with {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body["response"],
            "a@b.com was subscribed to the newsletter(s) Weekly"
        );
    }
}

#[tokio::test]
async fn subscribe_returns_a_400_for_a_body_that_is_not_json() {
    // Arrange
    let test = setup().await;

    // Act
    let response = test.post_raw("/subscribe", "email=a%40b.com".into()).await;

    // Assert
    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn subscribe_fails_if_the_confirmation_email_cannot_be_sent() {
    // Arrange
    let test = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test.email_server)
        .await;

    // Act
    let response = test
        .post_subscribe(json!({ "email": "a@b.com", "newsletterId": "1" }))
        .await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to register the subscription.");
}
