//! tests/api/subscriptions_confirm.rs

use crate::helpers::{now, setup, setup_with, Test};
use newsletter_signup::domain::{Subscriber, SubscriptionStatus};

fn link(test: &Test, subscriber: &Subscriber, action: &str, newsletter: &str, timestamp: i64) -> String {
    let hash = test
        .signer
        .sign(&subscriber.email, action, timestamp)
        .unwrap();
    format!(
        "/confirm/{}/{}/{}/{}/{}",
        action, subscriber.id, newsletter, timestamp, hash
    )
}

#[tokio::test]
async fn an_add_link_subscribes_to_the_newsletter() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;

    // Act
    let response = test.get(&link(&test, &subscriber, "add", "1", now())).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "You were successfully added to the subscriber list of Weekly."
    );
    assert_eq!(
        test.status(subscriber.id, "1").await,
        Some(SubscriptionStatus::Subscribed)
    );
}

#[tokio::test]
async fn a_remove_link_unsubscribes_from_the_newsletter() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    test.get(&link(&test, &subscriber, "add", "1", now())).await;

    // Act
    let response = test.get(&link(&test, &subscriber, "remove", "1", now())).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "You were successfully removed from the subscriber list of Weekly."
    );
    assert_eq!(
        test.status(subscriber.id, "1").await,
        Some(SubscriptionStatus::Unsubscribed)
    );
}

#[tokio::test]
async fn a_tampered_hash_is_rejected_with_a_500() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    let timestamp = now();
    let valid = link(&test, &subscriber, "add", "1", timestamp);
    let hash = valid.rsplit('/').next().unwrap().to_string();
    let forged = if hash.starts_with('a') { "b" } else { "a" };
    let tampered = format!(
        "/confirm/add/{}/1/{}/{}{}",
        subscriber.id,
        timestamp,
        forged,
        &hash[1..]
    );

    // Act
    let response = test.get(&tampered).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Something went wrong. Please try again.");
    assert_eq!(test.status(subscriber.id, "1").await, None);
}

#[tokio::test]
async fn a_hash_signed_for_another_action_is_rejected() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    let timestamp = now();
    let remove = link(&test, &subscriber, "remove", "1", timestamp);
    let hash = remove.rsplit('/').next().unwrap();

    // Act
    let response = test
        .get(&format!("/confirm/add/{}/1/{}/{}", subscriber.id, timestamp, hash))
        .await;

    // Assert
    assert_eq!(500, response.status().as_u16());
}

#[tokio::test]
async fn malformed_or_unknown_links_are_rejected_with_a_500() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    let timestamp = now();
    let hash = test
        .signer
        .sign(&subscriber.email, "add", timestamp)
        .unwrap();
    let unknown_action = link(&test, &subscriber, "frobnicate", "1", timestamp);

    let test_cases = vec![
        (
            format!("/confirm/add/{}/1/yesterday/{}", subscriber.id, hash),
            "a non numeric timestamp",
        ),
        (
            format!("/confirm/add/not-an-id/1/{}/{}", timestamp, hash),
            "a non numeric subscriber id",
        ),
        (
            format!("/confirm/add/{}/1/{}/{}", subscriber.id + 1, timestamp, hash),
            "an unknown subscriber",
        ),
        (
            format!("/confirm/add/{}/99/{}/{}", subscriber.id, timestamp, hash),
            "an unknown newsletter",
        ),
        (unknown_action, "an unknown action"),
    ];

    for (path, description) in test_cases {
        // Act
        let response = test.get(&path).await;

        // Assert
        assert_eq!(
            500,
            response.status().as_u16(),
            "The API did not fail with 500 when the link had {}.",
            description
        );
    }
}

#[tokio::test]
async fn an_expired_add_link_is_rejected_with_a_403() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    let two_days_ago = now() - 2 * 86400;

    // Act
    let response = test
        .get(&link(&test, &subscriber, "add", "1", two_days_ago))
        .await;

    // Assert
    assert_eq!(403, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "The link you used has expired. Please subscribe to the newsletter again."
    );
    assert_eq!(test.status(subscriber.id, "1").await, None);
}

#[tokio::test]
async fn an_expired_remove_link_still_unsubscribes() {
    // Arrange
    let test = setup().await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;
    test.get(&link(&test, &subscriber, "add", "1", now())).await;
    let two_days_ago = now() - 2 * 86400;

    // Act
    let response = test
        .get(&link(&test, &subscriber, "remove", "1", two_days_ago))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        test.status(subscriber.id, "1").await,
        Some(SubscriptionStatus::Unsubscribed)
    );
}

#[tokio::test]
async fn messages_are_german_by_default() {
    // Arrange
    let test = setup_with(|_| {}).await;
    let subscriber = test.create_subscriber("ursula_le_guin@gmail.com").await;

    // Act
    let response = test.get(&link(&test, &subscriber, "add", "1", now())).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Sie wurden erfolgreich zu der Abonnentenliste von Weekly hinzugefügt."
    );
}
