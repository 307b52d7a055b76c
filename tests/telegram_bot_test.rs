//! Integration tests for bot update routing and reply caching
//!
//! Run with: cargo test --test telegram_bot_test

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{group_message, private_message, salary, RecordingTransport, TestEnvironment};
use techinterview::domain::{DeveloperGrade, KazakhstanCity};
use techinterview::telegram::update::{BotUpdate, BotUser, InlineQueryUpdate};
use techinterview::telegram::UpdateOutcome;

async fn seeded() -> TestEnvironment {
    let env = TestEnvironment::new();
    env.insert_all(&[
        salary(DeveloperGrade::Middle, KazakhstanCity::Almaty, 500_000.0, 1),
        salary(DeveloperGrade::Middle, KazakhstanCity::Almaty, 700_000.0, 3),
        salary(DeveloperGrade::Senior, KazakhstanCity::Astana, 1_200_000.0, 2),
    ])
    .await;
    env
}

#[tokio::test]
async fn test_word_order_shares_one_cached_reply() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());
    let cancel = CancellationToken::new();

    let first = bot
        .process_update(private_message(1, "dana", "middle almaty"), &cancel)
        .await
        .unwrap();
    let second = bot
        .process_update(private_message(2, "dana", "Алматы мидл"), &cancel)
        .await
        .unwrap();

    assert_eq!(first, UpdateOutcome::Replied);
    assert_eq!(second, UpdateOutcome::Replied);
    assert_eq!(env.services.caches.bot_replies.populations(), 1);

    let replies = transport.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].reply, replies[1].reply);
    assert_eq!(replies[0].reply_to, Some(1));
    assert_eq!(replies[1].reply_to, Some(2));
    assert!(replies[0].reply.reply_text.contains("<b>Middle</b> (2)"));
    assert_eq!(env.usage_count("dana"), 2);
}

#[tokio::test]
async fn test_start_command_bypasses_reply_cache() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());

    let outcome = bot
        .process_update(private_message(10, "dana", "/start"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::StartReplied);
    assert_eq!(env.services.caches.bot_replies.populations(), 0);
    assert_eq!(transport.identity_calls(), 0);

    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].reply_to, Some(10));
    assert_eq!(replies[0].reply.buttons.len(), 1);
    assert_eq!(env.usage_count("dana"), 0);
}

#[tokio::test]
async fn test_group_mention_replies_and_records_usage() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());
    let cancel = CancellationToken::new();

    let outcome = bot
        .process_update(
            group_message(20, "aigerim", "@Salary_Bot senior astana", Some("@Salary_Bot")),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Replied);

    bot.process_update(
        group_message(21, "aigerim", "@salary_bot senior astana", Some("@salary_bot")),
        &cancel,
    )
    .await
    .unwrap();

    let replies = transport.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].chat_id, -100);
    assert!(replies[0].reply.reply_text.contains("<b>Senior</b> (1)"));
    assert_eq!(transport.identity_calls(), 1);
    assert_eq!(env.usage_count("aigerim"), 2);
}

#[tokio::test]
async fn test_group_message_without_mention_is_ignored() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());
    let cancel = CancellationToken::new();

    let plain = bot
        .process_update(group_message(30, "aigerim", "middle almaty", None), &cancel)
        .await
        .unwrap();
    let other_bot = bot
        .process_update(
            group_message(31, "aigerim", "@other_bot middle", Some("@other_bot")),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(plain, UpdateOutcome::Ignored);
    assert_eq!(other_bot, UpdateOutcome::Ignored);
    assert!(transport.replies().is_empty());
    assert_eq!(env.usage_count("aigerim"), 0);
}

#[tokio::test]
async fn test_inline_query_is_answered_with_one_article() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());

    let update = BotUpdate::InlineQuery(InlineQueryUpdate {
        id: "q-1".to_string(),
        query: "middle almaty".to_string(),
        from: BotUser {
            id: 8,
            username: Some("dana".to_string()),
            first_name: "Dana".to_string(),
            last_name: None,
            language_code: Some("en".to_string()),
        },
    });

    let outcome = bot.handle_update(update, &CancellationToken::new()).await;
    assert_eq!(outcome, Some(UpdateOutcome::InlineQueryAnswered));

    let answers = transport.inline_answers();
    assert_eq!(answers.len(), 1);
    let (query_id, articles) = &answers[0];
    assert_eq!(query_id, "q-1");
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Salary statistics");
    assert!(articles[0].reply.reply_text.contains("Total submissions: 2"));
    assert_eq!(env.usage_count("dana"), 1);
}

#[tokio::test]
async fn test_reply_without_currency_feed_omits_usd() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());

    bot.process_update(private_message(40, "dana", "middle"), &CancellationToken::new())
        .await
        .unwrap();

    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    let text = &replies[0].reply.reply_text;
    assert!(text.contains("₸"));
    assert!(!text.contains("$"));
    assert!(replies[0].reply.buttons[0].url.contains("grade=2"));
}

#[tokio::test]
async fn test_cancelled_update_is_not_answered() {
    let env = seeded().await;
    let transport = Arc::new(RecordingTransport::with_username("salary_bot"));
    let bot = env.bot(transport.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = bot
        .handle_update(private_message(50, "dana", "middle almaty"), &cancel)
        .await;

    assert_eq!(outcome, None);
    assert!(transport.replies().is_empty());
    assert_eq!(env.services.caches.bot_replies.populations(), 0);
}
