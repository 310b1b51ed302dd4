mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingCache, FakeAgent, Mode};
use folio_chat::cache::{session_key, CacheStore, MemoryCache};
use folio_chat::chat::{render, ChatService, TurnOutcome};
use tokio_util::sync::CancellationToken;

fn service(agent: Arc<FakeAgent>, cache: Arc<MemoryCache>) -> ChatService {
    ChatService::new(agent, cache)
}

#[tokio::test]
async fn blank_input_is_empty_outcome() {
    let agent = FakeAgent::new(Mode::Echo);
    let chat = service(agent.clone(), Arc::new(MemoryCache::new()));

    let outcome = chat.send("alice", " \t\n", &CancellationToken::new()).await;

    assert_eq!(outcome, TurnOutcome::Empty);
    assert_eq!(outcome.into_html(), "");
    assert_eq!(agent.calls(), 0);
}

#[tokio::test]
async fn reply_markdown_is_rendered_and_escaped() {
    let chat = service(FakeAgent::new(Mode::Echo), Arc::new(MemoryCache::new()));

    let outcome = chat
        .send("alice", "**bold** <script>alert(1)</script>", &CancellationToken::new())
        .await;

    let TurnOutcome::Reply(html) = outcome else {
        panic!("expected a reply, got {outcome:?}");
    };
    assert!(html.contains("<strong>bold</strong>"));
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn cancelled_turn_persists_nothing() {
    let cache = Arc::new(MemoryCache::new());
    cache
        .set(&session_key("alice"), br#"{"turns":5}"#, Duration::from_secs(60))
        .await
        .unwrap();
    let chat = service(FakeAgent::new(Mode::Hang), cache.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), chat.send("alice", "hello", &cancel))
        .await
        .expect("cancellation did not stop the turn");

    assert_eq!(outcome, TurnOutcome::Failed(render::bot_error()));
    let stored = cache.get(&session_key("alice")).await.unwrap();
    assert_eq!(stored.as_deref(), Some(br#"{"turns":5}"#.as_slice()));
}

#[tokio::test]
async fn already_cancelled_turn_never_reaches_the_model_reply() {
    let cache = Arc::new(MemoryCache::new());
    let agent = FakeAgent::new(Mode::Echo);
    let chat = service(agent, cache.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = chat.send("alice", "hello", &cancel).await;

    assert!(matches!(outcome, TurnOutcome::Failed(_)));
    assert_eq!(cache.get(&session_key("alice")).await.unwrap(), None);
}

#[tokio::test]
async fn stored_session_bytes_survive_a_failed_turn() {
    // Unusual but valid formatting must not be normalized away
    let payload = b"{ \"turns\" : 7 }";
    let cache = Arc::new(MemoryCache::new());
    cache
        .set(&session_key("alice"), payload, Duration::from_secs(60))
        .await
        .unwrap();
    let chat = service(FakeAgent::new(Mode::Fail), cache.clone());

    chat.send("alice", "hello", &CancellationToken::new()).await;

    let stored = cache.get(&session_key("alice")).await.unwrap();
    assert_eq!(stored.as_deref(), Some(payload.as_slice()));
}

#[tokio::test]
async fn cache_outage_fails_before_calling_the_model() {
    let agent = FakeAgent::new(Mode::Echo);
    let chat = ChatService::new(agent.clone(), Arc::new(FailingCache));

    let outcome = chat.send("alice", "hello", &CancellationToken::new()).await;

    assert_eq!(outcome, TurnOutcome::Failed(render::bot_error()));
    assert_eq!(agent.calls(), 0);
}

#[tokio::test]
async fn reset_clears_only_the_callers_session() {
    let cache = Arc::new(MemoryCache::new());
    let chat = service(FakeAgent::new(Mode::Echo), cache.clone());
    let cancel = CancellationToken::new();
    chat.send("alice", "hi", &cancel).await;
    chat.send("bob", "hi", &cancel).await;

    chat.reset("alice").await.unwrap();
    chat.reset("alice").await.unwrap();

    assert_eq!(cache.get(&session_key("alice")).await.unwrap(), None);
    assert!(cache.get(&session_key("bob")).await.unwrap().is_some());
}

#[tokio::test]
async fn health_does_not_touch_the_cache() {
    let cache = Arc::new(MemoryCache::new());
    let chat = service(FakeAgent::new(Mode::Echo), cache.clone());

    let greeting = chat.health().await.unwrap();

    assert_eq!(greeting, "echo: Say hello from Ollama");
    assert!(cache.is_empty().await);
}
