// File: livecord-core/tests/token_cache_tests.rs

use std::sync::Arc;
use std::time::Duration;

use livecord_common::traits::SystemClock;
use livecord_core::Error;
use livecord_core::platforms::twitch::AppTokenCache;
use livecord_core::test_utils::CountingExchange;

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() -> Result<(), Error> {
    let exchange = Arc::new(CountingExchange::new(Duration::from_millis(50)));
    let cache = Arc::new(AppTokenCache::new(exchange.clone(), Arc::new(SystemClock)));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move { cache.get_token().await }));
    }

    for task in tasks {
        let token = task.await.expect("task panicked")?;
        assert_eq!(token.secret(), "token-1");
    }
    assert_eq!(exchange.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_forced_refreshes_collapse() -> Result<(), Error> {
    let exchange = Arc::new(CountingExchange::new(Duration::from_millis(20)));
    let cache = Arc::new(AppTokenCache::new(exchange.clone(), Arc::new(SystemClock)));
    let rejected = cache.get_token().await?;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let rejected = rejected.clone();
        tasks.push(tokio::spawn(async move { cache.force_refresh(&rejected).await }));
    }

    for task in tasks {
        let token = task.await.expect("task panicked")?;
        assert_eq!(token.secret(), "token-2");
    }
    assert_eq!(exchange.calls(), 2);
    Ok(())
}
