//! Exactly-once settlement under retries and store failures.
//!
//! These tests verify that an outcome lands at most once no matter how often
//! settlement is driven, and that an outcome whose writes keep failing is held
//! rather than lost.

#[cfg(test)]
mod tests {
    use crate::{
        games::GameResult,
        metrics::Metrics,
        mocks::FlakyStore,
        settlement::{Outcome, Resolution, RetryPolicy, SettlementEngine, SettlementError, SettlementTicket},
        store::AccountStore as _,
        Arcade, ArcadeConfig, Clock, MemoryStore, Routed, SessionError, StartRequest,
    };
    use arcade_types::{
        casino::{Interaction, InteractionKind},
        Account, Activity, ChannelId, GameKind, UserId,
    };
    use std::{sync::Arc, time::Duration};

    const PLAYER: UserId = UserId(7);

    fn flaky_store(balance: i64) -> Arc<FlakyStore> {
        FlakyStore::new(MemoryStore::with_accounts([Account {
            balance,
            ..Account::new(PLAYER)
        }]))
    }

    fn retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        }
    }

    fn dice_win(session_id: u64) -> Outcome {
        Outcome::from_result(
            session_id,
            Activity::Dice,
            Resolution::Completed,
            &GameResult::Win(30),
            &[PLAYER],
            10,
            None,
            5_000,
        )
    }

    async fn balance(store: &FlakyStore) -> i64 {
        store.inner().load(PLAYER).await.unwrap().balance
    }

    /// Route a button press once the session expects `actor`.
    async fn press(
        arcade: &Arcade<FlakyStore>,
        channel: ChannelId,
        actor: UserId,
        payload: &str,
    ) -> Routed {
        let interaction = Interaction {
            actor,
            channel,
            kind: InteractionKind::Button,
            payload: payload.to_string(),
            arrival_ms: 0,
        };
        loop {
            match arcade.route(interaction.clone()).await {
                Routed::NotExpected { .. } => tokio::task::yield_now().await,
                routed => return routed,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let store = flaky_store(100);
        let metrics = Metrics::default();
        let engine = SettlementEngine::new(store.clone(), retry(5), metrics.clone());
        store.fail_next(2);

        let ticket = SettlementTicket::new(1);
        let receipt = engine.settle(&ticket, dice_win(1)).await.unwrap();

        assert!(receipt.applied);
        assert_eq!(receipt.deltas, vec![(PLAYER, 30)]);
        assert_eq!(store.attempts(), 3);
        assert_eq!(store.writes(), 1);
        assert_eq!(metrics.settlement_retries.get(), 2);
        assert_eq!(balance(&store).await, 130);
        assert!(engine.pending().is_empty());
    }

    #[tokio::test]
    async fn test_second_settle_returns_first_receipt() {
        let store = flaky_store(100);
        let engine = SettlementEngine::new(store.clone(), retry(3), Metrics::default());
        let ticket = SettlementTicket::new(1);

        let first = engine.settle(&ticket, dice_win(1)).await.unwrap();
        let second = engine.settle(&ticket, dice_win(1)).await.unwrap();

        assert_eq!(first, second);
        assert!(ticket.is_settled());
        assert_eq!(store.writes(), 1);
        assert_eq!(balance(&store).await, 130);
    }

    #[tokio::test]
    async fn test_concurrent_settles_write_once() {
        let store = flaky_store(100);
        let engine = SettlementEngine::new(store.clone(), retry(3), Metrics::default());
        let ticket = SettlementTicket::new(1);

        let (a, b) = futures::join!(
            engine.settle(&ticket, dice_win(1)),
            engine.settle(&ticket, dice_win(1))
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.writes(), 1);
        assert_eq!(balance(&store).await, 130);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_hold_the_outcome() {
        let store = flaky_store(100);
        let engine = SettlementEngine::new(store.clone(), retry(3), Metrics::default());
        store.fail_next(3);

        let ticket = SettlementTicket::new(4);
        let err = engine.settle(&ticket, dice_win(4)).await.unwrap_err();
        match err {
            SettlementError::Pending { session_id, attempts, .. } => {
                assert_eq!(session_id, 4);
                assert_eq!(attempts, 3);
            }
        }
        assert_eq!(engine.pending(), vec![4]);
        assert_eq!(balance(&store).await, 100);

        // A direct re-settle lands the outcome; the held copy then resolves
        // to the same receipt without writing again.
        let receipt = engine.settle(&ticket, dice_win(4)).await.unwrap();
        assert_eq!(receipt.deltas, vec![(PLAYER, 30)]);
        assert_eq!(engine.pending(), vec![4]);

        let retried = engine.retry_held().await;
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0], receipt);
        assert!(engine.pending().is_empty());
        assert!(engine.retry_held().await.is_empty());
        assert_eq!(store.writes(), 1);
        assert_eq!(balance(&store).await, 130);
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_session_releases_scope_and_settles_later() {
        let store = flaky_store(100);
        let config = ArcadeConfig {
            retry: retry(2),
            ..ArcadeConfig::default()
        };
        let arcade = Arcade::new(store.clone(), config, Clock::starting_at(1_000_000));
        store.fail_next(2);

        let handle = arcade
            .start_session(StartRequest::new(GameKind::Dice, ChannelId(1), vec![PLAYER], 20))
            .await
            .unwrap();
        let session_id = handle.session_id;
        match handle.receipt().await {
            Err(SessionError::Settlement(SettlementError::Pending { session_id: held, .. })) => {
                assert_eq!(held, session_id);
            }
            other => panic!("expected a held settlement, got {other:?}"),
        }
        assert_eq!(arcade.pending_settlements(), vec![session_id]);
        assert_eq!(arcade.registry().active(), 0);
        assert_eq!(balance(&store).await, 100);

        let receipts = arcade.retry_held().await;
        assert_eq!(receipts.len(), 1);
        assert!(receipts[0].applied);
        let account = store.inner().load(PLAYER).await.unwrap();
        assert_eq!(account.balance, 100 + receipts[0].deltas[0].1);
        assert!(account.cooldowns.last_played(Activity::Dice).is_some());
        assert!(arcade.pending_settlements().is_empty());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pair_write_pays_neither_player() {
        const RIVAL: UserId = UserId(8);
        const TABLE: ChannelId = ChannelId(3);
        let store = FlakyStore::new(MemoryStore::with_accounts([
            Account {
                balance: 100,
                ..Account::new(PLAYER)
            },
            Account {
                balance: 100,
                ..Account::new(RIVAL)
            },
        ]));
        let config = ArcadeConfig {
            retry: retry(2),
            ..ArcadeConfig::default()
        };
        let arcade = Arcade::new(store.clone(), config, Clock::starting_at(1_000_000));
        let handle = arcade
            .start_session(StartRequest::new(GameKind::Connect4, TABLE, vec![PLAYER, RIVAL], 40))
            .await
            .unwrap();
        let session_id = handle.session_id;

        press(&arcade, TABLE, RIVAL, "c4:accept").await;
        for _ in 0..3 {
            press(&arcade, TABLE, PLAYER, "c4:0").await;
            press(&arcade, TABLE, RIVAL, "c4:1").await;
        }
        // Every write of the winning outcome fails.
        store.fail_next(2);
        assert_eq!(
            press(&arcade, TABLE, PLAYER, "c4:0").await,
            Routed::Delivered { session_id }
        );

        match handle.receipt().await {
            Err(SessionError::Settlement(SettlementError::Pending { session_id: held, .. })) => {
                assert_eq!(held, session_id);
            }
            other => panic!("expected a held settlement, got {other:?}"),
        }
        assert_eq!(store.attempts(), 2);
        assert_eq!(store.writes(), 0);
        for user in [PLAYER, RIVAL] {
            let account = store.inner().load(user).await.unwrap();
            assert_eq!(account.balance, 100);
            assert_eq!(account.cooldowns.last_played(Activity::Connect4), None);
        }
        assert_eq!(arcade.pending_settlements(), vec![session_id]);
        assert_eq!(arcade.registry().active(), 0);

        let receipts = arcade.retry_held().await;
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].deltas, vec![(PLAYER, 40), (RIVAL, -40)]);
        assert_eq!(store.inner().load(PLAYER).await.unwrap().balance, 140);
        assert_eq!(store.inner().load(RIVAL).await.unwrap().balance, 60);
        assert_eq!(store.writes(), 1);
        assert!(arcade.retry_held().await.is_empty());
    }
}
