use crate::client::*;
use crate::domain_model::*;
use crate::logger::*;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ToggleResponse {
    pub liked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Disabled or guest rendering; nothing happened.
    Ignored,
    Applied { liked: bool, count: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error("unknown like button {0:?}")]
    UnknownButton(ButtonId),
    #[error("could not update like: {0}")]
    Api(#[from] ApiError),
}

/// Count shown for the server's answer, relative to the count before the click.
pub fn reconciled_count(base: u64, liked: bool) -> u64 {
    if liked {
        base.saturating_add(1)
    } else {
        base.saturating_sub(1)
    }
}

pub struct LikeToggleController {
    board: Arc<LikeBoard>,
    recent: Arc<RecentActions>,
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
    vault: Arc<TokenVault>,
    toggle_path: String,
}

impl LikeToggleController {
    pub fn new(
        board: Arc<LikeBoard>,
        recent: Arc<RecentActions>,
        api: Arc<ApiClient>,
        session: Arc<SessionManager>,
        vault: Arc<TokenVault>,
        toggle_path: String,
    ) -> Self {
        Self {
            board,
            recent,
            api,
            session,
            vault,
            toggle_path,
        }
    }

    fn toggle_path_for(&self, tweet_id: TweetId) -> String {
        self.toggle_path.replace("{tweet_id}", &tweet_id.to_string())
    }

    pub async fn toggle(&self, button: ButtonId) -> Result<ToggleOutcome, ToggleError> {
        // Read, flip and disable in one step so a second click sees the new state.
        let started = self
            .board
            .update(button, |state| {
                if state.disabled || state.guest {
                    return None;
                }
                let base = (state.liked, state.count);
                state.liked = !state.liked;
                state.count = reconciled_count(state.count, state.liked);
                state.disabled = true;
                Some((state.tweet_id, base))
            })
            .ok_or(ToggleError::UnknownButton(button))?;

        let Some((tweet_id, (base_liked, base_count))) = started else {
            trace!(?button, "ignoring toggle on inactive button");
            return Ok(ToggleOutcome::Ignored);
        };
        let optimistic_liked = !base_liked;

        // Before the request: the push echo may arrive ahead of the response.
        self.recent.mark(tweet_id);

        let response = self
            .api
            .post::<ToggleResponse>(&self.toggle_path_for(tweet_id), None)
            .await;

        let confirmed = match response {
            Ok(Some(ToggleResponse { liked })) => Ok(liked),
            Ok(None) => Err(ApiError::MalformedBody),
            Err(e) if e.kind() == ErrorKind::Conflict => {
                debug!(tweet_id = %tweet_id, "like already recorded, converging to liked");
                Ok(true)
            }
            Err(e) => Err(e),
        };

        match confirmed {
            Ok(liked) => {
                let count = self
                    .board
                    .update(button, |state| {
                        if liked != optimistic_liked {
                            state.count = reconciled_count(base_count, liked);
                        }
                        state.liked = liked;
                        state.disabled = false;
                        state.count
                    })
                    .unwrap_or_else(|| reconciled_count(base_count, liked));

                if let Err(e) = self.vault.set_like_mark(tweet_id, liked) {
                    warn!(tweet_id = %tweet_id, error = %e, "could not persist like mark");
                }
                debug!(tweet_id = %tweet_id, liked, count, "like toggled");
                Ok(ToggleOutcome::Applied { liked, count })
            }
            Err(e) => {
                self.board.update(button, |state| {
                    state.liked = base_liked;
                    state.count = base_count;
                    state.disabled = false;
                });
                warn!(tweet_id = %tweet_id, error = %e, "like toggle failed, rolled back");
                Err(ToggleError::Api(e))
            }
        }
    }

    /// Guest renderings unless the session is live or can be refreshed; cached
    /// marks otherwise. Returns whether a user is signed in.
    pub async fn apply_session_state(&self) -> bool {
        let authenticated = self.session.ensure_valid_token().await.is_some()
            && self.vault.user_id().is_some();
        self.board.set_guest(!authenticated);
        if authenticated {
            self.board.apply_liked_marks(&self.vault.like_marks());
        }
        authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use crate::infra::{FakeResponse, FakeTransport};
    use std::time::Duration;

    const TOGGLE: &str = "/likes/toggle";

    fn setup() -> (ClientContext, Arc<FakeTransport>, TweetId) {
        let transport = Arc::new(FakeTransport::new());
        let client = test_client(transport.clone(), "/feed");
        client
            .vault
            .set_tokens(&access_token_expiring_in(3600), "r1")
            .unwrap();
        (client, transport, TweetId(uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn confirmed_like_keeps_optimistic_state_and_persists_mark() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 4));
        transport.respond(TOGGLE, FakeResponse::json(200, serde_json::json!({ "liked": true })));

        let outcome = client.toggle.toggle(button).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Applied { liked: true, count: 5 });
        let state = client.board.get(button).unwrap();
        assert!(state.liked && !state.disabled);
        assert_eq!(client.vault.like_marks().get(&tweet), Some(&true));
        assert!(transport.requests()[0].url.ends_with(&format!("/api/tweets/{tweet}/likes/toggle")));
    }

    #[tokio::test]
    async fn disagreeing_server_answer_is_reconciled_from_the_base_count() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 4));
        transport.respond(TOGGLE, FakeResponse::json(200, serde_json::json!({ "liked": false })));

        let outcome = client.toggle.toggle(button).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Applied { liked: false, count: 3 });
        assert!(!client.board.get(button).unwrap().liked);
        assert!(client.vault.like_marks().get(&tweet).is_none());
    }

    #[tokio::test]
    async fn failure_rolls_back() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, true, 9));
        transport.respond(TOGGLE, FakeResponse::status(500));

        let error = client.toggle.toggle(button).await.unwrap_err();

        assert!(matches!(error, ToggleError::Api(_)));
        assert_eq!(
            client.board.get(button).unwrap(),
            LikeButtonState::new(tweet, true, 9)
        );
    }

    #[tokio::test]
    async fn conflict_converges_to_liked() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 2));
        transport.respond(
            TOGGLE,
            FakeResponse::json(
                409,
                serde_json::json!({ "error": { "code": "LIKE_ALREADY_EXISTS", "message": "x" } }),
            ),
        );

        let outcome = client.toggle.toggle(button).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Applied { liked: true, count: 3 });
    }

    #[tokio::test]
    async fn unlike_at_zero_never_goes_negative() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, true, 0));
        transport.respond(TOGGLE, FakeResponse::json(200, serde_json::json!({ "liked": false })));

        let outcome = client.toggle.toggle(button).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Applied { liked: false, count: 0 });
    }

    #[tokio::test]
    async fn second_click_while_in_flight_is_ignored() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 0));
        transport.respond(
            TOGGLE,
            FakeResponse::json(200, serde_json::json!({ "liked": true }))
                .delayed(Duration::from_millis(50)),
        );

        let (first, second) = tokio::join!(client.toggle.toggle(button), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.toggle.toggle(button).await
        });

        assert_eq!(first.unwrap(), ToggleOutcome::Applied { liked: true, count: 1 });
        assert_eq!(second.unwrap(), ToggleOutcome::Ignored);
        assert_eq!(transport.count(TOGGLE), 1);
    }

    #[tokio::test]
    async fn marks_recent_action_before_the_request_completes() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 0));
        transport.respond(
            TOGGLE,
            FakeResponse::json(200, serde_json::json!({ "liked": true }))
                .delayed(Duration::from_millis(50)),
        );

        let (_, seen_during_request) = tokio::join!(client.toggle.toggle(button), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.recent.is_recent(tweet)
        });

        assert!(seen_during_request);
    }

    #[tokio::test]
    async fn guest_and_unknown_buttons() {
        let (client, transport, tweet) = setup();
        let button = client.board.render(LikeButtonState::new(tweet, false, 0));
        client.vault.clear().unwrap();

        client.toggle.apply_session_state().await;
        assert_eq!(client.toggle.toggle(button).await.unwrap(), ToggleOutcome::Ignored);

        client.board.remove(button);
        assert!(matches!(
            client.toggle.toggle(button).await,
            Err(ToggleError::UnknownButton(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn expired_access_token_is_refreshed_before_deciding_guest_state() {
        let transport = Arc::new(FakeTransport::new());
        let client = test_client(transport.clone(), "/feed");
        client
            .vault
            .set_tokens(&access_token_expiring_in(-10), "r1")
            .unwrap();
        transport.respond(
            "/api/token/refresh",
            FakeResponse::json(
                200,
                serde_json::json!({ "token": access_token_expiring_in(3600), "refresh_token": "r2" }),
            ),
        );
        transport.respond(TOGGLE, FakeResponse::json(200, serde_json::json!({ "liked": true })));
        let tweet = TweetId(uuid::Uuid::new_v4());
        let button = client.board.render(LikeButtonState::new(tweet, false, 0));

        assert!(client.toggle.apply_session_state().await);
        assert!(!client.board.get(button).unwrap().guest);

        let outcome = client.toggle.toggle(button).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Applied { liked: true, count: 1 });
        assert_eq!(transport.count("/api/token/refresh"), 1);
        assert_eq!(transport.count(TOGGLE), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_leaves_buttons_in_guest_state() {
        let transport = Arc::new(FakeTransport::new());
        let client = test_client(transport.clone(), "/feed");
        client
            .vault
            .set_tokens(&access_token_expiring_in(-10), "r1")
            .unwrap();
        transport.respond(
            "/api/token/refresh",
            FakeResponse::json(
                401,
                serde_json::json!({ "error": { "code": "AUTH_TOKEN_INVALID", "message": "x" } }),
            ),
        );
        let button = client
            .board
            .render(LikeButtonState::new(TweetId(uuid::Uuid::new_v4()), false, 0));

        assert!(!client.toggle.apply_session_state().await);
        assert!(client.board.get(button).unwrap().guest);
        assert_eq!(client.toggle.toggle(button).await.unwrap(), ToggleOutcome::Ignored);
        assert_eq!(transport.count(TOGGLE), 0);
    }

    #[tokio::test]
    async fn session_state_applies_cached_marks() {
        let (client, _, tweet) = setup();
        client.vault.set_like_mark(tweet, true).unwrap();
        let button = client.board.render(LikeButtonState::new(tweet, false, 1));

        client.toggle.apply_session_state().await;

        let state = client.board.get(button).unwrap();
        assert!(state.liked);
        assert!(!state.guest);
    }
}
