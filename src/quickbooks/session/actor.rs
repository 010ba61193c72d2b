use super::{AuthState, Session, TokenSet};
use crate::error::BridgeError;
use crate::quickbooks::oauth::QuickBooksOauth;
use crate::utils::logging::code_preview;
use chrono::{DateTime, Utc};
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorProcessingErr, ActorRef, MessagingErr, RpcReplyPort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Messages handled by the session actor.
#[derive(Debug)]
pub enum SessionMessage {
    GetAuthState(RpcReplyPort<AuthState>),

    /// Current session, if any. Used for bearer injection and the refresh token.
    GetSession(RpcReplyPort<Option<Session>>),

    /// Current session tagged with its epoch. A refresh starts from this snapshot.
    GetSnapshot(RpcReplyPort<Option<(u64, Session)>>),

    /// Install a freshly authorized session and arm the refresh timer.
    Install(Session, RpcReplyPort<()>),

    /// Replace the token set of the session at the given epoch and re-arm. Replies `false` when
    /// that session was cleared or replaced meanwhile.
    ReplaceTokens(u64, TokenSet, RpcReplyPort<bool>),

    /// Drop tokens and realm and cancel the pending timer.
    Clear(RpcReplyPort<()>),

    /// Like `Clear`, but only while the session at the given epoch is still current.
    ClearEpoch(u64, RpcReplyPort<bool>),

    GetScheduledRefresh(RpcReplyPort<Option<DateTime<Utc>>>),

    // Internal messages (sent by the actor itself)
    /// Pending timer fired. Stale generations are ignored.
    ScheduledRefresh { generation: u64 },
}

/// Handle for reading and updating the single QuickBooks session.
///
/// Network exchanges run on the caller's task; the actor only serializes state reads and
/// replacements.
#[derive(Clone)]
pub struct QuickBooksSessionHandle {
    actor: ActorRef<SessionMessage>,
    oauth: Arc<QuickBooksOauth>,
}

impl QuickBooksSessionHandle {
    pub async fn spawn(oauth: Arc<QuickBooksOauth>) -> Result<Self, BridgeError> {
        let (actor, _jh) = Actor::spawn(None, SessionActor, oauth.clone())
            .await
            .map_err(|e| BridgeError::RactorError(format!("SessionActor spawn failed: {e}")))?;
        Ok(Self { actor, oauth })
    }

    pub fn oauth(&self) -> &QuickBooksOauth {
        &self.oauth
    }

    /// Exchanges an authorization code and installs the resulting session.
    ///
    /// Any failure leaves the current session untouched.
    pub async fn authenticate(&self, code: &str, realm_id: &str) -> Result<TokenSet, BridgeError> {
        info!(code = %code_preview(code), realm_id, "QuickBooks authorization code received");

        let resp = self.oauth.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "QuickBooks code exchange failed");
            BridgeError::Authentication("Authentication failed".to_string())
        })?;
        let tokens = TokenSet::from_token_response(&resp, None, Utc::now()).map_err(|e| {
            warn!(error = %e, "QuickBooks code exchange returned unusable tokens");
            BridgeError::Authentication("Authentication failed".to_string())
        })?;

        let session = Session {
            realm_id: realm_id.to_string(),
            tokens: tokens.clone(),
        };
        ractor::call!(self.actor, SessionMessage::Install, session)
            .map_err(|e| BridgeError::RactorError(format!("Install RPC failed: {e}")))?;

        info!(
            realm_id,
            expires_at = %tokens.expires_at(),
            "QuickBooks session established"
        );
        Ok(tokens)
    }

    /// Exchanges the stored refresh token for a new token set.
    ///
    /// On exchange failure the session is cleared. The outcome is discarded when another
    /// session was installed or the session was cleared while the exchange ran.
    pub async fn refresh(&self) -> Result<TokenSet, BridgeError> {
        let snapshot = ractor::call!(self.actor, SessionMessage::GetSnapshot)
            .map_err(|e| BridgeError::RactorError(format!("GetSnapshot RPC failed: {e}")))?;
        let Some((epoch, current)) = snapshot else {
            return Err(BridgeError::Authentication(
                "No refresh token available".to_string(),
            ));
        };

        let exchanged = match self.oauth.refresh(current.tokens.refresh_token()).await {
            Ok(resp) => TokenSet::from_token_response(
                &resp,
                Some(current.tokens.refresh_token()),
                Utc::now(),
            ),
            Err(e) => Err(e),
        };

        let tokens = match exchanged {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, realm_id = %current.realm_id, "QuickBooks token refresh failed; clearing session");
                let cleared = ractor::call!(self.actor, SessionMessage::ClearEpoch, epoch)
                    .map_err(|e| BridgeError::RactorError(format!("ClearEpoch RPC failed: {e}")))?;
                if !cleared {
                    debug!("Session changed during the failed refresh; leaving it in place");
                }
                return Err(BridgeError::Authentication(
                    "Token refresh failed".to_string(),
                ));
            }
        };

        let replaced =
            ractor::call!(self.actor, SessionMessage::ReplaceTokens, epoch, tokens.clone())
                .map_err(|e| BridgeError::RactorError(format!("ReplaceTokens RPC failed: {e}")))?;
        if !replaced {
            debug!(realm_id = %current.realm_id, "QuickBooks refresh finished after the session changed; discarding");
            return Err(BridgeError::Authentication(
                "Session changed during token refresh".to_string(),
            ));
        }

        info!(expires_at = %tokens.expires_at(), "QuickBooks access token refreshed");
        Ok(tokens)
    }

    pub async fn auth_state(&self) -> Result<AuthState, BridgeError> {
        ractor::call!(self.actor, SessionMessage::GetAuthState)
            .map_err(|e| BridgeError::RactorError(format!("GetAuthState RPC failed: {e}")))
    }

    pub async fn is_authenticated(&self) -> Result<bool, BridgeError> {
        Ok(self.auth_state().await?.is_authenticated)
    }

    pub async fn session(&self) -> Result<Option<Session>, BridgeError> {
        ractor::call!(self.actor, SessionMessage::GetSession)
            .map_err(|e| BridgeError::RactorError(format!("GetSession RPC failed: {e}")))
    }

    pub async fn clear(&self) -> Result<(), BridgeError> {
        ractor::call!(self.actor, SessionMessage::Clear)
            .map_err(|e| BridgeError::RactorError(format!("Clear RPC failed: {e}")))
    }

    /// Fire time of the pending proactive refresh, if one is armed.
    pub async fn scheduled_refresh_at(&self) -> Result<Option<DateTime<Utc>>, BridgeError> {
        ractor::call!(self.actor, SessionMessage::GetScheduledRefresh)
            .map_err(|e| BridgeError::RactorError(format!("GetScheduledRefresh RPC failed: {e}")))
    }
}

struct PendingRefresh {
    generation: u64,
    fire_at: DateTime<Utc>,
    timer: JoinHandle<Result<(), MessagingErr<SessionMessage>>>,
}

struct SessionActorState {
    session: Option<Session>,
    /// Bumped on every install and clear.
    epoch: u64,
    pending: Option<PendingRefresh>,
    generation: u64,
    oauth: Arc<QuickBooksOauth>,
}

impl SessionActorState {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
            debug!(generation = pending.generation, "Cancelled pending QuickBooks refresh");
        }
    }

    fn clear(&mut self) {
        if let Some(session) = self.session.take() {
            info!(realm_id = %session.realm_id, "QuickBooks session cleared");
        }
        self.epoch += 1;
        self.cancel_pending();
    }

    /// At most one timer is pending; arming always replaces it.
    fn arm(&mut self, myself: &ActorRef<SessionMessage>) {
        self.cancel_pending();
        let Some(tokens) = self.session.as_ref().map(|s| &s.tokens) else {
            return;
        };

        let now = Utc::now();
        let Some(delay) = tokens.refresh_delay(now) else {
            info!(
                expires_at = %tokens.expires_at(),
                "QuickBooks token expires within the refresh lead; not scheduling a refresh"
            );
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        let fire_at = now + chrono::Duration::from_std(delay).unwrap_or_default();
        let timer = myself.send_after(delay, move || SessionMessage::ScheduledRefresh {
            generation,
        });
        info!(%fire_at, "QuickBooks token refresh scheduled");
        self.pending = Some(PendingRefresh {
            generation,
            fire_at,
            timer,
        });
    }
}

struct SessionActor;

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMessage;
    type State = SessionActorState;
    type Arguments = Arc<QuickBooksOauth>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        oauth: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        debug!("QuickBooks session actor started");
        Ok(SessionActorState {
            session: None,
            epoch: 0,
            pending: None,
            generation: 0,
            oauth,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_pending();
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMessage::GetAuthState(rp) => {
                let _ = rp.send(AuthState::of(state.session.as_ref()));
            }

            SessionMessage::GetSession(rp) => {
                let _ = rp.send(state.session.clone());
            }

            SessionMessage::GetSnapshot(rp) => {
                let _ = rp.send(state.session.clone().map(|s| (state.epoch, s)));
            }

            SessionMessage::Install(session, rp) => {
                state.epoch += 1;
                state.session = Some(session);
                state.arm(&myself);
                let _ = rp.send(());
            }

            SessionMessage::ReplaceTokens(epoch, tokens, rp) => {
                let replaced = match state.session.as_mut() {
                    Some(session) if state.epoch == epoch => {
                        session.tokens = tokens;
                        true
                    }
                    _ => false,
                };
                if replaced {
                    state.arm(&myself);
                }
                let _ = rp.send(replaced);
            }

            SessionMessage::Clear(rp) => {
                state.clear();
                let _ = rp.send(());
            }

            SessionMessage::ClearEpoch(epoch, rp) => {
                let current = state.session.is_some() && state.epoch == epoch;
                if current {
                    state.clear();
                }
                let _ = rp.send(current);
            }

            SessionMessage::GetScheduledRefresh(rp) => {
                let _ = rp.send(state.pending.as_ref().map(|p| p.fire_at));
            }

            SessionMessage::ScheduledRefresh { generation } => {
                let is_current = state
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.generation == generation);
                if !is_current {
                    debug!(generation, "Ignoring stale QuickBooks refresh timer");
                    return Ok(());
                }
                state.pending = None;

                let handle = QuickBooksSessionHandle {
                    actor: myself.clone(),
                    oauth: state.oauth.clone(),
                };
                tokio::spawn(async move {
                    info!("Running scheduled QuickBooks token refresh");
                    if let Err(e) = handle.refresh().await {
                        warn!(error = %e, "Scheduled QuickBooks token refresh failed");
                    }
                });
            }
        }
        Ok(())
    }
}
