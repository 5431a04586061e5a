//! Per-session OTP poller.
//!
//! State machine: Created -> Polling -> {Found, TimedOut, Cancelled}.
//! All three end states are terminal; the poller removes its session
//! from the registry on the way out, so a finished session is never
//! observable through either index.

use crate::alert::AuthAlert;
use crate::extract::{ExtractedOtp, OtpExtractor};
use crate::notify::Notifier;
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::source::{SmsSource, SourceError};
use number_pool::NumberPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Everything a poller task needs besides its session.
#[derive(Clone)]
pub(crate) struct PollerCtx {
    pub source: Arc<dyn SmsSource>,
    pub notifier: Arc<dyn Notifier>,
    pub pool: Arc<dyn NumberPool>,
    pub extractor: Arc<OtpExtractor>,
    pub registry: SessionRegistry,
    pub alert: Arc<AuthAlert>,
    pub poll_interval: Duration,
    pub session_timeout: Duration,
}

#[derive(Debug, PartialEq, Eq)]
enum TickOutcome {
    Found,
    Continue,
}

/// Drive one session to a terminal state.
pub(crate) async fn run(ctx: PollerCtx, session: Arc<Session>) {
    debug!(
        "Poller started for session {} (number {}, owner {})",
        session.id, session.number.value, session.owner
    );

    // Eager first check: the OTP may already be waiting when the
    // number is handed out, so don't burn a full interval on it.
    if tick(&ctx, &session).await == TickOutcome::Found {
        return;
    }

    loop {
        sleep(ctx.poll_interval).await;

        if session.is_stopped() {
            // Whoever cancelled does the messaging.
            debug!("Session {} cancelled", session.id);
            return;
        }

        if session.elapsed() >= ctx.session_timeout {
            finish_timed_out(&ctx, &session).await;
            return;
        }

        if tick(&ctx, &session).await == TickOutcome::Found {
            return;
        }
    }
}

/// One bounded-latency check against the source. Any failure is "no
/// OTP this tick"; it never terminates the session early.
async fn tick(ctx: &PollerCtx, session: &Arc<Session>) -> TickOutcome {
    let sms = match ctx.source.fetch_latest(&session.number.value).await {
        Ok(Some(sms)) => sms,
        Ok(None) => return TickOutcome::Continue,
        Err(SourceError::SessionExpired) => {
            ctx.alert.escalate(ctx.notifier.as_ref()).await;
            return TickOutcome::Continue;
        }
        Err(SourceError::Unavailable(err)) => {
            warn!(
                "SMS check failed for {}, treating as no OTP: {}",
                session.number.value, err
            );
            return TickOutcome::Continue;
        }
    };

    let Some(code) = ctx.extractor.extract(&sms.text) else {
        return TickOutcome::Continue;
    };

    if !session.observe(&code).await {
        debug!(
            "OTP {} for {} already seen, ignoring",
            code, session.number.value
        );
        return TickOutcome::Continue;
    }

    let otp = ExtractedOtp {
        code,
        sender: sms.sender,
        message: sms.text,
    };
    finish_found(ctx, session, otp).await;
    TickOutcome::Found
}

async fn finish_found(ctx: &PollerCtx, session: &Arc<Session>, otp: ExtractedOtp) {
    info!(
        "OTP {} detected for {} (session {})",
        otp.code, session.number.value, session.id
    );

    let update = lease_update_text(&session.number.value, &otp);
    if let Err(e) = ctx.notifier.update_lease(&session.target, &update).await {
        warn!("Failed to update lease message for {}: {}", session.number.value, e);
    }

    if !ctx.pool.retire(&session.number.value).await {
        info!("Number {} was already retired", session.number.value);
    }

    let direct = direct_otp_text(&session.number.value, &otp);
    if let Err(e) = ctx.notifier.send_direct(session.owner, &direct).await {
        warn!("Failed to notify owner {}: {}", session.owner, e);
    }

    ctx.registry.remove(&session.id).await;
}

async fn finish_timed_out(ctx: &PollerCtx, session: &Arc<Session>) {
    info!(
        "Session {} timed out after {:?}, releasing {}",
        session.id, session.elapsed(), session.number.value
    );

    // Timeout never retires: the number goes back to the pool.
    ctx.pool.release(&session.number.value).await;

    let text = format!(
        "Watch ended for {} with no code inside the window.\nThe number is back in the pool; request a new one anytime.",
        session.number.value
    );
    if let Err(e) = ctx.notifier.send_direct(session.owner, &text).await {
        warn!("Failed to send timeout notice to {}: {}", session.owner, e);
    }

    ctx.registry.remove(&session.id).await;
}

pub(crate) fn lease_update_text(number: &str, otp: &ExtractedOtp) -> String {
    format!(
        "Number: {}\nCode received from {}: {}",
        number, otp.sender, otp.code
    )
}

pub(crate) fn direct_otp_text(number: &str, otp: &ExtractedOtp) -> String {
    format!("Number: {}\n{} : {}", number, otp.sender, otp.code)
}
