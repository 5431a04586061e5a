//! Background pool sweeper.
//!
//! Numbers can receive their OTP outside any tracked session: after a
//! restart wipes the in-memory registry, or when a number was handed
//! out but never actively watched. The sweeper periodically scans the
//! whole pool, skips anything a live poller owns, and retires numbers
//! whose OTP has already landed.

use crate::alert::AuthAlert;
use crate::extract::{ExtractedOtp, OtpExtractor};
use crate::notify::Notifier;
use crate::poller::direct_otp_text;
use crate::registry::SessionRegistry;
use crate::source::{SmsSource, SourceError};
use crate::SweepConfig;
use number_pool::NumberPool;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Result of one full pool scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Numbers queried against the source.
    pub checked: usize,
    /// Numbers left to their live poller.
    pub skipped: usize,
    /// Numbers retired this cycle.
    pub retired: usize,
}

pub struct Sweeper {
    pool: Arc<dyn NumberPool>,
    source: Arc<dyn SmsSource>,
    notifier: Arc<dyn Notifier>,
    extractor: Arc<OtpExtractor>,
    registry: SessionRegistry,
    alert: Arc<AuthAlert>,
    config: SweepConfig,
    admins: Vec<i64>,
}

impl Sweeper {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pool: Arc<dyn NumberPool>,
        source: Arc<dyn SmsSource>,
        notifier: Arc<dyn Notifier>,
        extractor: Arc<OtpExtractor>,
        registry: SessionRegistry,
        alert: Arc<AuthAlert>,
        config: SweepConfig,
        admins: Vec<i64>,
    ) -> Self {
        Self {
            pool,
            source,
            notifier,
            extractor,
            registry,
            alert,
            config,
            admins,
        }
    }

    /// Run a single scan over the whole pool.
    pub async fn sweep_once(&self) -> SweepStats {
        let mut stats = SweepStats::default();
        let numbers = self.pool.list().await;

        for number in numbers {
            // A live poller owns this number's lifecycle; retirement
            // is idempotent anyway, but skipping avoids duplicate
            // notifications.
            if self.registry.has_active_session(&number.value).await {
                stats.skipped += 1;
                continue;
            }
            stats.checked += 1;

            let sms = match self.source.fetch_latest(&number.value).await {
                Ok(Some(sms)) => sms,
                Ok(None) => {
                    sleep(self.config.check_delay).await;
                    continue;
                }
                Err(SourceError::SessionExpired) => {
                    // Every remaining fetch would fail the same way.
                    self.alert.escalate(self.notifier.as_ref()).await;
                    break;
                }
                Err(SourceError::Unavailable(err)) => {
                    warn!("Sweep check failed for {}: {}", number.value, err);
                    sleep(self.config.check_delay).await;
                    continue;
                }
            };

            if let Some(code) = self.extractor.extract(&sms.text) {
                if self.pool.retire(&number.value).await {
                    stats.retired += 1;
                    info!(
                        "Sweeper retired {} after detecting OTP {}",
                        number.value, code
                    );

                    let otp = ExtractedOtp {
                        code,
                        sender: sms.sender,
                        message: sms.text,
                    };
                    let text = direct_otp_text(&number.value, &otp);
                    for admin in &self.admins {
                        if let Err(e) = self.notifier.send_direct(*admin, &text).await {
                            warn!("Failed to notify operator {}: {}", admin, e);
                        }
                    }
                } else {
                    debug!("Sweeper retire of {} was a no-op", number.value);
                }
            }

            sleep(self.config.check_delay).await;
        }

        stats
    }

    /// Run the sweeper as a long-lived background loop.
    pub async fn run(&self) {
        info!(
            "Sweeper started, interval {:?}, per-number delay {:?}",
            self.config.interval, self.config.check_delay
        );

        loop {
            sleep(self.config.interval).await;

            let stats = self.sweep_once().await;
            if stats.retired > 0 {
                info!(
                    "Sweep cycle done: {} retired, {} checked, {} skipped",
                    stats.retired, stats.checked, stats.skipped
                );
            } else {
                debug!(
                    "Sweep cycle done: nothing retired ({} checked, {} skipped)",
                    stats.checked, stats.skipped
                );
            }
        }
    }

    /// Spawn the sweeper as a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
