//! # Callback Reconciler
//!
//! Applies provider confirmation callbacks to in-flight attempts.
//!
//! Callbacks arrive over untrusted channels and may be duplicated,
//! replayed or raced against the SLA sweeper, so the reconciler is
//! strictly idempotent: authentication comes first, unknown references
//! and replays get distinct acknowledgements instead of errors, and the
//! actual state change goes through the repository's optimistic lock so
//! exactly one writer wins.
//!
//! A settlement whose reported amount differs from the requested one
//! still settles; the discrepancy is recorded on the attempt and
//! surfaced in the acknowledgement for the operator to chase.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::limits::LimitTracker;
use crate::application::services::sla_monitor::SlaMonitor;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    AgentId, AggregatorId, Amount, ExternalRef, ProviderRef, RequestId,
};
use crate::infrastructure::persistence::traits::{
    AggregatorRepository, DispatchRequestRepository, RequisiteRepository, TransactionRepository,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Bounded retries for optimistic-lock races.
const CAS_RETRIES: usize = 3;

/// Who is presenting the callback.
#[derive(Debug, Clone)]
pub enum CallbackAuth {
    /// An aggregator partner authenticating with its API token.
    Aggregator {
        /// The partner claiming the callback.
        aggregator_id: AggregatorId,
        /// The token it presented.
        token: String,
    },
    /// A trader agent confirming on one of their own requisites.
    Agent(AgentId),
}

/// Status a provider reports for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedStatus {
    /// Still processing; acknowledged without effect.
    Pending,
    /// Funds received.
    Ready,
    /// Collection failed on the provider side.
    Failed,
}

/// Error when parsing a reported status from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reported status: {0}")]
pub struct ParseReportedStatusError(pub String);

impl std::str::FromStr for ReportedStatus {
    type Err = ParseReportedStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "READY" => Ok(Self::Ready),
            "FAILED" => Ok(Self::Failed),
            other => Err(ParseReportedStatusError(other.to_string())),
        }
    }
}

/// Acknowledgement returned to the callback sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAck {
    /// The callback was applied.
    Applied {
        /// True if the settled amount differed from the requested one.
        discrepancy: bool,
    },
    /// The transaction already reached a terminal status; no effect.
    AlreadyApplied,
    /// No transaction carries the presented reference.
    UnknownTransaction,
    /// Authentication failed or the sender does not own the transaction.
    Unauthorized,
}

/// Applies provider callbacks idempotently.
#[derive(Debug)]
pub struct Reconciler {
    transactions: Arc<dyn TransactionRepository>,
    requests: Arc<dyn DispatchRequestRepository>,
    requisites: Arc<dyn RequisiteRepository>,
    aggregators: Arc<dyn AggregatorRepository>,
    limits: Arc<LimitTracker>,
    sla: Arc<SlaMonitor>,
}

impl Reconciler {
    /// Creates a reconciler over the given collaborators.
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        requests: Arc<dyn DispatchRequestRepository>,
        requisites: Arc<dyn RequisiteRepository>,
        aggregators: Arc<dyn AggregatorRepository>,
        limits: Arc<LimitTracker>,
        sla: Arc<SlaMonitor>,
    ) -> Self {
        Self {
            transactions,
            requests,
            requisites,
            aggregators,
            limits,
            sla,
        }
    }

    /// Applies a provider callback to the transaction carrying
    /// `external_ref`.
    ///
    /// Authentication and entitlement are checked before anything else;
    /// an unauthenticated caller learns nothing about whether the
    /// reference exists.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::InvalidRequest` if a reported settled amount
    ///   is not positive.
    /// - Repository errors and persistent lock contention.
    pub async fn apply_callback(
        &self,
        auth: &CallbackAuth,
        external_ref: &ExternalRef,
        reported: ReportedStatus,
        settled_amount: Option<Decimal>,
    ) -> ApplicationResult<CallbackAck> {
        if let CallbackAuth::Aggregator {
            aggregator_id,
            token,
        } = auth
        {
            let authenticated = match self.aggregators.get(aggregator_id).await? {
                Some(aggregator) => aggregator.token_matches(token),
                None => false,
            };
            if !authenticated {
                tracing::warn!(aggregator_id = %aggregator_id, "callback token rejected");
                return Ok(CallbackAck::Unauthorized);
            }
        }

        let Some(transaction) = self.transactions.get_by_external_ref(external_ref).await? else {
            return Ok(CallbackAck::UnknownTransaction);
        };

        if !self.is_entitled(auth, transaction.provider()).await? {
            tracing::warn!(
                transaction_id = %transaction.id(),
                "callback sender does not own the transaction"
            );
            return Ok(CallbackAck::Unauthorized);
        }

        if reported == ReportedStatus::Pending {
            return Ok(if transaction.status().is_terminal() {
                CallbackAck::AlreadyApplied
            } else {
                CallbackAck::Applied { discrepancy: false }
            });
        }

        let now = Timestamp::now();
        let mut current = transaction;
        for _ in 0..CAS_RETRIES {
            if current.status().is_terminal() {
                return Ok(CallbackAck::AlreadyApplied);
            }

            let mut next = current.clone();
            match reported {
                ReportedStatus::Ready => {
                    let settled = match settled_amount {
                        Some(value) => Amount::new(value)
                            .map_err(|e| ApplicationError::invalid_request(e.to_string()))?,
                        None => next.amount(),
                    };
                    next.mark_ready(settled, now)?;
                }
                ReportedStatus::Failed => {
                    next.mark_failed("provider reported failure", now)?;
                }
                ReportedStatus::Pending => unreachable!("handled above"),
            }
            next.bump_version();

            match self.transactions.update(&next).await {
                Ok(()) => {
                    self.sla.cancel(next.id());
                    if let Some(reservation_id) = next.reservation_id() {
                        self.limits.release(reservation_id);
                    }
                    self.finish_request(next.request_id(), reported, now).await?;
                    tracing::info!(
                        transaction_id = %next.id(),
                        request_id = %next.request_id(),
                        status = %next.status(),
                        discrepancy = next.amount_discrepancy(),
                        "callback applied"
                    );
                    return Ok(CallbackAck::Applied {
                        discrepancy: next.amount_discrepancy(),
                    });
                }
                Err(error) if error.is_version_conflict() => {
                    let Some(fresh) = self.transactions.get(next.id()).await? else {
                        return Ok(CallbackAck::UnknownTransaction);
                    };
                    current = fresh;
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(ApplicationError::internal(
            "persistent contention on transaction update",
        ))
    }

    async fn is_entitled(
        &self,
        auth: &CallbackAuth,
        provider: Option<&ProviderRef>,
    ) -> ApplicationResult<bool> {
        match (auth, provider) {
            (CallbackAuth::Aggregator { aggregator_id, .. }, Some(ProviderRef::Aggregator(assigned))) => {
                Ok(aggregator_id == assigned)
            }
            (CallbackAuth::Agent(agent_id), Some(ProviderRef::Requisite(requisite_id))) => {
                let Some(requisite) = self.requisites.get(requisite_id).await? else {
                    return Ok(false);
                };
                Ok(requisite.agent_id() == agent_id)
            }
            _ => Ok(false),
        }
    }

    async fn finish_request(
        &self,
        request_id: &RequestId,
        reported: ReportedStatus,
        now: Timestamp,
    ) -> ApplicationResult<()> {
        for _ in 0..CAS_RETRIES {
            let Some(mut request) = self.requests.get(request_id).await? else {
                return Err(ApplicationError::not_found(
                    "DispatchRequest",
                    request_id.to_string(),
                ));
            };
            if request.outcome().is_terminal() {
                return Ok(());
            }
            match reported {
                ReportedStatus::Ready => request.settle(now)?,
                ReportedStatus::Failed => request.fail("provider reported failure", now)?,
                ReportedStatus::Pending => return Ok(()),
            }
            request.bump_version();
            match self.requests.update(&request).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_version_conflict() => continue,
                Err(error) => return Err(error.into()),
            }
        }
        Err(ApplicationError::internal(
            "persistent contention on dispatch request update",
        ))
    }
}
