//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`Dispatcher`]: Provider routing and SLA escalation
//! - [`Reconciler`]: Idempotent callback application
//! - [`LimitTracker`]: Rolling-window quota admission
//! - [`SlaMonitor`]: Confirmation deadline tracking
//! - [`DisputeService`]: Deal dispute lifecycle
//! - [`RoutingPolicy`]: Provider-class ordering strategies

pub mod dispatcher;
pub mod disputes;
pub mod limits;
pub mod reconciler;
pub mod registry;
pub mod routing_policy;
pub mod sla_monitor;

pub use dispatcher::{DispatchIntake, Dispatcher, DispatcherConfig};
pub use disputes::DisputeService;
pub use limits::{AdmissionDenied, LimitTracker, Reservation, Usage};
pub use reconciler::{CallbackAck, CallbackAuth, Reconciler, ReportedStatus};
pub use registry::ProviderRegistry;
pub use routing_policy::{
    AggregatorsFirstPolicy, ProviderClass, RequisitesFirstPolicy, RoutingPolicy,
};
pub use sla_monitor::{run_sweeper, SlaMonitor};
