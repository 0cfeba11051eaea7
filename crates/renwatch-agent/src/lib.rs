// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Renwatch evaluation and delivery pipeline.
//!
//! - [`Producer`] walks the subscription roster each cycle and turns newly
//!   seen matches into [`DeliveryJob`](renwatch_core::DeliveryJob)s
//! - [`Deliverer`] workers drain the bounded queue, sending each
//!   notification and recording it in the ledger atomically
//! - [`CommandService`] backs the subscribe, unsubscribe, and list commands
//! - [`Lifecycle`] owns the background tasks and bounds shutdown

pub mod commands;
pub mod delivery;
pub mod lifecycle;
pub mod producer;
pub mod shutdown;

pub use commands::{CommandReply, CommandService};
pub use delivery::{Deliverer, InFlight, JobReceiver, queue};
pub use lifecycle::{Lifecycle, ShutdownReport};
pub use producer::{CycleReport, Producer};
pub use shutdown::install_signal_handler;
