#![forbid(unsafe_code)]

//! Mobility dashboard core (`mobdash`): metrics acquisition, metric-card
//! derivation and view selection for an urban-mobility operator.
//!
//! Three parts:
//! 1. **Acquisition**: one request per refresh, with a fixed offline
//!    snapshot substituted on any failure
//! 2. **Derivation**: four ordered, formatted metric cards with deltas
//! 3. **View selection**: a small state machine over named sections
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use mobility_dashboard::prelude::*;
//!
//! let config = Config::load(None)?;
//! let acquirer = Acquirer::from_config(&config.endpoint)?;
//! let mut session =
//!     DashboardSession::new(acquirer, config.view_state()?, config.format.formatter());
//! session.refresh();
//! for card in session.descriptors() {
//!     println!("{}: {} ({})", card.title, card.display_with_unit(), card.delta_label());
//! }
//! # Ok::<(), DashError>(())
//! ```

pub mod prelude;

pub mod acquire;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod metrics;
pub mod session;
pub mod view;
