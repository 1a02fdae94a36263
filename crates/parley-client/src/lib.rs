//! # parley-client
//!
//! The client-side conversation state machine and its navigation
//! synchronizer.
//!
//! [`ChatController`] is the single owner of all conversational state: the
//! conversation list, the selection, the message sequence, pending/failed
//! send tracking, and the edit session. Commands are async methods; every
//! mutation happens synchronously between suspension points, and every
//! continuation re-validates its relevance (selection, load epoch,
//! cancellation) before applying a result, so stale responses from abandoned
//! navigations can never corrupt current state.
//!
//! [`NavigationSynchronizer`] reconciles externally driven route changes
//! (deep links, back/forward) with the controller, funneling user-initiated
//! selection and browser-driven navigation through one code path.

#![deny(unsafe_code)]

pub mod controller;
pub mod failed;
pub mod navigation;
pub mod state;

pub use controller::ChatController;
pub use failed::{FailedSend, FailedSends};
pub use navigation::{NavCommand, NavigationSynchronizer, Route};
pub use state::{BackendStatus, ChatState, EditSession};
