//! Pipeline stages for one storage-change invocation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the orchestration in [`crate::handler`] reads as a straight line.
//!
//! ## Data Flow
//!
//! ```text
//! event ──▶ job ──▶ locate ──▶ normalize ──▶ dispatch
//! (decode)  (submit  (fetch input  (prune      (assemble,
//!            + wait)  + result)     result)     POST once)
//! ```
//!
//! 1. [`event`]    : decode the notification and derive name, prefix, document id
//! 2. [`job`]      : build the extraction request, await a terminal state
//! 3. [`locate`]   : compute the result key; fetch the input and the result
//! 4. [`normalize`]: pure pruning of the result tree
//! 5. [`dispatch`] : build the outbound payload and deliver it

pub mod dispatch;
pub mod event;
pub mod job;
pub mod locate;
pub mod normalize;
