//! # Shared Bus - Event Pipeline and State Publication
//!
//! Connects the components of the projection engine.
//!
//! ```text
//! ┌──────────────┐  send()   ┌──────────────┐  recv()  ┌──────────────┐
//! │Synchronizer A│ ────────→ │   Pipeline   │ ───────→ │    Store     │
//! │Synchronizer B│ ────────→ │  (bounded)   │          │ (projector)  │
//! └──────────────┘           └──────────────┘          └──────┬───────┘
//!                                                             │ publish()
//!                                                             ↓
//!                                                      ┌──────────────┐
//!                                                      │ Subscribers  │
//!                                                      │    (UI)      │
//!                                                      └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - The pipeline has exactly one consumer; folds never interleave.
//! - Producers are suspended while the pipeline is full.
//! - Subscribers only ever read snapshots.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod pipeline;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{AdminEvent, DeadLetter, EventTopic, NormalizedEvent};
pub use pipeline::{event_pipeline, PipelineError, PipelineReceiver, PipelineSender};
pub use publisher::StatePublisher;
pub use subscriber::{StateStream, StateSubscription, SubscriptionError};

/// Events to buffer between synchronizers and the store before backpressure.
pub const DEFAULT_PIPELINE_CAPACITY: usize = 1000;

/// Dead letters retained for inspection.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 256;
