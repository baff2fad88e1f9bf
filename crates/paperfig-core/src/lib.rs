//! # paperfig-core
//!
//! Core workflow logic for the paperfig diagram studio.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       View Router                             │
//! │   Landing ──auth──▶ Paywall ──checkout──▶ Workspace           │
//! │      ▲                 │  ▲                   │               │
//! │      └────logout───────┴──┴───expiry──────────┘               │
//! └──────────────────────────────────────────────────────────────┘
//!        reads                     mutates
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────────┐
//! │   Session    │   │ Auth Adapter │   │  SubscriptionLookup  │
//! │   Store      │◀──│ (email only) │──▶│  (billing, trait)    │
//! └──────────────┘   └──────────────┘   └─────────────────────┘
//! ```
//!
//! The `DiagramPipeline` and `SubscriptionLookup` traits are the seams to
//! the two external collaborators: the diagram-generation pipeline and the
//! payments provider. Implementations live in `paperfig-pipeline` and
//! `paperfig-payments`.

pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod generation;
pub mod plan;
pub mod session;
pub mod view;

pub use billing::{SubscriptionCheck, SubscriptionLookup};
pub use config::AppConfig;
pub use error::{CoreError, Result};
pub use generation::{DiagramPipeline, DiagramType, GenerationRequest, GenerationResult};
pub use plan::PlanId;
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use view::{Action, ViewState};
