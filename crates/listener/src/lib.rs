//! SG Status Relay webhook receiver.
//!
//! Binds an HTTP server that receives ShotGrid webhook deliveries, validates
//! the HMAC-SHA1 signature of every request, parses the JSON body, and hands
//! the event to a [`handlers::Propagator`].
//!
//! ## Endpoints
//!
//! | Method | Path | Route |
//! |--------|------|-------|
//! | POST | `/task_webhook` | task status changed |
//! | POST | `/version_webhook` | version status changed |
//! | POST | `/version_created_webhook` | version created |
//! | any | any other path | last path segment (`task`, `version`, `status`, `version_created`, `version-created`) |
//! | GET | `/health` | liveness probe |
//!
//! ## Status codes
//!
//! Bad signature → 401, malformed JSON → 400, unknown route → 404. Everything
//! the handlers report, including missing entities, is a 200 with a JSON body.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and request authentication live here.
//! The [`handlers`] crate never sees HTTP types.

pub mod server;
pub mod signature;

pub use server::{create_router, route_key_from_path, serve, ListenerError, ListenerState, WebhookResponse};
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};
