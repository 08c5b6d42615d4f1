//! Service layer: business logic orchestration.
//!
//! [`DonationService`] creates gateway intents and reconciles their terminal
//! state into the donation ledger and campaign totals.

pub mod donation_service;

pub use donation_service::{DonationIntent, DonationService, WebhookOutcome};
