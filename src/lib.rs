//! # donation-gateway
//!
//! REST backend for campaign donations reconciled against a Stripe-style
//! payment gateway.
//!
//! Donors create a payment intent for a campaign, pay the gateway directly,
//! and the service then learns the outcome either from an explicit
//! confirmation call or from a signed webhook. Both paths read the intent's
//! authoritative state from the gateway and write at most one ledger entry
//! per intent, crediting the campaign total in the same transaction.
//!
//! ## Architecture
//!
//! ```text
//! Clients / Gateway webhooks
//!     │
//!     ├── REST Handlers + bearer identity (api/)
//!     │
//!     ├── DonationService (service/)
//!     │       │
//!     │       ├── PaymentGateway: Stripe (gateway/)
//!     │       ├── WebhookVerifier (gateway/signature)
//!     │       └── DonationStore: PostgreSQL (persistence/)
//!     │
//!     └── Campaign, Donation, money rules (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod persistence;
pub mod service;

#[cfg(test)]
mod test_support;
