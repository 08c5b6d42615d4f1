//! Domain layer: identifiers, campaigns, ledger entries and money.
//!
//! Everything here is pure data and rules; persistence and the payment
//! gateway live in their own modules.

pub mod campaign;
pub mod donation;
pub mod donor;
pub mod ids;
pub mod money;

pub use campaign::{Campaign, CampaignStatus, FundingPolicy};
pub use donation::{Donation, DonationStats, DonationStatus, NewDonation, Page};
pub use donor::DonorIdentity;
pub use ids::{CampaignId, DonationId, IntentId, UserId};
