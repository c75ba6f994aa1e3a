pub mod transaction;
pub mod user;

pub use transaction::{
    Channel, Currency, Direction, Transaction, TransactionDraft, TransactionStatus,
};
pub use user::{onboarding_step, KycStatus, OnboardingStep, User};
