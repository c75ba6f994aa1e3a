//! User profile entity and onboarding-step derivation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of the external identity-verification flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    #[default]
    NotStarted,
    Submitted,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Vérification à démarrer",
            Self::Submitted => "KYC soumis, validation en cours",
            Self::Approved => "KYC approuvé",
            Self::Rejected => "KYC refusé",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile as the backend reports it. Created implicitly on first
/// contact; mutated only by authoritative fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub telegram_user_id: Option<String>,
    #[serde(default)]
    pub kyc_status: KycStatus,
    /// Self-custody wallet address, present once registered.
    #[serde(rename = "user_tw_eoa", default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Where the user currently stands in the guided journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Verification,
    WalletSetup,
    Ready,
}

impl OnboardingStep {
    pub fn label(self) -> &'static str {
        match self {
            Self::Verification => "Étape 1/2 : Identification et vérifications",
            Self::WalletSetup => "Étape 2/2 : Création du portefeuille électronique",
            Self::Ready => "Compte prêt",
        }
    }
}

impl User {
    pub fn onboarding_step(&self) -> OnboardingStep {
        if self.kyc_status != KycStatus::Approved {
            OnboardingStep::Verification
        } else if self.wallet_address.is_none() {
            OnboardingStep::WalletSetup
        } else {
            OnboardingStep::Ready
        }
    }
}

/// Step for a possibly-unknown user; no profile means verification first.
pub fn onboarding_step(user: Option<&User>) -> OnboardingStep {
    user.map(User::onboarding_step)
        .unwrap_or(OnboardingStep::Verification)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(kyc: KycStatus, wallet: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            telegram_user_id: Some("42".to_string()),
            kyc_status: kyc,
            wallet_address: wallet.map(str::to_string),
            iban: None,
            phone: None,
        }
    }

    #[test]
    fn onboarding_steps_follow_kyc_then_wallet() {
        assert_eq!(
            user(KycStatus::NotStarted, None).onboarding_step(),
            OnboardingStep::Verification
        );
        assert_eq!(
            user(KycStatus::Submitted, None).onboarding_step(),
            OnboardingStep::Verification
        );
        assert_eq!(
            user(KycStatus::Approved, None).onboarding_step(),
            OnboardingStep::WalletSetup
        );
        assert_eq!(
            user(KycStatus::Approved, Some("0xabc")).onboarding_step(),
            OnboardingStep::Ready
        );
    }

    #[test]
    fn missing_user_means_verification() {
        assert_eq!(onboarding_step(None), OnboardingStep::Verification);
    }

    #[test]
    fn wallet_address_uses_backend_field_name() {
        let raw = r#"{
            "id": "8f14e45f-ceea-467f-a8d5-91ee24eb21ec",
            "kyc_status": "APPROVED",
            "user_tw_eoa": "0x4c0FeD497BC2868E1010C8eC8bEfcfCd3013601b"
        }"#;
        let parsed: User = serde_json::from_str(raw).unwrap();
        assert!(parsed.wallet_address.is_some());
        assert_eq!(parsed.kyc_status, KycStatus::Approved);
    }

    #[test]
    fn kyc_status_defaults_to_not_started() {
        let raw = r#"{"id": "8f14e45f-ceea-467f-a8d5-91ee24eb21ec"}"#;
        let parsed: User = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.kyc_status, KycStatus::NotStarted);
    }
}
