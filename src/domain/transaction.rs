//! Transaction domain entity and its lifecycle state machine.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a transfer. `Created` is initial; `Completed`,
/// `Cancelled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Created,
    Processing,
    Deposited,
    Transferred,
    Completed,
    Cancelled,
    Failed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 7] = [
        TransactionStatus::Created,
        TransactionStatus::Processing,
        TransactionStatus::Deposited,
        TransactionStatus::Transferred,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
        TransactionStatus::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Transition table. `Failed` is reachable from every non-terminal
    /// state; terminal states admit nothing.
    pub fn can_transition_to(self, target: TransactionStatus) -> bool {
        use TransactionStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (Created, Processing)
                | (Created, Cancelled)
                | (Processing, Deposited)
                | (Deposited, Transferred)
                | (Transferred, Completed)
                | (_, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Processing => "PROCESSING",
            Self::Deposited => "DEPOSITED",
            Self::Transferred => "TRANSFERRED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "En attente de validation",
            Self::Processing => "En attente de dépôt",
            Self::Deposited => "Dépôt effectué",
            Self::Transferred => "Transfert effectué",
            Self::Completed => "Terminé",
            Self::Cancelled => "Annulé",
            Self::Failed => "Échec",
        }
    }

    /// Style hint for badge rendering.
    pub fn badge_class(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Deposited => "deposited",
            Self::Transferred => "transferred",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "PROCESSING" => Ok(Self::Processing),
            "DEPOSITED" => Ok(Self::Deposited),
            "TRANSFERRED" => Ok(Self::Transferred),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Direction of a transfer between the fiat domain and the chain domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    FiatToChain,
    ChainToFiat,
}

impl Direction {
    /// Channels legal on the deposit leg. Cash can only enter on the
    /// chain-to-fiat leg.
    pub fn deposit_channels(self) -> &'static [Channel] {
        match self {
            Self::FiatToChain => &[Channel::BankWire, Channel::MobileMoney, Channel::Crypto],
            Self::ChainToFiat => &[
                Channel::Cash,
                Channel::BankWire,
                Channel::MobileMoney,
                Channel::Crypto,
            ],
        }
    }

    /// Channels legal on the receive leg; the cash rule mirrors the
    /// deposit leg.
    pub fn receive_channels(self) -> &'static [Channel] {
        match self {
            Self::FiatToChain => &[
                Channel::Cash,
                Channel::BankWire,
                Channel::MobileMoney,
                Channel::Crypto,
            ],
            Self::ChainToFiat => &[Channel::BankWire, Channel::MobileMoney, Channel::Crypto],
        }
    }

    pub fn allows_deposit(self, channel: Channel) -> bool {
        self.deposit_channels().contains(&channel)
    }

    pub fn allows_receive(self, channel: Channel) -> bool {
        self.receive_channels().contains(&channel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FiatToChain => "FIAT_TO_CHAIN",
            Self::ChainToFiat => "CHAIN_TO_FIAT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIAT_TO_CHAIN" => Ok(Self::FiatToChain),
            "CHAIN_TO_FIAT" => Ok(Self::ChainToFiat),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Settlement channel bound to one leg of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    BankWire,
    MobileMoney,
    Cash,
    Crypto,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankWire => "BANK_WIRE",
            Self::MobileMoney => "MOBILE_MONEY",
            Self::Cash => "CASH",
            Self::Crypto => "CRYPTO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BankWire => "Virement bancaire (IBAN)",
            Self::MobileMoney => "Mobile Money",
            Self::Cash => "Espèces",
            Self::Crypto => "Stablecoin",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BANK_WIRE" => Ok(Self::BankWire),
            "MOBILE_MONEY" => Ok(Self::MobileMoney),
            "CASH" => Ok(Self::Cash),
            "CRYPTO" => Ok(Self::Crypto),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Euro,
    Usd,
    Cdf,
    Usdc,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Euro => "euro",
            Self::Usd => "usd",
            Self::Cdf => "cdf",
            Self::Usdc => "usdc",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Euro => "€",
            Self::Usd => "$",
            Self::Cdf => "FC",
            Self::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euro" | "eur" => Ok(Self::Euro),
            "usd" => Ok(Self::Usd),
            "cdf" => Ok(Self::Cdf),
            "usdc" => Ok(Self::Usdc),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

/// A funds transfer as the backend reports it. Settlement metadata (iban,
/// phone) is present only once known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    #[serde(default)]
    pub reference: Option<String>,
    pub amount: BigDecimal,
    pub currency: Currency,
    pub direction: Direction,
    pub status: TransactionStatus,
    #[serde(default)]
    pub funds_in: Option<Channel>,
    #[serde(default)]
    pub funds_out: Option<Channel>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

/// Client-side draft of a new transfer, validated before submission.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub direction: Direction,
    pub amount: BigDecimal,
    pub currency: Currency,
    pub funds_in: Channel,
    pub funds_out: Channel,
    pub escrow: bool,
}
