//! Human-readable settlement-leg instructions.
//!
//! Pure derivations from the channel value. Every interpolated value is
//! escaped for the Markdown dialect the host renders, including the ones
//! this module generates itself.

use rand::Rng;

use crate::domain::Channel;

const MARKDOWN_SPECIALS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Pickup points for cash deposits.
pub const CASH_PICKUP_ADDRESSES: [&str; 4] = [
    "Avenue Kasa-Vubu, Immeuble Remita, Bureau 12, Kinshasa/Gombe",
    "Boulevard du 30 Juin, Centre Commercial, Niveau 2, Kinshasa/Gombe",
    "Avenue Batetela, Agence Remita, Kinshasa/Lingwala",
    "Route de Matadi, Point de Service Remita, Kinshasa/Kalamu",
];

/// Escapes Markdown control characters in untrusted text.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIALS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Generates a receiving IBAN for a bank-wire deposit.
pub fn generate_iban() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "FR{:02}{:04}{:04}{:012}{:02}",
        rng.gen_range(10..100),
        rng.gen_range(1000..10000),
        rng.gen_range(1000..10000),
        rng.gen_range(100_000_000_000u64..1_000_000_000_000u64),
        rng.gen_range(10..100),
    )
}

/// Generates a receiving mobile-money number.
pub fn generate_mobile_money_number() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "+243 {} {} {}",
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
    )
}

/// Picks a cash pickup point.
pub fn cash_pickup_address() -> &'static str {
    let mut rng = rand::thread_rng();
    CASH_PICKUP_ADDRESSES[rng.gen_range(0..CASH_PICKUP_ADDRESSES.len())]
}

/// Deposit instructions for a transfer awaiting funds. An absent channel
/// derives nothing.
pub fn deposit_instructions(channel: Option<Channel>) -> String {
    match channel {
        Some(Channel::BankWire) => {
            let iban = escape_markdown(&generate_iban());
            format!(
                "💳 *IBAN de transfert :*\n`{iban}`\n\nEffectuez votre virement vers cet IBAN \
                 pour finaliser votre transaction (cela peut prendre jusqu'à 2 jours ouvrés)"
            )
        }
        Some(Channel::MobileMoney) => {
            let number = escape_markdown(&generate_mobile_money_number());
            format!("📱 *Bénéficiaire :*\n{number}\n\nEnvoyez les fonds à ce numéro Mobile Money.")
        }
        Some(Channel::Cash) => {
            let address = escape_markdown(cash_pickup_address());
            format!(
                "📍 *Point de dépôt :*\nVeuillez vous rendre à :\n{address}\npour déposer vos fonds."
            )
        }
        Some(Channel::Crypto) => {
            "⏳ Transfert en cours de traitement.\nVous serez notifié dès la réception des fonds."
                .to_string()
        }
        None => String::new(),
    }
}

/// Withdrawal instructions for a completed transfer, using the user's own
/// coordinates when known.
pub fn withdrawal_instructions(
    channel: Option<Channel>,
    iban: Option<&str>,
    phone: Option<&str>,
) -> String {
    match channel {
        Some(Channel::BankWire) => {
            let iban = escape_markdown(iban.unwrap_or("IBAN non disponible"));
            format!(
                "💳 *Fonds envoyés sur votre compte :*\nIBAN : `{iban}`\n\nLes fonds ont été \
                 transférés sur votre compte bancaire."
            )
        }
        Some(Channel::MobileMoney) => {
            let phone = escape_markdown(phone.unwrap_or("Numéro non disponible"));
            format!(
                "📱 *Fonds envoyés :*\nLes fonds ont été envoyés sur votre numéro Mobile Money : \
                 {phone}\n\nVérifiez votre solde dans quelques instants."
            )
        }
        Some(Channel::Cash) => {
            "✅ Notre partenaire vous remercie de votre visite.\nLes fonds ont été remis en \
             espèces selon les modalités convenues."
                .to_string()
        }
        Some(Channel::Crypto) => {
            "🔐 *Fonds déposés dans votre coffre numérique.*\nVos cryptomonnaies sont disponibles \
             dans votre portefeuille."
                .to_string()
        }
        None => String::new(),
    }
}
