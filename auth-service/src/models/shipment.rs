use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Counterpart bank details attached to a shipment. Sensitive: only ever
/// returned masked unless the caller goes through the audited unmask path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BankDetails {
    pub bank_account: String,
    pub bank_ifsc: String,
}

impl BankDetails {
    /// Masked rendering: keep the last four characters of the account and
    /// the IFSC bank prefix.
    pub fn masked(&self) -> BankDetails {
        BankDetails {
            bank_account: mask_tail(&self.bank_account, 4),
            bank_ifsc: mask_tail(&self.bank_ifsc, 3),
        }
    }
}

fn mask_tail(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= keep {
        return "*".repeat(chars.len());
    }
    let masked: String = "*".repeat(chars.len() - keep);
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}{}", masked, tail)
}

/// The narrow slice of a shipment this core reads for the unmask flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentBankRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub buyer_bank: BankDetails,
}
