use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Id;

static LAST4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid last4 regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardNetwork {
    #[serde(rename = "Visa")]
    Visa,
    #[serde(rename = "Visa Débito")]
    VisaDebit,
    #[serde(rename = "Mastercard")]
    Mastercard,
    #[serde(rename = "Mastercard Débito")]
    MastercardDebit,
    #[serde(rename = "American Express")]
    AmericanExpress,
    #[serde(rename = "Mercadolibre")]
    Mercadolibre,
}

impl CardNetwork {
    pub const ALL: [CardNetwork; 6] = [
        CardNetwork::Visa,
        CardNetwork::VisaDebit,
        CardNetwork::Mastercard,
        CardNetwork::MastercardDebit,
        CardNetwork::AmericanExpress,
        CardNetwork::Mercadolibre,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CardNetwork::Visa => "Visa",
            CardNetwork::VisaDebit => "Visa Débito",
            CardNetwork::Mastercard => "Mastercard",
            CardNetwork::MastercardDebit => "Mastercard Débito",
            CardNetwork::AmericanExpress => "American Express",
            CardNetwork::Mercadolibre => "Mercadolibre",
        }
    }

    /// Background asset used when a card is saved without one. Debit
    /// variants share the artwork of their credit counterpart.
    pub fn default_background(&self) -> &'static str {
        match self {
            CardNetwork::Visa | CardNetwork::VisaDebit => "cards/visa.png",
            CardNetwork::Mastercard | CardNetwork::MastercardDebit => "cards/mastercard.png",
            CardNetwork::AmericanExpress | CardNetwork::Mercadolibre => "cards/amex.png",
        }
    }
}

impl fmt::Display for CardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CardNetwork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "amex" {
            return Ok(CardNetwork::AmericanExpress);
        }
        CardNetwork::ALL
            .into_iter()
            .find(|n| n.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = CardNetwork::ALL.iter().map(|n| n.label()).collect();
                anyhow::anyhow!("Invalid card network: {s}. Use one of: {}", labels.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub last4: String,
    pub network: CardNetwork,
    pub bg_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCreditCard {
    pub name: String,
    pub last4: String,
    pub network: CardNetwork,
    pub bg_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditCardPatch {
    pub name: Option<String>,
    pub last4: Option<String>,
    pub network: Option<CardNetwork>,
    pub bg_image: Option<String>,
}

impl CreditCard {
    pub fn new(id: Id, user_id: Id, draft: &NewCreditCard) -> Self {
        Self {
            id,
            user_id,
            name: draft.name.clone(),
            last4: draft.last4.clone(),
            network: draft.network,
            bg_image: draft
                .bg_image
                .clone()
                .unwrap_or_else(|| draft.network.default_background().to_string()),
        }
    }

    pub fn apply_patch(&mut self, patch: &CreditCardPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(last4) = &patch.last4 {
            self.last4 = last4.clone();
        }
        if let Some(network) = patch.network {
            self.network = network;
            if patch.bg_image.is_none() {
                self.bg_image = network.default_background().to_string();
            }
        }
        if let Some(bg_image) = &patch.bg_image {
            self.bg_image = bg_image.clone();
        }
    }
}

pub fn is_valid_last4(value: &str) -> bool {
    LAST4.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last4_must_be_exactly_four_digits() {
        assert!(is_valid_last4("1234"));
        assert!(is_valid_last4("0000"));
        assert!(!is_valid_last4("123"));
        assert!(!is_valid_last4("12345"));
        assert!(!is_valid_last4("12a4"));
        assert!(!is_valid_last4("١٢٣٤"));
    }

    #[test]
    fn network_parses_labels_and_amex_alias() {
        assert_eq!(
            "visa débito".parse::<CardNetwork>().unwrap(),
            CardNetwork::VisaDebit
        );
        assert_eq!("Amex".parse::<CardNetwork>().unwrap(), CardNetwork::AmericanExpress);
        assert!("Diners".parse::<CardNetwork>().is_err());
    }

    #[test]
    fn network_serializes_with_display_labels() {
        let json = serde_json::to_string(&CardNetwork::MastercardDebit).unwrap();
        assert_eq!(json, "\"Mastercard Débito\"");
    }

    #[test]
    fn changing_network_resets_default_background() {
        let mut card = CreditCard::new(
            Id::from_string("card-1"),
            Id::from_string("user-1"),
            &NewCreditCard {
                name: "Banco Principal".to_string(),
                last4: "1234".to_string(),
                network: CardNetwork::Visa,
                bg_image: None,
            },
        );
        assert_eq!(card.bg_image, "cards/visa.png");
        card.apply_patch(&CreditCardPatch {
            network: Some(CardNetwork::Mastercard),
            ..Default::default()
        });
        assert_eq!(card.bg_image, "cards/mastercard.png");
    }
}
