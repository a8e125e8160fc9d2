// Bank detection. The text and file name strategies scan ordered tables
// and the first hit wins.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    BnpParibas,
    CreditAgricole,
    SocieteGenerale,
    Lcl,
    CreditMutuel,
    BanquePopulaire,
    CaisseDEpargne,
    Hsbc,
    BanquePostale,
    Ing,
    Boursorama,
    HelloBank,
    N26,
    Revolut,
    OrangeBank,
    Fortuneo,
}

impl Bank {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Bank::BnpParibas => "BNP Paribas",
            Bank::CreditAgricole => "Crédit Agricole",
            Bank::SocieteGenerale => "Société Générale",
            Bank::Lcl => "LCL",
            Bank::CreditMutuel => "Crédit Mutuel",
            Bank::BanquePopulaire => "Banque Populaire",
            Bank::CaisseDEpargne => "Caisse d'Épargne",
            Bank::Hsbc => "HSBC",
            Bank::BanquePostale => "La Banque Postale",
            Bank::Ing => "ING",
            Bank::Boursorama => "Boursorama",
            Bank::HelloBank => "Hello Bank",
            Bank::N26 => "N26",
            Bank::Revolut => "Revolut",
            Bank::OrangeBank => "Orange Bank",
            Bank::Fortuneo => "Fortuneo",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl Serialize for Bank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_name())
    }
}

/// Keyword → bank, scanned in order against lower-cased text.
const TEXT_KEYWORDS: &[(&str, Bank)] = &[
    ("bnp", Bank::BnpParibas),
    ("paribas", Bank::BnpParibas),
    ("crédit agricole", Bank::CreditAgricole),
    ("credit agricole", Bank::CreditAgricole),
    ("société générale", Bank::SocieteGenerale),
    ("societe generale", Bank::SocieteGenerale),
    ("lcl", Bank::Lcl),
    ("crédit mutuel", Bank::CreditMutuel),
    ("credit mutuel", Bank::CreditMutuel),
    ("banque populaire", Bank::BanquePopulaire),
    ("caisse d'épargne", Bank::CaisseDEpargne),
    ("caisse d'epargne", Bank::CaisseDEpargne),
    ("hsbc", Bank::Hsbc),
    ("la banque postale", Bank::BanquePostale),
    ("banque postale", Bank::BanquePostale),
    ("ing", Bank::Ing),
    ("boursorama", Bank::Boursorama),
    ("hello bank", Bank::HelloBank),
    ("n26", Bank::N26),
    ("revolut", Bank::Revolut),
    ("orange bank", Bank::OrangeBank),
    ("fortuneo", Bank::Fortuneo),
];

/// Alias groups matched against lower-cased file names, in order.
const FILENAME_PATTERNS: &[(&[&str], Bank)] = &[
    (&["revolut"], Bank::Revolut),
    (&["boursorama"], Bank::Boursorama),
    (&["n26"], Bank::N26),
    (&["hello-bank", "hellobank"], Bank::HelloBank),
    (&["orange-bank", "orangebank"], Bank::OrangeBank),
    (&["fortuneo"], Bank::Fortuneo),
    (&["ing"], Bank::Ing),
    (&["lcl"], Bank::Lcl),
    (&["hsbc"], Bank::Hsbc),
    (
        &["societe-generale", "societegenerale", "sg"],
        Bank::SocieteGenerale,
    ),
    (
        &["credit-agricole", "creditagricole", "ca"],
        Bank::CreditAgricole,
    ),
    (&["bnp-paribas", "bnpparibas", "bnp"], Bank::BnpParibas),
];

pub fn detect_bank_from_text(text: &str) -> Option<Bank> {
    let lower = text.to_lowercase();
    TEXT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, bank)| *bank)
}

pub fn detect_bank_from_filename(filename: &str) -> Option<Bank> {
    let lower = filename.to_lowercase();
    FILENAME_PATTERNS
        .iter()
        .find(|(aliases, _)| aliases.iter().any(|alias| lower.contains(alias)))
        .map(|(_, bank)| *bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bnp_any_case() {
        for text in [
            "Relevé BNP Paribas",
            "bnp paribas",
            "BNP PARIBAS SA",
            "groupe Paribas",
        ] {
            assert_eq!(detect_bank_from_text(text), Some(Bank::BnpParibas), "{text}");
        }
        assert_eq!(
            detect_bank_from_text("BNP Paribas").map(|b| b.canonical_name()),
            Some("BNP Paribas")
        );
    }

    #[test]
    fn test_unknown_text() {
        assert_eq!(detect_bank_from_text("Lorem ipsum dolor sit amet"), None);
        assert_eq!(detect_bank_from_text(""), None);
    }

    #[test]
    fn test_accent_variants_share_a_name() {
        assert_eq!(
            detect_bank_from_text("CREDIT AGRICOLE ALPES"),
            Some(Bank::CreditAgricole)
        );
        assert_eq!(
            detect_bank_from_text("Caisse d'Epargne Ile-de-France"),
            Some(Bank::CaisseDEpargne)
        );
        assert_eq!(
            detect_bank_from_text("CAISSE D'ÉPARGNE"),
            Some(Bank::CaisseDEpargne)
        );
    }

    #[test]
    fn test_table_order_decides_ties() {
        // both LCL and HSBC occur; LCL is listed first
        assert_eq!(detect_bank_from_text("HSBC transfer to LCL"), Some(Bank::Lcl));
        // "ing" sits inside "banking" and is listed before Revolut
        assert_eq!(
            detect_bank_from_text("Revolut banking app"),
            Some(Bank::Ing)
        );
    }

    #[test]
    fn test_filename_groups() {
        assert_eq!(
            detect_bank_from_filename("releve-revolut-2024-03.pdf"),
            Some(Bank::Revolut)
        );
        assert_eq!(
            detect_bank_from_filename("HelloBank_Mars.PDF"),
            Some(Bank::HelloBank)
        );
        assert_eq!(
            detect_bank_from_filename("bnp-paribas-releve.pdf"),
            Some(Bank::BnpParibas)
        );
        assert_eq!(
            detect_bank_from_filename("export_sg_2024.pdf"),
            Some(Bank::SocieteGenerale)
        );
        assert_eq!(detect_bank_from_filename("statement.pdf"), None);
    }

    #[test]
    fn test_filename_declaration_order() {
        // "ing" is declared after Fortuneo
        assert_eq!(
            detect_bank_from_filename("fortuneo-banking.pdf"),
            Some(Bank::Fortuneo)
        );
        // revolut is checked before the loose "ca" alias
        assert_eq!(
            detect_bank_from_filename("revolut_cash.pdf"),
            Some(Bank::Revolut)
        );
    }

    #[test]
    fn test_serializes_as_canonical_name() {
        assert_eq!(
            serde_json::to_value(Bank::SocieteGenerale).unwrap(),
            serde_json::json!("Société Générale")
        );
    }
}
