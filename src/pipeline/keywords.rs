/// Banking vocabulary looked up in extracted text, in reporting order.
pub const BANKING_KEYWORDS: &[&str] = &[
    "bnp",
    "paribas",
    "crédit agricole",
    "société générale",
    "lcl",
    "crédit mutuel",
    "banque populaire",
    "caisse d'épargne",
    "hsbc",
    "la banque postale",
    "ing",
    "boursorama",
    "hello bank",
    "n26",
    "revolut",
    "orange bank",
    "fortuneo",
    "relevé",
    "compte",
    "solde",
    "virement",
    "prélèvement",
    "carte bancaire",
    "transaction",
    "euro",
    "€",
    "débit",
    "crédit",
    "facture",
    "montant",
    "total",
];

/// Returns the vocabulary entries found in `text`, in vocabulary order.
pub fn find_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    BANKING_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .collect()
}
