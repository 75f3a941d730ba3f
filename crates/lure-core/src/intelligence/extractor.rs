//! Pattern-based extraction.
//!
//! Matchers run in a fixed order over a working copy of the text. Each match
//! is blanked out of the working copy so that later, looser matchers (bank
//! numbers, keyword scans) never re-read part of an identifier already taken.

use super::category::IntelCategory;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// A raw match before it is stored.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedItem {
    pub category: IntelCategory,
    pub raw: String,
}

impl ExtractedItem {
    pub fn new(category: IntelCategory, raw: impl Into<String>) -> Self {
        Self {
            category,
            raw: raw.into(),
        }
    }

    /// Deduplication key within a session.
    pub fn key(&self) -> String {
        normalize(self.category, &self.raw)
    }
}

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

static SHORTENED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bit\.ly|tinyurl\.com|goo\.gl|ow\.ly|t\.co|buff\.ly|cutt\.ly|rb\.gy)/[\w-]+")
        .unwrap()
});

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static UPI_HANDLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b[\w.-]+@(?:ybl|paytm|okaxis|okicici|okhdfcbank|oksbi|upi|ibl|axl|freecharge|apl|waicici|waaxis|wahdfcbank|axisbank|sbi|icici|hdfc|kotak|indus)\b",
    )
    .unwrap()
});

static ETH_WALLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0x[a-fA-F0-9]{40}\b").unwrap());

static BTC_WALLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[13][a-km-zA-HJ-NP-Z1-9]{25,34}\b").unwrap());

static PHONE_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+91[\s-]?|\b(?:91[\s-]?)?)[6-9]\d{9}\b").unwrap());

static PHONE_INTL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+\d{1,3}[\s-]?\d{6,12}\b").unwrap());

static IFSC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{4}0[A-Z0-9]{6}\b").unwrap());

static BANK_ACCOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());

static PHONE_SHAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:91)?[6-9]\d{9}$").unwrap());

static REMOTE_ACCESS_APP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:any\s?desk|team\s?viewer|quick\s?support|aeroadmin|screen\s?share|remote desktop|ammyy admin|rust\s?desk)\b",
    )
    .unwrap()
});

static ORGANIZATION_CLAIM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:state bank of india|sbi|hdfc|icici|axis|kotak|pnb|punjab national bank|bank of baroda|canara|union bank|reserve bank(?: of india)?|rbi|income tax department|cyber cell|cbi|customs department|trai|npci)\b",
    )
    .unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ')', '(', '!', '?', ';', ':', '\'', '"', ']'];

struct Scanner {
    working: String,
    found: Vec<ExtractedItem>,
    seen: HashSet<(IntelCategory, String)>,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            working: text.to_string(),
            found: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Matches not yet blanked out, in order of appearance.
    fn matches(&self, pattern: &Regex) -> Vec<(Range<usize>, String)> {
        pattern
            .find_iter(&self.working)
            .map(|m| (m.range(), m.as_str().to_string()))
            .collect()
    }

    fn blank(&mut self, range: Range<usize>) {
        let spaces = " ".repeat(range.len());
        self.working.replace_range(range, &spaces);
    }

    fn take(&mut self, category: IntelCategory, range: Range<usize>, raw: &str) {
        self.blank(range);
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        let item = ExtractedItem::new(category, raw);
        if self.seen.insert((category, item.key())) {
            self.found.push(item);
        }
    }

    fn scan(&mut self, category: IntelCategory, pattern: &Regex) {
        for (range, raw) in self.matches(pattern) {
            self.take(category, range, &raw);
        }
    }
}

/// Extracts every recognizable identifier from `text`.
///
/// The result holds each `(category, normalized value)` pair at most once, in
/// order of first appearance within its matcher.
pub fn extract(text: &str) -> Vec<ExtractedItem> {
    let mut scanner = Scanner::new(text);

    for (range, raw) in scanner.matches(&URL) {
        let trimmed = raw.trim_end_matches(TRAILING_PUNCTUATION).to_string();
        scanner.take(IntelCategory::Url, range, &trimmed);
    }
    for (range, raw) in scanner.matches(&SHORTENED_URL) {
        scanner.take(IntelCategory::Url, range, &format!("https://{raw}"));
    }

    scanner.scan(IntelCategory::ContactIdentifier, &EMAIL);

    for (range, raw) in scanner.matches(&UPI_HANDLE) {
        // `name@paytm.com` is an email domain, not a handle
        let rest = &scanner.working[range.end..];
        let mut chars = rest.chars();
        if chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        scanner.take(IntelCategory::PaymentIdentifier, range, &raw);
    }

    scanner.scan(IntelCategory::CryptoWallet, &ETH_WALLET);
    for (range, raw) in scanner.matches(&BTC_WALLET) {
        if raw.chars().any(|c| c.is_ascii_alphabetic()) {
            scanner.take(IntelCategory::CryptoWallet, range, &raw);
        }
    }

    scanner.scan(IntelCategory::ContactIdentifier, &PHONE_IN);
    scanner.scan(IntelCategory::ContactIdentifier, &PHONE_INTL);

    scanner.scan(IntelCategory::BankIdentifier, &IFSC);
    for (range, raw) in scanner.matches(&BANK_ACCOUNT) {
        if PHONE_SHAPED.is_match(&raw) {
            continue;
        }
        scanner.take(IntelCategory::BankIdentifier, range, &raw);
    }

    scanner.scan(IntelCategory::RemoteAccessApp, &REMOTE_ACCESS_APP);
    scanner.scan(IntelCategory::OrganizationClaim, &ORGANIZATION_CLAIM);

    tracing::debug!(items = scanner.found.len(), "Extracted intelligence");
    scanner.found
}

/// Canonical form of a raw value, used as the deduplication key.
pub fn normalize(category: IntelCategory, raw: &str) -> String {
    let raw = raw.trim();
    match category {
        IntelCategory::PaymentIdentifier => raw.to_lowercase(),
        IntelCategory::ContactIdentifier if raw.contains('@') => raw.to_lowercase(),
        IntelCategory::ContactIdentifier => normalize_phone(raw),
        IntelCategory::Url => normalize_url(raw),
        IntelCategory::BankIdentifier => raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_uppercase(),
        IntelCategory::RemoteAccessApp => raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase(),
        IntelCategory::OrganizationClaim => raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
        IntelCategory::CryptoWallet if raw.starts_with("0x") || raw.starts_with("0X") => {
            raw.to_lowercase()
        }
        IntelCategory::CryptoWallet => raw.to_string(),
    }
}

fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        12 if digits.starts_with("91") => digits[2..].to_string(),
        11 if digits.starts_with('0') => digits[1..].to_string(),
        _ => digits,
    }
}

fn normalize_url(raw: &str) -> String {
    let raw = raw.trim_end_matches(TRAILING_PUNCTUATION);
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme.to_lowercase(), rest),
        None => ("https".to_string(), raw),
    };
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (host, path) = rest.split_at(host_end);
    let path = path.trim_end_matches('/');
    format!("{scheme}://{}{path}", host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(items: &[ExtractedItem], category: IntelCategory) -> Vec<&str> {
        items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.raw.as_str())
            .collect()
    }

    #[test]
    fn test_payment_and_phone_scenario() {
        let items = extract("Send money to scammer@ybl or call 9876543210 now");

        assert_eq!(categories(&items, IntelCategory::PaymentIdentifier), vec!["scammer@ybl"]);
        assert_eq!(categories(&items, IntelCategory::ContactIdentifier), vec!["9876543210"]);
        assert!(categories(&items, IntelCategory::BankIdentifier).is_empty());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_email_is_not_a_payment_handle() {
        let items = extract("Write to refunds@paytm.com for the refund");
        assert_eq!(
            categories(&items, IntelCategory::ContactIdentifier),
            vec!["refunds@paytm.com"]
        );
        assert!(categories(&items, IntelCategory::PaymentIdentifier).is_empty());
    }

    #[test]
    fn test_prefixed_phone_is_one_contact() {
        let items = extract("Call +91 9876543210 or +91-9876543210 or 919876543210");
        let contacts = categories(&items, IntelCategory::ContactIdentifier);
        assert_eq!(contacts.len(), 1, "{contacts:?}");
        assert!(categories(&items, IntelCategory::BankIdentifier).is_empty());
    }

    #[test]
    fn test_international_phone() {
        let items = extract("WhatsApp me on +447911123456");
        assert_eq!(
            categories(&items, IntelCategory::ContactIdentifier),
            vec!["+447911123456"]
        );
        assert!(categories(&items, IntelCategory::BankIdentifier).is_empty());
    }

    #[test]
    fn test_bank_account_and_ifsc() {
        let items = extract("Deposit to account 123456789012, IFSC SBIN0001234 today.");
        let bank = categories(&items, IntelCategory::BankIdentifier);
        assert!(bank.contains(&"SBIN0001234"));
        assert!(bank.contains(&"123456789012"));
    }

    #[test]
    fn test_urls_trim_punctuation_and_expand_short_links() {
        let items = extract("Verify at https://secure-sbi.example.com/kyc. Or use bit.ly/abc123");
        let urls = categories(&items, IntelCategory::Url);
        assert_eq!(
            urls,
            vec!["https://secure-sbi.example.com/kyc", "https://bit.ly/abc123"]
        );
    }

    #[test]
    fn test_url_contents_are_not_rescanned() {
        let items = extract("Open https://pay.example.com/u/9876543210/sbi");
        assert!(categories(&items, IntelCategory::ContactIdentifier).is_empty());
        assert!(categories(&items, IntelCategory::OrganizationClaim).is_empty());
    }

    #[test]
    fn test_remote_apps_and_organizations() {
        let items = extract("I am from SBI head office. Install Team Viewer and AnyDesk");
        assert_eq!(categories(&items, IntelCategory::OrganizationClaim), vec!["SBI"]);
        assert_eq!(
            categories(&items, IntelCategory::RemoteAccessApp),
            vec!["Team Viewer", "AnyDesk"]
        );
    }

    #[test]
    fn test_crypto_wallets() {
        let eth = "0x52908400098527886E0F7030069857D2E4169EE7";
        let items = extract(&format!("Send USDT to {eth} or BTC 1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
        let wallets = categories(&items, IntelCategory::CryptoWallet);
        assert_eq!(wallets.len(), 2);
        assert_eq!(normalize(IntelCategory::CryptoWallet, eth), eth.to_lowercase());
    }

    #[test]
    fn test_duplicates_within_one_message_collapse() {
        let items = extract("scammer@ybl SCAMMER@YBL scammer@ybl");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(IntelCategory::ContactIdentifier, "+91 98765-43210"), "9876543210");
        assert_eq!(normalize(IntelCategory::ContactIdentifier, "09876543210"), "9876543210");
        assert_eq!(normalize(IntelCategory::ContactIdentifier, "A@B.Com"), "a@b.com");
        assert_eq!(normalize(IntelCategory::PaymentIdentifier, "Scammer@YBL"), "scammer@ybl");
        assert_eq!(
            normalize(IntelCategory::Url, "HTTPS://Example.COM/Path/"),
            "https://example.com/Path"
        );
        assert_eq!(normalize(IntelCategory::Url, "bit.ly/x"), "https://bit.ly/x");
        assert_eq!(normalize(IntelCategory::BankIdentifier, "1234 5678 9012"), "123456789012");
        assert_eq!(normalize(IntelCategory::RemoteAccessApp, "Any Desk"), "anydesk");
        assert_eq!(
            normalize(IntelCategory::OrganizationClaim, "Reserve  Bank"),
            "reserve bank"
        );
    }

    #[test]
    fn test_plain_text_yields_nothing() {
        assert!(extract("Hello madam, how are you today?").is_empty());
    }
}
