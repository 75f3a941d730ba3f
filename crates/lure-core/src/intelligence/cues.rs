//! Behaviour cues for the narrative summary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Pressure tactics recognizable from adversary wording.
///
/// Declaration order is the tie-break priority: earlier wins.
#[derive(
    Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BehaviorCue {
    Urgency,
    Threat,
    CredentialRequest,
    PaymentRequest,
    Impersonation,
    RewardLure,
    RemoteAccess,
}

static URGENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:urgent(?:ly)?|immediately|right now|within \d+ (?:minutes?|hours?)|today itself|last chance|hurry|asap|expire[sd]?)\b").unwrap()
});
static THREAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:block(?:ed)?|suspend(?:ed)?|arrest(?:ed)?|legal action|police|penalty|freeze|frozen|deactivat(?:e|ed))\b").unwrap()
});
static CREDENTIAL_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:otp|pin|cvv|password|card number|aadha?r|pan card|kyc)\b").unwrap()
});
static PAYMENT_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:pay|send money|transfer|deposit|processing fee|registration fee|upi)\b").unwrap()
});
static IMPERSONATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:calling from|i am from|officer|bank manager|customer care|head office|government|department)\b").unwrap()
});
static REWARD_LURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:won|winner|lottery|prize|cashback|refund|reward|guaranteed returns?|double your)\b").unwrap()
});
static REMOTE_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:any\s?desk|team\s?viewer|quick\s?support|screen\s?share|remote (?:app|access|desktop)|install (?:the|this) app)\b").unwrap()
});

impl BehaviorCue {
    fn pattern(self) -> &'static Regex {
        match self {
            BehaviorCue::Urgency => &URGENCY,
            BehaviorCue::Threat => &THREAT,
            BehaviorCue::CredentialRequest => &CREDENTIAL_REQUEST,
            BehaviorCue::PaymentRequest => &PAYMENT_REQUEST,
            BehaviorCue::Impersonation => &IMPERSONATION,
            BehaviorCue::RewardLure => &REWARD_LURE,
            BehaviorCue::RemoteAccess => &REMOTE_ACCESS,
        }
    }

    /// One-line description used as the report summary.
    pub fn summary(self) -> &'static str {
        match self {
            BehaviorCue::Urgency => "Adversary relied primarily on urgency and time pressure",
            BehaviorCue::Threat => "Adversary relied primarily on threats of blocking or legal action",
            BehaviorCue::CredentialRequest => "Adversary repeatedly requested credentials such as OTP or PIN",
            BehaviorCue::PaymentRequest => "Adversary repeatedly pushed for a payment or transfer",
            BehaviorCue::Impersonation => "Adversary impersonated an official or institutional representative",
            BehaviorCue::RewardLure => "Adversary lured with prizes, refunds or returns",
            BehaviorCue::RemoteAccess => "Adversary pushed for installation of a remote-access app",
        }
    }
}

/// Occurrence counts per cue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTally {
    counts: BTreeMap<BehaviorCue, u32>,
}

impl CueTally {
    pub fn count(&self, cue: BehaviorCue) -> u32 {
        self.counts.get(&cue).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<BehaviorCue, u32> {
        &self.counts
    }

    /// Cue with the highest count; ties go to the higher-priority cue.
    pub fn dominant(&self) -> Option<BehaviorCue> {
        let mut best: Option<(BehaviorCue, u32)> = None;
        for cue in BehaviorCue::iter() {
            let count = self.count(cue);
            if count == 0 {
                continue;
            }
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((cue, count));
            }
        }
        best.map(|(cue, _)| cue)
    }
}

/// Tallies cue keyword occurrences across `texts`.
pub fn tally_cues<'a, I>(texts: I) -> CueTally
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tally = CueTally::default();
    for text in texts {
        for cue in BehaviorCue::iter() {
            let hits = cue.pattern().find_iter(text).count() as u32;
            if hits > 0 {
                *tally.counts.entry(cue).or_insert(0) += hits;
            }
        }
    }
    tally
}
