use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Conversation states, in their only permitted order.
///
/// The derived `Ord` follows declaration order, so `a < b` means `a` comes
/// earlier in the conversation.
#[derive(
    Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Initial,
    Confusion,
    BuildingTrust,
    FeignedCompliance,
    DelayTactics,
    Conclusion,
}

/// Advisory guidance for the reply generator. Has no effect on extraction or timing.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tactic {
    pub goal: &'static str,
    pub tactics: &'static [&'static str],
    /// Safe replies used when no generated candidate passes the checks
    pub fallback_replies: &'static [&'static str],
}

const INITIAL: Tactic = Tactic {
    goal: "Express surprise and mild concern",
    tactics: &[
        "Ask who is calling",
        "Express confusion about the issue",
        "Ask for clarification",
    ],
    fallback_replies: &[
        "Kaun bol raha hai? Mujhe samajh nahi aaya...",
        "Kya baat hai? Mere account mein koi problem hai?",
        "Aap kaun hai? Kis company se bol rahe hai?",
    ],
};

const CONFUSION: Tactic = Tactic {
    goal: "Draw out the adversary's claims",
    tactics: &[
        "Ask them to repeat and explain slowly",
        "Express technical confusion",
        "Ask for official verification",
    ],
    fallback_replies: &[
        "Mujhe samajh nahi aa raha, thoda dhire boliye na",
        "Ye OTP kya hota hai? Mujhe nahi pata ye sab",
        "Aap sach mein bank se bol rahe ho? Kaise yakeen karun?",
    ],
};

const BUILDING_TRUST: Tactic = Tactic {
    goal: "Appear willing to cooperate",
    tactics: &[
        "Express willingness to resolve the issue",
        "Share minor invented details",
        "Ask for more specific instructions",
    ],
    fallback_replies: &[
        "Haan haan, main madad karungi, bataiye kya karna hai",
        "Theek hai, main app download karti hoon, phir?",
    ],
};

const FEIGNED_COMPLIANCE: Tactic = Tactic {
    goal: "Pretend to follow instructions while collecting details",
    tactics: &[
        "Claim to be doing what is asked without doing it",
        "Report invented errors",
        "Ask for alternative methods",
    ],
    fallback_replies: &[
        "Maine link click kiya par error aa raha hai...",
        "OTP aaya tha par galat type ho gaya, dobara bhejo",
        "Ye app install nahi ho raha, koi aur tarika hai?",
    ],
};

const DELAY_TACTICS: Tactic = Tactic {
    goal: "Stall and collect as much as possible",
    tactics: &[
        "Invent technical issues",
        "Claim network problems",
        "Say a family member must help first",
        "Ask for their contact details",
    ],
    fallback_replies: &[
        "Network bahut slow hai, thodi der mein try karti hoon",
        "Aapka WhatsApp number dedo, kal baat karte hain",
        "Ye payment fail ho gaya, aapka UPI ID phir se bhejo",
    ],
};

const CONCLUSION: Tactic = Tactic {
    goal: "End the conversation without alerting the adversary",
    tactics: &[
        "Claim the phone battery is dying",
        "Say someone came to the door",
        "Promise to call back later",
    ],
    fallback_replies: &[
        "Battery khatam ho rahi hai, baad mein baat karte hain",
        "Koi aaya hai darwaze pe, main phir message karti hoon",
    ],
};

impl ConversationState {
    /// The next state in the ordering, `None` for `Conclusion`.
    pub fn next(self) -> Option<Self> {
        match self {
            ConversationState::Initial => Some(ConversationState::Confusion),
            ConversationState::Confusion => Some(ConversationState::BuildingTrust),
            ConversationState::BuildingTrust => Some(ConversationState::FeignedCompliance),
            ConversationState::FeignedCompliance => Some(ConversationState::DelayTactics),
            ConversationState::DelayTactics => Some(ConversationState::Conclusion),
            ConversationState::Conclusion => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ConversationState::Conclusion
    }

    pub fn tactic(self) -> &'static Tactic {
        match self {
            ConversationState::Initial => &INITIAL,
            ConversationState::Confusion => &CONFUSION,
            ConversationState::BuildingTrust => &BUILDING_TRUST,
            ConversationState::FeignedCompliance => &FEIGNED_COMPLIANCE,
            ConversationState::DelayTactics => &DELAY_TACTICS,
            ConversationState::Conclusion => &CONCLUSION,
        }
    }
}
