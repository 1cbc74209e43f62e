/// Structured risk signals emitted by the scorers.
///
/// Rules return typed signals instead of strings so the scorers stay unit
/// testable and the alert table owns all rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    // Fiat channel, in evaluation order.
    GeoMismatch { geo: String, card: String },
    AnomalousAmount { amount: f64, currency: String },
    GreyListCountry { country: String },
    // Crypto channel, in evaluation order.
    MixerExposure { pct: u32 },
    DarknetExposure { pct: u32 },
    SanctionedExposure { pct: u32 },
    AmlListed,
    YoungAddress { days: i64 },
    InsufficientData,
    // Pipeline-level.
    PartialAnalysis,
}

impl Signal {
    /// Canonical position within an alert group. Rendering sorts by this
    /// rank so output order is independent of collection order.
    pub fn rank(&self) -> u8 {
        match self {
            Self::GeoMismatch { .. } => 0,
            Self::AnomalousAmount { .. } => 1,
            Self::GreyListCountry { .. } => 2,
            Self::MixerExposure { .. } => 3,
            Self::DarknetExposure { .. } => 4,
            Self::SanctionedExposure { .. } => 5,
            Self::AmlListed => 6,
            Self::YoungAddress { .. } => 7,
            Self::InsufficientData => 8,
            Self::PartialAnalysis => 9,
        }
    }
}

/// Risk for one channel: a probability plus the signals that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRisk {
    pub probability: f64,
    pub signals: Vec<Signal>,
}

impl ChannelRisk {
    pub fn new(probability: f64, signals: Vec<Signal>) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            signals,
        }
    }
}
