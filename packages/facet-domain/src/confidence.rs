use serde::{Deserialize, Serialize};

/// Lower score bound of the `High` confidence band.
pub const HIGH_CONFIDENCE: f32 = 0.85;
/// Lower score bound of the `Medium` confidence band.
pub const MEDIUM_CONFIDENCE: f32 = 0.70;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
	High,
	Medium,
	Low,
}
impl ConfidenceLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::High => "high",
			Self::Medium => "medium",
			Self::Low => "low",
		}
	}
}

/// Band a similarity score into a confidence level. The bounds are fixed
/// policy, not per-query tunables.
pub fn confidence_level(score: f32) -> ConfidenceLevel {
	if score >= HIGH_CONFIDENCE {
		ConfidenceLevel::High
	} else if score >= MEDIUM_CONFIDENCE {
		ConfidenceLevel::Medium
	} else {
		ConfidenceLevel::Low
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bands_include_their_lower_bound() {
		assert_eq!(confidence_level(0.85), ConfidenceLevel::High);
		assert_eq!(confidence_level(0.849), ConfidenceLevel::Medium);
		assert_eq!(confidence_level(0.70), ConfidenceLevel::Medium);
		assert_eq!(confidence_level(0.699), ConfidenceLevel::Low);
		assert_eq!(confidence_level(0.0), ConfidenceLevel::Low);
	}
}
