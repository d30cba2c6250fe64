use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub is_eligible: bool,
    pub remaining_juz: u32,
    pub message: String,
}

/// Tasmi registration check. Total: a bad target is reported as a
/// non-eligible result, never an error.
pub fn evaluate(achieved: i64, target: i64) -> EligibilityResult {
    if target <= 0 {
        return EligibilityResult {
            is_eligible: false,
            remaining_juz: 0,
            message: format!(
                "Invalid target configuration: target Juz must be greater than 0 (got {})",
                target
            ),
        };
    }

    let achieved = achieved.max(0);
    if achieved >= target {
        return EligibilityResult {
            is_eligible: true,
            remaining_juz: 0,
            message: format!(
                "Ready to register: {} Juz achieved (target {} Juz)",
                achieved, target
            ),
        };
    }

    let remaining = target - achieved;
    EligibilityResult {
        is_eligible: false,
        remaining_juz: u32::try_from(remaining).unwrap_or(u32::MAX),
        message: format!(
            "Not ready: needs {} more Juz (achieved {} of {} Juz)",
            remaining, achieved, target
        ),
    }
}
