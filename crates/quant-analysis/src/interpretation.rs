//! Rule-based labels derived from the numeric outputs.
//!
//! Every threshold lives here so the single-asset and portfolio paths share
//! one set of bands.

use serde::Serialize;

use crate::regression::{Coefficient, FactorRegression};

/// |skewness| below this is treated as symmetric.
pub const SKEW_BAND: f64 = 0.5;
/// |excess kurtosis| below this is treated as normal-like.
pub const KURTOSIS_BAND: f64 = 0.5;
/// Coefficients with p below this are flagged significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const STRONG_FIT_R2: f64 = 0.7;
pub const MODERATE_FIT_R2: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkewShape {
    Symmetric,
    RightSkewed,
    LeftSkewed,
}

impl SkewShape {
    pub fn classify(skewness: f64) -> Self {
        if skewness.abs() < SKEW_BAND {
            SkewShape::Symmetric
        } else if skewness > 0.0 {
            SkewShape::RightSkewed
        } else {
            SkewShape::LeftSkewed
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkewShape::Symmetric => "Nearly symmetric distribution (close to normal)",
            SkewShape::RightSkewed => {
                "Long right tail: extreme rallies are rare but possible"
            }
            SkewShape::LeftSkewed => {
                "Long left tail: extreme sell-offs occur more often (risk)"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailShape {
    NormalLike,
    FatTailed,
    ThinTailed,
}

impl TailShape {
    /// Expects excess kurtosis.
    pub fn classify(kurtosis: f64) -> Self {
        if kurtosis.abs() < KURTOSIS_BAND {
            TailShape::NormalLike
        } else if kurtosis > 0.0 {
            TailShape::FatTailed
        } else {
            TailShape::ThinTailed
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TailShape::NormalLike => "Tail thickness in line with a normal distribution",
            TailShape::FatTailed => {
                "Fat tails: extreme values occur often, elevated tail-event risk"
            }
            TailShape::ThinTailed => {
                "Thin tails: extreme values are rare, returns are more predictable"
            }
        }
    }
}

pub fn interpret_skewness(skewness: f64) -> String {
    SkewShape::classify(skewness).description().to_string()
}

pub fn interpret_kurtosis(kurtosis: f64) -> String {
    TailShape::classify(kurtosis).description().to_string()
}

pub fn is_significant(p_value: f64) -> bool {
    p_value < SIGNIFICANCE_LEVEL
}

/// Star for significant coefficients, dot otherwise.
pub fn significance_marker(p_value: f64) -> &'static str {
    if is_significant(p_value) {
        "★"
    } else {
        "·"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrength {
    Strong,
    Moderate,
    Weak,
}

impl FitStrength {
    pub fn classify(r_squared: f64) -> Self {
        if r_squared > STRONG_FIT_R2 {
            FitStrength::Strong
        } else if r_squared > MODERATE_FIT_R2 {
            FitStrength::Moderate
        } else {
            FitStrength::Weak
        }
    }
}

pub fn interpret_alpha(alpha: &Coefficient) -> String {
    if is_significant(alpha.p_value) {
        if alpha.estimate > 0.0 {
            format!(
                "✓ Statistically significant positive alpha ({:.4}): returns beat what the factors explain",
                alpha.estimate
            )
        } else {
            format!(
                "✗ Statistically significant negative alpha ({:.4}): returns lag what the factors explain",
                alpha.estimate
            )
        }
    } else {
        format!(
            "• Alpha ({:.4}) is not statistically significant (p={:.3}): returns are explained by factor exposure",
            alpha.estimate, alpha.p_value
        )
    }
}

pub fn overall_assessment(r_squared: f64) -> String {
    let assessment = match FitStrength::classify(r_squared) {
        FitStrength::Strong => "Strong explanatory power (R² > 0.7)",
        FitStrength::Moderate => "Moderate explanatory power (0.4 < R² ≤ 0.7)",
        FitStrength::Weak => "Weak explanatory power (R² ≤ 0.4): other factors are needed",
    };
    format!("{} (R²={:.3})", assessment, r_squared)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorInterpretation {
    pub beta: f64,
    pub p_value: f64,
    pub significance: String,
}

impl From<&Coefficient> for FactorInterpretation {
    fn from(c: &Coefficient) -> Self {
        Self {
            beta: c.estimate,
            p_value: c.p_value,
            significance: significance_marker(c.p_value).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorInterpretations {
    #[serde(rename = "MKT")]
    pub mkt: FactorInterpretation,
    #[serde(rename = "SMB")]
    pub smb: FactorInterpretation,
    #[serde(rename = "HML")]
    pub hml: FactorInterpretation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionInterpretation {
    pub alpha_interpretation: String,
    pub factor_interpretations: FactorInterpretations,
    pub overall_assessment: String,
}

pub fn interpret_regression(reg: &FactorRegression) -> RegressionInterpretation {
    RegressionInterpretation {
        alpha_interpretation: interpret_alpha(&reg.alpha),
        factor_interpretations: FactorInterpretations {
            mkt: (&reg.mkt).into(),
            smb: (&reg.smb).into(),
            hml: (&reg.hml).into(),
        },
        overall_assessment: overall_assessment(reg.r_squared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coef(estimate: f64, p_value: f64) -> Coefficient {
        Coefficient {
            estimate,
            std_error: 0.01,
            t_stat: estimate / 0.01,
            p_value,
        }
    }

    #[test]
    fn test_skew_bands() {
        assert_eq!(SkewShape::classify(0.0), SkewShape::Symmetric);
        assert_eq!(SkewShape::classify(0.49), SkewShape::Symmetric);
        assert_eq!(SkewShape::classify(0.5), SkewShape::RightSkewed);
        assert_eq!(SkewShape::classify(-0.5), SkewShape::LeftSkewed);
        assert_eq!(SkewShape::classify(-2.0), SkewShape::LeftSkewed);
    }

    #[test]
    fn test_kurtosis_bands() {
        assert_eq!(TailShape::classify(0.1), TailShape::NormalLike);
        assert_eq!(TailShape::classify(4.0), TailShape::FatTailed);
        assert_eq!(TailShape::classify(-1.2), TailShape::ThinTailed);
        assert!(interpret_kurtosis(4.0).starts_with("Fat tails"));
    }

    #[test]
    fn test_significance_markers() {
        assert_eq!(significance_marker(0.01), "★");
        assert_eq!(significance_marker(0.05), "·");
        assert_eq!(significance_marker(0.3), "·");
    }

    #[test]
    fn test_alpha_text() {
        assert!(interpret_alpha(&coef(0.002, 0.01)).contains("positive alpha (0.0020)"));
        assert!(interpret_alpha(&coef(-0.002, 0.01)).contains("negative alpha"));
        let text = interpret_alpha(&coef(0.0003, 0.412));
        assert!(text.contains("not statistically significant (p=0.412)"));
    }

    #[test]
    fn test_fit_bands() {
        assert_eq!(FitStrength::classify(0.85), FitStrength::Strong);
        assert_eq!(FitStrength::classify(0.7), FitStrength::Moderate);
        assert_eq!(FitStrength::classify(0.41), FitStrength::Moderate);
        assert_eq!(FitStrength::classify(0.4), FitStrength::Weak);
        assert!(overall_assessment(0.8123).ends_with("(R²=0.812)"));
    }
}
