use std::collections::HashMap;

use analysis_core::{
    AnalysisError, FactorObservation, FactorSeries, PortfolioSpec, PricePoint,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::regression::daily_risk_free_rate;
use crate::{AnalysisConfig, Outcome, QuantAnalysisEngine};

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::days(i as i64)
}

fn prices(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(day(i), c))
        .collect()
}

/// Compound a return path into prices starting at 100.
fn prices_from_returns(returns: &[f64]) -> Vec<PricePoint> {
    let mut closes = vec![100.0];
    for r in returns {
        let last = closes[closes.len() - 1];
        closes.push(last * (1.0 + r));
    }
    prices(&closes)
}

/// Random factor rows dated to line up with returns from `prices_from_returns`.
fn random_factors(n: usize, seed: u64) -> FactorSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (1..=n)
        .map(|i| FactorObservation {
            date: day(i),
            mkt: rng.gen_range(-0.03..0.03),
            smb: rng.gen_range(-0.01..0.01),
            hml: rng.gen_range(-0.01..0.01),
        })
        .collect();
    FactorSeries::new(rows).unwrap()
}

#[test]
fn test_analyze_ticker_closed_form() {
    let engine = QuantAnalysisEngine::new();
    let analysis = engine.analyze_ticker(&prices(&[100.0, 101.0, 99.0, 105.0])).unwrap();

    let r = [0.01, 99.0 / 101.0 - 1.0, 105.0 / 99.0 - 1.0];
    let mean = r.iter().sum::<f64>() / 3.0;
    assert!((analysis.statistics.mean - mean).abs() < 1e-12);
    assert_eq!(analysis.statistics.min, r[1]);
    assert_eq!(analysis.statistics.max, r[2]);

    assert_eq!(analysis.price_history.prices, vec![100.0, 101.0, 99.0, 105.0]);
    assert_eq!(analysis.histogram.counts.iter().sum::<u64>(), 3);
    assert_eq!(analysis.qq_plot.sample.len(), 3);
    // 30 requested lags capped at n - 1
    assert_eq!(analysis.acf.coefficients().len(), 3);
}

#[test]
fn test_ticker_payload_keys() {
    let engine = QuantAnalysisEngine::new();
    let mut rng = StdRng::seed_from_u64(5);
    let returns: Vec<f64> = (0..120).map(|_| rng.gen_range(-0.02..0.02)).collect();
    let analysis = engine.analyze_ticker(&prices_from_returns(&returns)).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    for key in ["price_history", "statistics", "histogram", "qq_plot", "acf"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    let stats = &json["statistics"];
    for key in [
        "mean",
        "std",
        "min",
        "max",
        "skewness",
        "kurtosis",
        "normalcy_test",
        "skewness_interpretation",
        "kurtosis_interpretation",
        "risk",
    ] {
        assert!(stats.get(key).is_some(), "missing statistics.{}", key);
    }
    assert!(stats["normalcy_test"]["p_value_str"].is_string());
    assert!(stats["risk"]["var_95"].as_f64().unwrap() < 0.0);
    assert_eq!(json["histogram"]["counts"].as_array().unwrap().len(), 20);
    assert_eq!(json["acf"].as_array().unwrap().len(), 31);
}

#[test]
fn test_flat_prices_are_degenerate() {
    let engine = QuantAnalysisEngine::new();
    let result = engine.analyze_ticker(&prices(&[50.0; 12]));
    assert!(matches!(result, Err(AnalysisError::DegenerateSeries(_))));
}

#[test]
fn test_constant_growth_is_degenerate_everywhere() {
    let engine = QuantAnalysisEngine::new();
    let closes: Vec<f64> = (0..=60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
    let path = prices(&closes);
    let factors = random_factors(60, 17);

    let stats = engine.analyze_ticker(&path);
    assert!(matches!(stats, Err(AnalysisError::DegenerateSeries(_))));
    let exposure = engine.factor_exposure(&path, &factors);
    assert!(matches!(exposure, Err(AnalysisError::DegenerateSeries(_))));
}

#[test]
fn test_min_observations_enforced() {
    let engine = QuantAnalysisEngine::new();
    let result = engine.analyze_ticker(&prices(&[100.0, 101.0, 102.5]));
    assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));

    let strict = QuantAnalysisEngine::with_config(AnalysisConfig {
        min_observations: 10,
        ..Default::default()
    });
    let result = strict.analyze_ticker(&prices(&[100.0, 101.0, 99.0, 105.0]));
    assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
}

#[test]
fn test_batch_isolates_failures() {
    let engine = QuantAnalysisEngine::new();
    let histories = vec![
        ("GOOD".to_string(), prices(&[100.0, 101.0, 99.0, 105.0, 104.0])),
        ("FLAT".to_string(), prices(&[10.0; 6])),
        ("SHORT".to_string(), prices(&[10.0])),
    ];
    let results = engine.analyze_batch(&histories);

    assert_eq!(results.len(), 3);
    assert!(results["GOOD"].is_ok());
    assert!(matches!(&results["FLAT"], Outcome::Failed { error } if error.starts_with("Degenerate")));
    assert!(!results["SHORT"].is_ok());
}

#[test]
fn test_factor_exposure_recovers_loadings() {
    let n = 200;
    let factors = random_factors(n, 17);
    let rf = daily_risk_free_rate(0.05);
    let returns: Vec<f64> = factors
        .rows()
        .iter()
        .map(|f| rf + 1.2 * f.mkt + 0.3 * f.smb - 0.4 * f.hml)
        .collect();

    let engine = QuantAnalysisEngine::new();
    let exposure = engine
        .factor_exposure(&prices_from_returns(&returns), &factors)
        .unwrap();

    assert!((exposure.betas.mkt - 1.2).abs() < 1e-8);
    assert!((exposure.betas.smb - 0.3).abs() < 1e-8);
    assert!((exposure.betas.hml + 0.4).abs() < 1e-8);
    assert!(exposure.betas.alpha.abs() < 1e-8);
    assert!(exposure.r_squared > 0.999_999);
    assert_eq!(exposure.interpretation.factor_interpretations.mkt.significance, "★");
}

#[test]
fn test_factor_exposure_missing_dates() {
    let factors = random_factors(10, 1);
    let mut rng = StdRng::seed_from_u64(2);
    let returns: Vec<f64> = (0..20).map(|_| rng.gen_range(-0.02..0.02)).collect();

    let engine = QuantAnalysisEngine::new();
    let result = engine.factor_exposure(&prices_from_returns(&returns), &factors);
    assert!(matches!(result, Err(AnalysisError::FactorAlignment(_))));
}

#[test]
fn test_identical_portfolio_matches_single_asset() {
    let n = 150;
    let factors = random_factors(n, 23);
    let mut rng = StdRng::seed_from_u64(29);
    let returns: Vec<f64> = factors
        .rows()
        .iter()
        .map(|f| 0.9 * f.mkt + 0.5 * f.smb + rng.gen_range(-0.005..0.005))
        .collect();
    let history = prices_from_returns(&returns);

    let engine = QuantAnalysisEngine::new();
    let single = engine.factor_exposure(&history, &factors).unwrap();

    let mut histories = HashMap::new();
    histories.insert("AAA".to_string(), history.clone());
    histories.insert("BBB".to_string(), history);
    let spec = PortfolioSpec::new(vec!["AAA".into(), "BBB".into()], vec![0.5, 0.5]).unwrap();
    let portfolio = engine.portfolio_exposure(&spec, &histories, &factors).unwrap();

    assert!((portfolio.exposure.betas.mkt - single.betas.mkt).abs() < 1e-10);
    assert!((portfolio.exposure.betas.smb - single.betas.smb).abs() < 1e-10);
    assert!((portfolio.exposure.r_squared - single.r_squared).abs() < 1e-10);
    assert_eq!(portfolio.portfolio, vec!["AAA", "BBB"]);
    assert_eq!(portfolio.weights, vec![0.5, 0.5]);
}

#[test]
fn test_portfolio_unknown_constituent() {
    let factors = random_factors(30, 3);
    let mut histories = HashMap::new();
    histories.insert("AAA".to_string(), prices(&[1.0, 1.1, 1.2, 1.15]));
    let spec = PortfolioSpec::equal_weighted(vec!["AAA".into(), "ZZZ".into()]).unwrap();

    let engine = QuantAnalysisEngine::new();
    let result = engine.portfolio_exposure(&spec, &histories, &factors);
    assert_eq!(result.unwrap_err(), AnalysisError::UnknownTicker("ZZZ".into()));
}

#[test]
fn test_factor_batch_isolates_failures() {
    let factors = random_factors(60, 8);
    let mut rng = StdRng::seed_from_u64(9);
    let returns: Vec<f64> = (0..60).map(|_| rng.gen_range(-0.02..0.02)).collect();
    let histories = vec![
        ("OK".to_string(), prices_from_returns(&returns)),
        ("TINY".to_string(), prices(&[1.0, 1.01, 0.99, 1.02])),
    ];

    let engine = QuantAnalysisEngine::new();
    let results = engine.factor_exposure_batch(&histories, &factors);
    assert!(results["OK"].is_ok());
    assert!(matches!(&results["TINY"], Outcome::Failed { .. }));
}
