use std::fmt::Write as _;

use sysid_bayes::results::{FirMixtureData, FirMixtureResults};
use sysid_bayes::{
    grid_points, simulate_arx, ArxSimConfig, ExperimentResults, PosteriorSamples,
    PosteriorSource, SamplerData, Trace,
};

fn header(name: &str, count: usize) -> Vec<String> {
    (1..=count).map(|k| format!("{name}.{k}")).collect()
}

/// Sampler output in CmdStan layout with `draws` rows
fn fake_sampler_csv(draws: usize, grid: usize, predictive: usize, regressors: usize) -> String {
    let mut columns = vec!["lp__".to_string(), "accept_stat__".to_string()];
    columns.extend(header("mixtureOnGrid", grid));
    columns.extend(header("predictiveWeight", predictive));
    columns.extend(header("predictiveMean", predictive));
    columns.extend(header("predictiveVariance", predictive));
    columns.extend(header("filterCoefficient", regressors));
    columns.extend(header("mixtureWeights", 2));
    columns.extend(header("mixtureMean", 2));

    let mut csv = String::from("# model = fir_mixture\n");
    csv.push_str(&columns.join(","));
    csv.push('\n');
    csv.push_str("# Adaptation terminated\n");

    for d in 0..draws {
        let mut row = vec![format!("{}", -100.0 - d as f64), "0.9".to_string()];
        row.extend((0..grid).map(|_| "0.25".to_string()));
        row.extend((0..predictive).map(|_| "0.5".to_string()));
        row.extend((0..predictive).map(|k| format!("{}", k as f64 + d as f64)));
        row.extend((0..predictive).map(|_| "0.01".to_string()));
        row.extend((0..regressors).map(|k| format!("{}", 0.1 * k as f64)));
        row.extend(["0.3".to_string(), "0.7".to_string()]);
        row.extend(["-0.2".to_string(), "0.2".to_string()]);
        writeln!(csv, "{}", row.join(",")).unwrap();
    }
    csv
}

#[test]
fn test_fir_mixture_pipeline() {
    let config = ArxSimConfig {
        samples: 40,
        ..Default::default()
    };
    let dataset = simulate_arx(&config).unwrap();
    let grid = grid_points(-1.0, 1.0, 0.5).unwrap();
    let data = FirMixtureData::from_dataset(&dataset, grid).unwrap();

    // 20 estimation samples, 3 dropped for the lags
    assert_eq!(data.regressor_matrix_estimation.shape(), (17, 6));
    assert_eq!(data.regressor_matrix_validation.shape(), (17, 6));
    assert_eq!(data.y_estimation.len(), 17);
    assert_eq!(data.y_validation.len(), 17);

    // first estimation row: negated outputs y[2], y[1], y[0] then u[3], u[2], u[1]
    let y = &dataset.outputs;
    let u = &dataset.inputs;
    let first: Vec<f64> = data.regressor_matrix_estimation.row(0).iter().copied().collect();
    assert_eq!(first, vec![-y[2], -y[1], -y[0], u[3], u[2], u[1]]);

    let dir = tempfile::tempdir().unwrap();

    let mut sampler_data = SamplerData::new();
    sampler_data
        .insert_int("noEstimation", data.y_estimation.len() as i64)
        .insert_matrix("regressorMatrixEstimation", &data.regressor_matrix_estimation);
    sampler_data.write(&dir.path().join("data.json")).unwrap();

    let csv_path = dir.path().join("output.csv");
    std::fs::write(&csv_path, fake_sampler_csv(4, 4, 17, 6)).unwrap();
    let posterior = PosteriorSamples::from_stan_csv(&csv_path).unwrap();
    assert_eq!(posterior.draw_count(), 4);
    assert_eq!(posterior.extract_vector("predictiveMean").unwrap().shape(), (4, 17));

    let results = FirMixtureResults::collect(&data, &posterior, "pipeline").unwrap();
    assert_eq!(results.mcmc_density_estimate, vec![0.25; 4]);
    assert_eq!(results.predictive_mean[0], 1.5);
    assert_eq!(results.predictive_weight, vec![0.5; 17]);
    assert_eq!(results.regressor_matrix_estimation.len(), 17);
    assert_eq!(results.true_order, vec![2, 2]);
    assert_eq!(results.guessed_order, vec![3, 3]);
    assert!(matches!(results.mixture_weights, Trace::Nested(_)));

    let path = results.save(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "example3_pipeline.json");

    let loaded = FirMixtureResults::load(&path).unwrap();
    assert_eq!(loaded, results);
    assert_eq!(loaded.output_signal, dataset.outputs);
}
