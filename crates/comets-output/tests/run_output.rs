//! End-to-end tests for `RunOutput`: engine-format logs written into a
//! temporary working directory, loaded through the public API.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::missing_panics_doc
)]

use comets_logs::{LogError, OutOfGridPolicy};
use comets_output::{
    ConfigError, LayoutConfig, LogPaths, LogRequests, OutputConfig, OutputError, RunConfig,
    RunOutput,
};
use comets_types::{EntityKind, GridCoord, GridShape, LogKind, Model, RunId};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    config: OutputConfig,
    paths: LogPaths,
}

impl Fixture {
    fn new(logs: LogRequests) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let run_id = RunId::new();
        let config = OutputConfig {
            run: RunConfig {
                id: Some(run_id),
                working_dir: dir.path().to_path_buf(),
                delete_files: true,
            },
            layout: LayoutConfig {
                grid: GridShape::new(3, 3),
                metabolites: vec!["glucose".to_owned(), "oxygen".to_owned()],
            },
            models: vec![
                Model::new("ecoli", ["EX_glc", "BIOMASS"]),
                Model::new("yeast", ["EX_glc", "EX_o2", "BIOMASS"]),
            ],
            logs,
            ..OutputConfig::default()
        };
        let paths = LogPaths::for_run(dir.path(), run_id, None);
        Self { dir, config, paths }
    }

    fn write(&self, kind: LogKind, contents: &str) {
        std::fs::write(self.paths.path(kind), contents).unwrap();
    }

    fn load(&self) -> Result<RunOutput, OutputError> {
        RunOutput::load(&self.config)
    }
}

fn all_logs() -> LogRequests {
    LogRequests {
        total_biomass: true,
        biomass: true,
        flux: true,
        media: true,
        specific_media: true,
        ..LogRequests::default()
    }
}

fn write_standard_logs(f: &Fixture) {
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n1\t1.5\t2.5\n2\t2.0\t3.0\n");
    f.write(
        LogKind::Biomass,
        "0 1 1 ecoli 1.0\n0 2 2 yeast 2.0\n1 1 1 ecoli 1.5\n1 3 3 yeast 2.5\n",
    );
    f.write(
        LogKind::Flux,
        "1 1 1 1 -10.0 0.5\n\
         1 2 2 2 -5.0 -1.0 0.2\n\
         2 1 2 1 -9.0 0.6\n",
    );
    f.write(
        LogKind::Media,
        "glucose 0 1 1 10.0\nglucose 1 2 1 9.0\noxygen 1 3 2 4.0\nglucose 2 1 3 8.0\n",
    );
    f.write(
        LogKind::SpecificMedia,
        "cycle x y glucose\n0 1 1 10.0\n1 2 1 9.0\n",
    );
}

#[test]
fn loads_every_requested_log() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    let total = output.total_biomass().unwrap();
    assert_eq!(total.len(), 3);
    assert_eq!(total.value(2, "yeast"), Some(3.0));

    assert_eq!(output.biomass().unwrap().len(), 4);
    assert_eq!(output.media().unwrap().len(), 4);
    assert_eq!(output.raw_fluxes().unwrap().max_cols(), 7);
    assert_eq!(output.fluxes_by_model().unwrap().len(), 2);
    assert_eq!(output.fluxes_of("ecoli").unwrap().len(), 2);
    assert_eq!(output.fluxes_of("yeast").unwrap().len(), 1);

    let specific = output.specific_media().unwrap();
    assert_eq!(specific.columns(), ["cycle", "x", "y", "glucose"]);
    assert_eq!(specific.len(), 2);
}

#[test]
fn consumed_logs_are_deleted() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    f.load().unwrap();

    for kind in [
        LogKind::TotalBiomass,
        LogKind::Biomass,
        LogKind::Flux,
        LogKind::Media,
        LogKind::SpecificMedia,
    ] {
        assert!(!f.paths.path(kind).exists(), "{kind} log was kept");
    }
}

#[test]
fn failed_load_deletes_nothing() {
    let f = Fixture::new(LogRequests {
        flux: true,
        ..LogRequests::default()
    });
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n");
    f.write(LogKind::Flux, "0 1 1 1 abc\n");

    let err = f.load().unwrap_err();
    assert!(matches!(
        err,
        OutputError::Log {
            source: LogError::CorruptLine {
                kind: LogKind::Flux,
                line: 1,
                ..
            }
        }
    ));
    // Total biomass loads first and must survive the later failure.
    assert!(f.paths.path(LogKind::TotalBiomass).exists());
    assert!(f.paths.path(LogKind::Flux).exists());
}

#[test]
fn logs_are_kept_when_deletion_is_off() {
    let mut f = Fixture::new(all_logs());
    f.config.run.delete_files = false;
    write_standard_logs(&f);
    f.load().unwrap();

    assert!(f.paths.path(LogKind::Flux).exists());
    assert!(f.dir.path().read_dir().unwrap().count() >= 5);
}

#[test]
fn metabolite_image_places_values_and_zero_fills() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    let grid = output.metabolite_image("glucose", 1).unwrap();
    assert_eq!(grid.dim(), (3, 3));
    assert_eq!(grid[[1, 0]], 9.0);
    assert_eq!(grid.sum(), 9.0);

    // Oxygen has no record at cycle 0 but the cycle itself was recorded.
    let empty = output.metabolite_image("oxygen", 0).unwrap();
    assert_eq!(empty.sum(), 0.0);
}

#[test]
fn out_of_grid_media_row_is_rejected_alone() {
    let f = Fixture::new(LogRequests {
        media: true,
        ..LogRequests::default()
    });
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n");
    f.write(LogKind::Media, "glucose 0 1 1 10.0\nglucose 0 4 1 4.0\noxygen 0 2 3 1.0\n");
    let output = f.load().unwrap();

    let rejected = output.rejected_rows();
    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        rejected[0],
        LogError::OutOfGrid {
            kind: LogKind::Media,
            coord: GridCoord { x: 4, y: 1 },
            ..
        }
    ));
    assert_eq!(output.rejected_count(LogKind::Media), 1);
    assert_eq!(output.rejected_count(LogKind::Biomass), 0);

    assert_eq!(output.media().unwrap().len(), 2);
    let glucose = output.metabolite_image("glucose", 0).unwrap();
    assert_eq!(glucose[[0, 0]], 10.0);
    assert_eq!(glucose.sum(), 10.0);

    let summary = output.summary();
    assert_eq!(summary.logs[&LogKind::Media].rejected, 1);
    assert_eq!(summary.logs[&LogKind::TotalBiomass].rejected, 0);
}

#[test]
fn out_of_grid_row_fails_the_load_when_aborting() {
    let mut f = Fixture::new(LogRequests {
        media: true,
        ..LogRequests::default()
    });
    f.config.policy.out_of_grid = OutOfGridPolicy::Abort;
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n");
    f.write(LogKind::Media, "glucose 0 1 1 10.0\nglucose 0 4 1 4.0\n");

    let err = f.load().unwrap_err();
    assert!(matches!(
        err,
        OutputError::Log {
            source: LogError::OutOfGrid {
                kind: LogKind::Media,
                ..
            }
        }
    ));
    assert!(f.paths.path(LogKind::Media).exists());
}

#[test]
fn missing_run_id_fails_the_load() {
    let mut f = Fixture::new(all_logs());
    write_standard_logs(&f);
    f.config.run.id = None;

    let err = f.load().unwrap_err();
    assert!(matches!(
        err,
        OutputError::Config {
            source: ConfigError::Invalid(_)
        }
    ));
    assert!(f.paths.path(LogKind::TotalBiomass).exists());
}

#[test]
fn metabolite_image_rejects_bad_queries() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    assert!(matches!(
        output.metabolite_image("glucose", 5),
        Err(LogError::CycleNotRecorded {
            kind: LogKind::Media,
            cycle: 5
        })
    ));
    assert!(matches!(
        output.metabolite_image("lactate", 1),
        Err(LogError::UnallocatedMetabolite(ref m)) if m == "lactate"
    ));
}

#[test]
fn biomass_image_for_configured_model() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    let grid = output.biomass_image("yeast", 1).unwrap();
    assert_eq!(grid[[2, 2]], 2.5);
    assert_eq!(grid.sum(), 2.5);

    assert!(matches!(
        output.biomass_image("bacillus", 1),
        Err(LogError::UnknownEntity {
            kind: EntityKind::Model,
            log: LogKind::Biomass,
            ..
        })
    ));
    assert!(matches!(
        output.biomass_image("ecoli", 9),
        Err(LogError::CycleNotRecorded {
            kind: LogKind::Biomass,
            cycle: 9
        })
    ));
}

#[test]
fn flux_image_checks_model_then_cycle_then_reaction() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    let grid = output.flux_image("ecoli", "BIOMASS", 2).unwrap();
    assert_eq!(grid[[0, 1]], 0.6);
    assert_eq!(grid.sum(), 0.6);

    let yeast = output.flux_image("yeast", "EX_o2", 1).unwrap();
    assert_eq!(yeast[[1, 1]], -1.0);

    assert!(matches!(
        output.flux_image("bacillus", "EX_glc", 1),
        Err(LogError::UnknownEntity {
            kind: EntityKind::Model,
            ..
        })
    ));
    // Cycle 2 exists in the flux log, but not for yeast.
    assert!(matches!(
        output.flux_image("yeast", "EX_glc", 2),
        Err(LogError::CycleNotRecorded {
            kind: LogKind::Flux,
            cycle: 2
        })
    ));
    assert!(matches!(
        output.flux_image("ecoli", "EX_o2", 1),
        Err(LogError::UnknownEntity {
            kind: EntityKind::Reaction,
            ..
        })
    ));
}

#[test]
fn unrequested_logs_are_not_recorded() {
    let f = Fixture::new(LogRequests::default());
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n");
    let output = f.load().unwrap();

    assert!(output.total_biomass().is_ok());
    assert!(matches!(
        output.media(),
        Err(LogError::LogNotRecorded(LogKind::Media))
    ));
    assert!(matches!(
        output.biomass_image("ecoli", 0),
        Err(LogError::LogNotRecorded(LogKind::Biomass))
    ));
    assert!(matches!(
        output.genotypes(),
        Err(LogError::LogNotRecorded(LogKind::Genotypes))
    ));
}

#[test]
fn evolution_run_reads_biomass_and_genotypes() {
    let f = Fixture::new(LogRequests {
        evolution: true,
        ..LogRequests::default()
    });
    f.write(
        LogKind::Biomass,
        "0 1 1 ecoli 1.0\n1 1 1 ecoli 0.9\n1 2 3 ecoli_0x1 0.1\n",
    );
    f.write(LogKind::Genotypes, "ecoli del_EX_glc ecoli_0x1\n");
    let output = f.load().unwrap();

    assert!(matches!(
        output.total_biomass(),
        Err(LogError::LogNotRecorded(LogKind::TotalBiomass))
    ));
    let genotypes = output.genotypes().unwrap();
    assert_eq!(genotypes.descendants_of("ecoli").collect::<Vec<_>>(), ["ecoli_0x1"]);

    // Mutants are not configured models but can still be imaged.
    let mutant = output.biomass_image("ecoli_0x1", 1).unwrap();
    assert_eq!(mutant[[1, 2]], 0.1);

    // A configured model absent from the log images as all zeros.
    let yeast = output.biomass_image("yeast", 1).unwrap();
    assert_eq!(yeast.sum(), 0.0);
}

#[test]
fn missing_requested_log_fails_the_load() {
    let f = Fixture::new(all_logs());
    f.write(LogKind::TotalBiomass, "0\t1.0\t2.0\n");

    let err = f.load().unwrap_err();
    assert!(matches!(
        err,
        OutputError::Log {
            source: LogError::MissingLogFile {
                kind: LogKind::Flux,
                ..
            }
        }
    ));
}

#[test]
fn engine_failure_skips_loading() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);

    let err = RunOutput::load_after_engine(&f.config, "java.lang.Error: infeasible\n")
        .unwrap_err();
    assert!(matches!(err, OutputError::EngineFailed { .. }));
    // Nothing was read, so nothing was deleted.
    assert!(f.paths.path(LogKind::Flux).exists());

    let output = RunOutput::load_after_engine(&f.config, "End of simulation\n").unwrap();
    assert!(output.media().is_ok());
}

#[test]
fn summary_serializes_to_json() {
    let f = Fixture::new(all_logs());
    write_standard_logs(&f);
    let output = f.load().unwrap();

    let summary = output.summary();
    assert_eq!(summary.logs[&LogKind::Media].cycles, vec![0, 1, 2]);
    assert_eq!(
        summary.flux_rows,
        vec![("ecoli".to_owned(), 2), ("yeast".to_owned(), 1)]
    );

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["grid"], serde_json::json!([3, 3]));
    assert_eq!(json["logs"]["total_biomass"]["rows"], 3);
    assert_eq!(json["logs"]["specific_media"]["cycles"], serde_json::json!([]));
}
