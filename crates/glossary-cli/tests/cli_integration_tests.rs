//! CLI integration tests for glossary
//!
//! Runs the glossary binary end-to-end against local `file://` datasets,
//! with the config directory and database inside a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const API_KEY: &str = "test-api-key";

const SCHEME_IRI: &str = "http://data.europa.eu/xsp/cn2024/cn2024";
const CONCEPT1_IRI: &str = "http://data.europa.eu/xsp/cn2024/020321000080";
const CONCEPT2_IRI: &str = "http://data.europa.eu/xsp/cn2024/020321000010";
const COLLECTION1_IRI: &str = "https://example.org/collection1";

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../glossary-core/tests/fixtures/cn2024_sample.rdf")
}

/// Isolated environment: its own config dir, database and working directory
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("glossary").unwrap();
        cmd.current_dir(self.dir.path())
            .env("GLOSSARY_CONFIG_DIR", self.dir.path().join("config"))
            .env_remove("GLOSSARY_API_KEY")
            .env_remove("RUST_LOG")
            .arg("--database")
            .arg(self.dir.path().join("glossary.db"));
        cmd
    }

    fn with_key(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("GLOSSARY_API_KEY", API_KEY);
        cmd
    }

    fn set_datasets(&self, datasets: &[(&str, String)]) {
        let value = datasets
            .iter()
            .map(|(name, url)| format!("{name}={url}"))
            .collect::<Vec<_>>()
            .join(",");
        self.cmd()
            .args(["config", "set", "ingestion.datasets", &value])
            .assert()
            .success();
        self.cmd()
            .arg("config")
            .arg("set")
            .arg("ingestion.data_dir")
            .arg(self.dir.path().join("cache"))
            .assert()
            .success();
    }

    /// Configure the sample dataset and load it
    fn loaded() -> Self {
        let env = Self::new();
        env.set_datasets(&[("cn.rdf", format!("file://{}", sample_path().display()))]);
        env.with_key()
            .args(["init", "--api-key", API_KEY])
            .assert()
            .success();
        env
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).unwrap()
    }
}

#[test]
fn test_help_lists_commands() {
    Env::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("schemes"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_version_flag() {
    Env::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_config_path_uses_override() {
    let env = Env::new();
    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            env.dir.path().join("config").display().to_string(),
        ));
}

#[test]
fn test_config_set_get_and_reset() {
    let env = Env::new();
    env.cmd()
        .args(["config", "set", "search.case_sensitive", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set search.case_sensitive = false"));
    env.cmd()
        .args(["config", "get", "search.case_sensitive"])
        .assert()
        .success()
        .stdout("false\n");

    env.cmd().args(["config", "reset"]).assert().success();
    env.cmd()
        .args(["config", "get", "search.case_sensitive"])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn test_config_refuses_api_key() {
    Env::new()
        .cmd()
        .args(["config", "set", "api.api_key", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GLOSSARY_API_KEY"));
}

#[test]
fn test_init_requires_configured_key() {
    Env::new()
        .cmd()
        .args(["init", "--api-key", API_KEY])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The API key is missing for: GLOSSARY_API_KEY.",
        ))
        .stderr(predicate::str::contains("E500"));
}

#[test]
fn test_init_rejects_wrong_key() {
    let env = Env::new();
    env.with_key()
        .args(["init", "--api-key", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API Key"));
    env.with_key()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API Key"));
}

#[test]
fn test_init_reports_saved_and_failed() {
    let env = Env::new();
    let missing = env.dir.path().join("missing.rdf");
    env.set_datasets(&[
        ("cn.rdf", format!("file://{}", sample_path().display())),
        ("missing.rdf", missing.display().to_string()),
    ]);

    env.with_key()
        .args(["init", "--api-key", API_KEY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved datasets (1)"))
        .stdout(predicate::str::contains("[OK] cn.rdf"))
        .stdout(predicate::str::contains("Failed datasets (1)"))
        .stdout(predicate::str::contains("[!!] missing.rdf"));
}

#[test]
fn test_init_json_report() {
    let env = Env::new();
    env.set_datasets(&[("cn.rdf", sample_path().display().to_string())]);

    let output = env
        .with_key()
        .args(["--format", "json", "init", "--reload", "--api-key", API_KEY])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(report["saved_datasets"][0]["name"], "cn.rdf");
    assert_eq!(report["failed_datasets"].as_array().unwrap().len(), 0);
    assert!(report["completed_at"].is_string());
}

#[test]
fn test_schemes_and_scheme() {
    let env = Env::loaded();

    let schemes = env.json(&["schemes"]);
    assert_eq!(schemes[0]["iri"], SCHEME_IRI);
    assert_eq!(schemes[0]["notation"], "CN 2024");
    assert_eq!(schemes[0]["prefLabel"], "Combined Nomenclature, 2024 (CN 2024)");

    let scheme = env.json(&["--lang", "mt", "scheme", SCHEME_IRI]);
    assert_eq!(scheme["prefLabel"], "Nomenklatura Magħquda, 2024 (NM 2024)");
    assert_eq!(scheme["collections"].as_array().unwrap().len(), 2);
    assert_eq!(scheme["concepts"].as_array().unwrap().len(), 2);

    env.cmd()
        .arg("schemes")
        .assert()
        .success()
        .stdout(predicate::str::contains(SCHEME_IRI));
}

#[test]
fn test_collections_and_concepts_of_scheme() {
    let env = Env::loaded();

    let collections = env.json(&["collections", SCHEME_IRI]);
    assert_eq!(collections[0]["iri"], COLLECTION1_IRI);

    let concepts = env.json(&["concepts", SCHEME_IRI]);
    let iris: Vec<&str> = concepts
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["iri"].as_str().unwrap())
        .collect();
    assert_eq!(iris, vec![CONCEPT2_IRI, CONCEPT1_IRI]);
}

#[test]
fn test_collection_members() {
    let env = Env::loaded();

    let collection = env.json(&["collection", COLLECTION1_IRI]);
    assert_eq!(collection["prefLabel"], "Collection1PrefLabel");
    assert_eq!(collection["concepts"][0]["iri"], CONCEPT1_IRI);
    assert_eq!(collection["collections"][0]["iri"], "https://example.org/collection2");
}

#[test]
fn test_concept_details() {
    let env = Env::loaded();

    let concept = env.json(&["--lang", "fr", "concept", CONCEPT1_IRI]);
    assert_eq!(concept["identifier"], "020321000080");
    assert_eq!(concept["scopeNote"], "Carcasses ou demi-carcasses, de porcins, congelées");
    // No French labels, so English is used
    assert_eq!(concept["prefLabel"], "0203 21 -- Carcases and half-carcases");
    assert_eq!(concept["concept_schemes"][0], SCHEME_IRI);
    assert_eq!(concept["relations"][0]["type"], "broader");
    assert_eq!(concept["relations"][0]["target_concept_iri"], CONCEPT2_IRI);
}

#[test]
fn test_search() {
    let env = Env::loaded();

    let results = env.json(&["--lang", "fr", "search", "Frozen swine"]);
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["iri"], CONCEPT2_IRI);

    env.cmd()
        .args(["search", "no such label"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No concepts match"));
}

#[test]
fn test_unknown_concept_fails() {
    let env = Env::loaded();
    env.cmd()
        .args(["concept", "unknown-iri"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concept unknown-iri not found."))
        .stderr(predicate::str::contains("E001"));
}

#[test]
fn test_empty_database_lists_nothing() {
    Env::new()
        .cmd()
        .arg("schemes")
        .assert()
        .success()
        .stdout(predicate::str::contains("No concept schemes found."));
}

#[test]
fn test_doctor() {
    let env = Env::loaded();
    env.with_key()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Database: Connected"))
        .stdout(predicate::str::contains("Concepts: 2"))
        .stdout(predicate::str::contains("All checks passed!"));
}
