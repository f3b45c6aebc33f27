// domain-hunter/tests/cli_integration.rs

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

/// A command isolated from the user's config files and `DH_*` environment.
fn hunter_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("domain-hunter").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("RUST_LOG");
    for var in [
        "DH_HTTP_TIMEOUT",
        "DH_DNS_TIMEOUT",
        "DH_PACING_MS",
        "DH_CACHE_TTL_HOURS",
        "DH_CACHE_FILE",
        "DH_WHOIS_FALLBACK",
        "DH_WHOIS_API_KEY",
        "DH_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write a cache file with a fresh taken domain, one expiring soon and one
/// available domain.
fn seed_cache(dir: &TempDir) -> std::path::PathBuf {
    let now = Utc::now();
    let records = json!({
        "records": {
            "soon.com": {
                "domain": "soon.com",
                "available": false,
                "hasDNS": true,
                "expirationDate": (now + Duration::days(10)).to_rfc3339(),
                "daysLeft": 10,
                "registrar": "Soon Registrar",
                "method": "rdap",
                "lastChecked": now.to_rfc3339()
            },
            "later.org": {
                "domain": "later.org",
                "available": false,
                "hasDNS": true,
                "expirationDate": (now + Duration::days(200)).to_rfc3339(),
                "daysLeft": 200,
                "registrar": "Later Registrar",
                "method": "whois",
                "lastChecked": now.to_rfc3339()
            },
            "free.net": {
                "domain": "free.net",
                "available": true,
                "hasDNS": false,
                "method": "dns",
                "lastChecked": now.to_rfc3339()
            }
        }
    });

    let path = dir.path().join("cache.json");
    fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();
    path
}

#[test]
fn test_help_lists_reports() {
    let dir = TempDir::new().unwrap();
    hunter_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--expiring"))
        .stdout(predicate::str::contains("--stats"))
        .stdout(predicate::str::contains("--no-whois"));
}

#[test]
fn test_no_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    hunter_cmd(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("You must specify domain names"));
}

#[test]
fn test_json_and_csv_conflict() {
    let dir = TempDir::new().unwrap();
    hunter_cmd(&dir)
        .args(["example.com", "--json", "--csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("multiple output formats"));
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    hunter_cmd(&dir)
        .args(["--file", "nope.txt", "--no-whois"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_stats_json_from_cache_file() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);

    let output = hunter_cmd(&dir)
        .args(["--stats", "--json", "--cache-file"])
        .arg(&cache)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["available"], 1);
    assert_eq!(stats["taken"], 2);
    assert_eq!(stats["unknown"], 0);
    assert_eq!(stats["expiring30"], 1);
    assert_eq!(stats["stale"], 0);
    assert_eq!(stats["premium"], 0);
}

#[test]
fn test_expiring_report() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);

    hunter_cmd(&dir)
        .args(["--expiring", "30", "--cache-file"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("soon.com"))
        .stdout(predicate::str::contains("later.org").not());
}

#[test]
fn test_list_csv() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);

    hunter_cmd(&dir)
        .args(["--list", "--csv", "--cache-file"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "domain,available,hasDNS,expirationDate,daysLeft,registrar,method,lastChecked",
        ))
        .stdout(predicate::str::contains("free.net,true,false,,,,dns,"));
}

#[test]
fn test_fresh_cache_answers_lookup() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);

    let output = hunter_cmd(&dir)
        .args(["SOON.com", "--json", "--cache-file"])
        .arg(&cache)
        .output()
        .unwrap();
    assert!(output.status.success());

    let bulk: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bulk["total"], 1);
    assert_eq!(bulk["results"][0]["domain"], "soon.com");
    assert_eq!(bulk["results"][0]["registrar"], "Soon Registrar");
    assert_eq!(bulk["results"][0]["method"], "rdap");
}

#[test]
fn test_forget_and_clear_cache() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);

    hunter_cmd(&dir)
        .args(["--forget", "soon.com", "--cache-file"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
    assert!(saved["records"].get("soon.com").is_none());
    assert!(saved["records"].get("later.org").is_some());

    hunter_cmd(&dir)
        .args(["--clear-cache", "--cache-file"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 cached domain(s)"));
}

#[test]
fn test_export_then_import_restores_cache() {
    let dir = TempDir::new().unwrap();
    let cache = seed_cache(&dir);
    let export = dir.path().join("backup.json");

    hunter_cmd(&dir)
        .args(["--export"])
        .arg(&export)
        .arg("--cache-file")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported cache"));

    hunter_cmd(&dir)
        .args(["--clear-cache", "--cache-file"])
        .arg(&cache)
        .assert()
        .success();

    let fresh = dir.path().join("restored.json");
    hunter_cmd(&dir)
        .args(["--import"])
        .arg(&export)
        .arg("--cache-file")
        .arg(&fresh)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 domain(s)"));

    let restored: Value = serde_json::from_str(&fs::read_to_string(&fresh).unwrap()).unwrap();
    assert_eq!(restored["records"]["later.org"]["registrar"], "Later Registrar");
    assert_eq!(restored["records"].as_object().unwrap().len(), 3);
}

#[test]
fn test_import_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "[]").unwrap();

    hunter_cmd(&dir)
        .args(["--import"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import document is not valid"));
}

#[test]
fn test_corrupt_cache_file_fails() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("cache.json");
    fs::write(&cache, "{ not json").unwrap();

    hunter_cmd(&dir)
        .args(["--stats", "--cache-file"])
        .arg(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[defaults]\nhttp_timeout = \"forever\"\n").unwrap();

    hunter_cmd(&dir)
        .args(["--stats", "--config"])
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_list_tlds_json() {
    let dir = TempDir::new().unwrap();
    let output = hunter_cmd(&dir)
        .args(["--list-tlds", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let tlds: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(tlds.contains(&"com".to_string()));
}
