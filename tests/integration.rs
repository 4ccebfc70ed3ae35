use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pf");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_with_index(r#"backend = "memory""#)
}

fn setup_with_index(index_section: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(
        root.join("org.csv"),
        "id,parentId,name,imageUrl,title,department\n\
         1,,Ada Lovelace,,CEO,Executive\n\
         2,1,Grace Hopper,,CTO,Engineering\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[profiles]
path = "{root}/data/profiles.csv"

[org_chart]
path = "{root}/org.csv"

[index]
{index_section}

[embedding]
provider = "hash"
dims = 128

[reasoning]
provider = "disabled"

[retrieval]
top_k = 5

[server]
bind = "127.0.0.1:7860"
"#,
        root = root.display(),
        index_section = index_section.replace("{root}", &root.display().to_string()),
    );

    let config_path = config_dir.join("pf.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_upsert_creates_profile_and_csv() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pf(
        &config_path,
        &[
            "profile", "upsert", "--email", "Jane@X.com", "--name", "Jane Doe", "--skills",
            "Go, Kubernetes",
        ],
    );
    assert!(success, "upsert failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("New profile added for Jane Doe (jane@x.com)"));

    let csv = fs::read_to_string(tmp.path().join("data/profiles.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("name,email,job_title,department,team,skills,experience")
    );
    assert!(lines.next().unwrap().contains("jane@x.com"));
}

#[test]
fn test_update_keeps_unspecified_fields() {
    let (_tmp, config_path) = setup_test_env();

    run_pf(
        &config_path,
        &["profile", "upsert", "--email", "jane@x.com", "--name", "Jane Doe", "--skills", "Go"],
    );
    let (stdout, _, success) = run_pf(
        &config_path,
        &["profile", "upsert", "--email", "jane@x.com", "--team", "Infra"],
    );
    assert!(success);
    assert!(stdout.contains("Profile updated for Jane Doe (jane@x.com)"));

    let (stdout, _, success) = run_pf(&config_path, &["profile", "list"]);
    assert!(success);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["skills"], "Go");
    assert_eq!(rows[0]["team"], "Infra");
}

#[test]
fn test_new_profile_without_name_fails() {
    let (tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_pf(
        &config_path,
        &["profile", "upsert", "--email", "nobody@x.com", "--skills", "Go"],
    );
    assert!(!success);
    assert!(stderr.contains("Name is required for new profiles"));

    let csv = fs::read_to_string(tmp.path().join("data/profiles.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1, "only the header should be present");
}

#[test]
fn test_count_and_indexed_list() {
    let (_tmp, config_path) = setup_test_env();

    for (email, name) in [("a@x.com", "Ann"), ("b@x.com", "Bob")] {
        let (_, stderr, success) = run_pf(
            &config_path,
            &["profile", "upsert", "--email", email, "--name", name],
        );
        assert!(success, "upsert failed: {}", stderr);
    }

    // Every process rebuilds the in-memory index from the CSV.
    let (stdout, _, success) = run_pf(&config_path, &["profile", "count"]);
    assert!(success);
    assert_eq!(stdout.trim(), "2");

    let (stdout, _, success) = run_pf(&config_path, &["profile", "list", "--indexed"]);
    assert!(success);
    let docs: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(docs[0]["id"], "a@x.com");
    assert_eq!(docs[1]["metadata"]["name"], "Bob");
}

#[test]
fn test_sqlite_index_reindex() {
    let (_tmp, config_path) =
        setup_with_index("backend = \"sqlite\"\npath = \"{root}/data/index.sqlite\"");

    let (_, stderr, success) = run_pf(
        &config_path,
        &["profile", "upsert", "--email", "a@x.com", "--name", "Ann"],
    );
    assert!(success, "upsert failed: {}", stderr);

    let (stdout, stderr, success) = run_pf(&config_path, &["reindex"]);
    assert!(success, "reindex failed: {}", stderr);
    assert!(stdout.contains("Indexed 1 profiles."));

    let (stdout, _, _) = run_pf(&config_path, &["profile", "count"]);
    assert_eq!(stdout.trim(), "1");
}

#[test]
fn test_search_requires_reasoning_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_pf(
        &config_path,
        &["profile", "upsert", "--email", "a@x.com", "--name", "Ann", "--skills", "Rust"],
    );
    let (_, stderr, success) = run_pf(&config_path, &["search", "rust developer"]);
    assert!(!success);
    assert!(
        stderr.contains("reasoning"),
        "expected reasoning error, got: {}",
        stderr
    );
}

#[test]
fn test_search_empty_index_succeeds_without_reasoner() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pf(&config_path, &["search", "rust developer"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("No matching people found."));
}

#[test]
fn test_search_rejects_zero_top_k() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_pf(&config_path, &["search", "rust", "--top-k", "0"]);
    assert!(!success);
    assert!(stderr.contains("top_k must be >= 1"));
}

#[test]
fn test_org_prints_json_with_null_parent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pf(&config_path, &["org"]);
    assert!(success, "org failed: {}", stderr);
    let nodes: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(nodes[0]["name"], "Ada Lovelace");
    assert!(nodes[0]["parentId"].is_null());
    assert_eq!(nodes[1]["parentId"], "1");
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path).unwrap();
    fs::write(&config_path, content.replace("top_k = 5", "top_k = 0")).unwrap();

    let (_, stderr, success) = run_pf(&config_path, &["profile", "list"]);
    assert!(!success);
    assert!(stderr.contains("retrieval.top_k must be >= 1"));
}

#[test]
fn test_missing_config_reports_path() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_pf(&missing, &["profile", "list"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
