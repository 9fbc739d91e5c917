use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Variables the config overlay reads; cleared so the host cannot leak in.
const OVERLAY_VARS: &[&str] = &[
    "GITHUB_USERNAME",
    "GITHUB_TOKEN",
    "MY_NAME",
    "MY_LINKEDIN_URL",
    "MY_RESUME_URL",
    "MY_CALENDLY_LINK",
    "MY_PROFILE_PIC_URL",
    "PORTFOLIO_TOPIC",
    "GOOGLE_API_KEY",
    "OPENAI_API_KEY",
];

fn folio_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("folio");
    path
}

/// Config whose GitHub API points at a closed port, so discovery always
/// fails and the loader falls back to the clone directory.
fn setup_test_env(owner: Option<&str>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let cached = root.join("repos").join("alpha");
    fs::create_dir_all(&cached).unwrap();
    fs::write(
        cached.join("README.md"),
        "# Alpha\n\nA compiler written in Rust.",
    )
    .unwrap();

    let owner_line = owner
        .map(|o| format!("github_username = \"{}\"", o))
        .unwrap_or_default();
    let config_content = format!(
        r#"[owner]
name = "Dana"
{owner_line}

[corpus]
clone_dir = "{root}/repos"
github_api_url = "http://127.0.0.1:9"
timeout_secs = 2

[retrieval]
top_k = 3

[embedding]
provider = "disabled"
"#,
        owner_line = owner_line,
        root = root.display()
    );

    let config_path = root.join("folio.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn run_folio(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = folio_binary();
    let mut cmd = Command::new(&binary);
    cmd.current_dir(config_path.parent().unwrap())
        .arg("--config")
        .arg(config_path)
        .arg("--progress")
        .arg("off")
        .args(args);
    for var in OVERLAY_VARS {
        cmd.env_remove(var);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run folio binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_tools_lists_every_tool() {
    let (_tmp, config) = setup_test_env(Some("dana"));
    let (stdout, stderr, success) = run_folio(&config, &["tools"]);
    assert!(success, "tools failed: {}", stderr);

    for name in [
        "get_personal_info",
        "get_scheduling_link",
        "get_linkedin_link",
        "get_resume_link",
        "get_all_project_contexts",
        "project_retriever",
    ] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
    assert!(stdout.contains("unavailable: embeddings disabled"));
    assert!(stdout.contains("top_k = 3"));
}

#[test]
fn test_sync_falls_back_to_cache() {
    let (tmp, config) = setup_test_env(Some("dana"));
    let (stdout, stderr, success) = run_folio(&config, &["sync"]);
    assert!(success, "sync failed: {}", stderr);

    assert!(stdout.contains("alpha"));
    assert!(stdout.contains(&tmp.path().join("repos").join("alpha").display().to_string()));
    assert!(stdout.contains("documents:   1"));
    assert!(stdout.contains("fingerprint: "));
}

#[test]
fn test_sync_is_repeatable() {
    let (_tmp, config) = setup_test_env(Some("dana"));
    let (first, _, ok1) = run_folio(&config, &["sync"]);
    let (second, _, ok2) = run_folio(&config, &["sync"]);
    assert!(ok1 && ok2);

    let fingerprint = |out: &str| {
        out.lines()
            .find(|l| l.starts_with("fingerprint:"))
            .map(str::to_string)
    };
    assert!(fingerprint(&first).is_some());
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn test_sync_requires_owner() {
    let (_tmp, config) = setup_test_env(None);
    let (_, stderr, success) = run_folio(&config, &["sync"]);
    assert!(!success);
    assert!(stderr.contains("github_username"), "stderr: {}", stderr);
}

#[test]
fn test_ask_requires_api_key() {
    let (_tmp, config) = setup_test_env(Some("dana"));
    let (_, stderr, success) = run_folio(&config, &["ask", "What's your LinkedIn?"]);
    assert!(!success);
    assert!(stderr.contains("GOOGLE_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn test_search_rejects_zero_k() {
    let (_tmp, config) = setup_test_env(Some("dana"));
    let (_, stderr, success) = run_folio(&config, &["search", "compiler", "-k", "0"]);
    assert!(!success);
    assert!(stderr.contains("k must be at least 1"), "stderr: {}", stderr);
}

#[test]
fn test_search_requires_embeddings() {
    let (_tmp, config) = setup_test_env(Some("dana"));
    let (_, stderr, success) = run_folio(&config, &["search", "compiler"]);
    assert!(!success);
    assert!(stderr.contains("search requires embeddings"), "stderr: {}", stderr);
}
