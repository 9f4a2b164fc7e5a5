use std::net::TcpListener;
use std::process::Output;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

const REQUIRED_VARS: [&str; 4] = ["QB_HOST", "QB_USERNAME", "QB_PASSWORD", "GGN_API_KEY"];

/// Find a port nothing listens on
fn get_unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Command for the binary in an empty directory with no inherited config
fn catsync(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_catsync"));
    cmd.current_dir(workdir.path())
        .env_remove("CATSYNC_CONFIG")
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1")
        .kill_on_drop(true);
    for var in REQUIRED_VARS {
        cmd.env_remove(var);
    }
    cmd
}

async fn run(mut cmd: Command) -> Output {
    timeout(Duration::from_secs(30), cmd.output())
        .await
        .expect("catsync did not exit")
        .expect("Failed to run catsync")
}

#[tokio::test]
async fn test_missing_variables_exit_with_error() {
    let workdir = TempDir::new().unwrap();
    let mut cmd = catsync(&workdir);
    cmd.env("QB_USERNAME", "admin");

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("QB_HOST"), "stderr: {}", stderr);
    assert!(stderr.contains("QB_PASSWORD"), "stderr: {}", stderr);
    assert!(stderr.contains("GGN_API_KEY"), "stderr: {}", stderr);
    assert!(!stderr.contains("QB_USERNAME"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_explicit_config_file_must_exist() {
    let workdir = TempDir::new().unwrap();
    let mut cmd = catsync(&workdir);
    cmd.env("CATSYNC_CONFIG", workdir.path().join("missing.toml"))
        .env("QB_HOST", "http://127.0.0.1:8080")
        .env("QB_USERNAME", "admin")
        .env("QB_PASSWORD", "secret")
        .env("GGN_API_KEY", "key");

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.toml"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_variables_from_dotenv_file() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(
        workdir.path().join(".env"),
        "QB_HOST=not-a-url\nQB_USERNAME=admin\nQB_PASSWORD=secret\nGGN_API_KEY=key\n",
    )
    .unwrap();

    let output = run(catsync(&workdir)).await;

    // All variables found, so validation gets as far as the URL check
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Missing required"), "stderr: {}", stderr);
    assert!(stderr.contains("QB_HOST"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_unreachable_client_exits_with_error() {
    let workdir = TempDir::new().unwrap();
    let port = get_unused_port();
    let mut cmd = catsync(&workdir);
    cmd.env("QB_HOST", format!("http://127.0.0.1:{}", port))
        .env("QB_USERNAME", "admin")
        .env("QB_PASSWORD", "secret")
        .env("GGN_API_KEY", "key");

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("authentication failed"), "stderr: {}", stderr);
}
