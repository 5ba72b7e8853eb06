//! End-to-end executor tests against a local Docker daemon.
//!
//! These need the per-language sandbox images (`cellrun-c:latest`,
//! `cellrun-cpp:latest`, gcc/g++ on PATH inside) built locally.
//! Run with `cargo test -p cellrun-executor -- --ignored`.

use cellrun_common::{ExecutionRequest, ExecutionStatus, Language};
use cellrun_executor::{DockerRuntime, Executor, COMPILE_FAILURE_EXIT};

fn executor() -> Executor<DockerRuntime> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let runtime = DockerRuntime::connect().expect("docker daemon should be reachable");
    Executor::new(runtime)
}

#[tokio::test]
#[ignore = "requires Docker daemon and cellrun sandbox images"]
async fn test_compiles_and_runs_c() {
    let executor = executor();
    let code = r#"
        #include <stdio.h>
        int main(void) { printf("hello from the sandbox\n"); return 0; }
    "#;

    let result = executor
        .execute(&ExecutionRequest::new(code, Language::C))
        .await;

    assert_eq!(result.status, ExecutionStatus::Ok, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("hello from the sandbox"));
    assert_eq!(result.exit_code, 0);
    assert!(executor.manager().active().await.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker daemon and cellrun sandbox images"]
async fn test_stdin_is_piped_to_the_program() {
    let executor = executor();
    let code = r#"
        #include <iostream>
        int main() { int n; std::cin >> n; std::cout << n * 2 << std::endl; }
    "#;

    let result = executor
        .execute(&ExecutionRequest::new(code, Language::Cpp).with_stdin("21"))
        .await;

    assert_eq!(result.status, ExecutionStatus::Ok, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("42"));
}

#[tokio::test]
#[ignore = "requires Docker daemon and cellrun sandbox images"]
async fn test_compile_error_reports_diagnostics() {
    let executor = executor();

    let result = executor
        .execute(&ExecutionRequest::new("int main() {", Language::C))
        .await;

    assert_eq!(result.status, ExecutionStatus::Error);
    assert_eq!(result.exit_code, COMPILE_FAILURE_EXIT);
    assert!(result.stderr.contains("error"));
    assert!(executor.manager().active().await.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker daemon and cellrun sandbox images"]
async fn test_infinite_loop_is_killed_and_torn_down() {
    let executor = executor();
    let code = "int main(void) { for (;;) {} }";

    let result = executor
        .execute(&ExecutionRequest::new(code, Language::C).with_timeout(2))
        .await;

    assert_eq!(result.status, ExecutionStatus::Timeout);
    assert_eq!(result.exit_code, -1);
    assert!(executor.manager().active().await.is_empty());
}
