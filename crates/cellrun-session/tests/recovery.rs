//! Session tests against a real interpreter process.
//!
//! `sh` stands in for the interpreter, wrapped in a read-eval loop that
//! prints a synthetic ready prompt. The framing is identical to what the
//! cling kernel sees.

use cellrun_common::ExecutionStatus;
use cellrun_kernel::{Kernel, KernelFactory, KernelState, ReplKernel, ReplSpec};
use cellrun_session::Session;
use std::sync::Arc;
use std::time::Duration;

fn sh_factory() -> KernelFactory {
    Arc::new(|| {
        let spec = ReplSpec::new("sh", "ready>").arg("-c").arg(
            "echo 'ready>'; while IFS= read -r line; do eval \"$line\"; echo 'ready>'; done",
        );
        Box::new(ReplKernel::new(spec)) as Box<dyn Kernel>
    })
}

#[tokio::test]
async fn test_state_persists_across_cells() {
    let mut session = Session::new(sh_factory()).await.unwrap();

    let bound = Duration::from_secs(5);
    let first = session.run_cell_bounded("x=10", bound).await;
    assert_eq!(first.status, ExecutionStatus::Ok);
    assert_eq!(first.execution_count, 1);

    session.run_cell_bounded("x=$((x + 5))", bound).await;

    let third = session.run_cell_bounded("echo $x", bound).await;
    assert_eq!(third.status, ExecutionStatus::Ok);
    assert_eq!(third.stdout.trim(), "15");
    assert_eq!(third.execution_count, 3);
}

#[tokio::test]
async fn test_timed_out_kernel_is_replaced_and_session_stays_usable() {
    let mut session = Session::new(sh_factory()).await.unwrap();

    let bound = Duration::from_secs(5);
    let first = session.run_cell_bounded("y=7", bound).await;
    assert_eq!(first.status, ExecutionStatus::Ok);

    // The redirects keep the pipe unheld by `sleep`, so the replaced
    // interpreter's EOF is observed promptly.
    let hung = session
        .run_cell_bounded("sleep 5 >/dev/null 2>&1", Duration::from_millis(300))
        .await;
    assert_eq!(hung.status, ExecutionStatus::Timeout);
    assert_eq!(hung.execution_count, 2);

    // A fresh kernel took over; the count survived the replacement.
    let after = session.run_cell_bounded("echo recovered", bound).await;
    assert_eq!(after.status, ExecutionStatus::Ok);
    assert_eq!(after.stdout.trim(), "recovered");
    assert_eq!(after.execution_count, 3);
    assert_eq!(session.kernel_state(), KernelState::Running);
}

#[tokio::test]
async fn test_reset_drops_interpreter_state() {
    let mut session = Session::new(sh_factory()).await.unwrap();
    let bound = Duration::from_secs(5);

    session.run_cell_bounded("z=99", bound).await;
    session.reset().await.unwrap();
    assert_eq!(session.execution_count(), 0);

    // The variable is gone in the fresh interpreter.
    let result = session.run_cell_bounded("echo \"z=$z\"", bound).await;
    assert_eq!(result.status, ExecutionStatus::Ok);
    assert_eq!(result.stdout.trim(), "z=");
    assert_eq!(result.execution_count, 1);
}
