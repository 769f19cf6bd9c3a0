use std::ffi::OsStr;

use tokio::process::Command;

/// Command whose child is killed when the awaiting future is dropped.
///
/// The per-video timeout drops the in-flight `output()` future; without
/// kill-on-drop the child would keep running detached and could keep writing
/// into the dataset tree after the video was already recorded as failed.
pub(crate) fn command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.kill_on_drop(true);
    cmd
}
