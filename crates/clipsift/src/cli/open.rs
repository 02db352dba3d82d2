//! Open a file in the platform's default viewer.

use std::path::Path;
use std::process::{Command, Stdio};

/// Open `path` with the system's default application and return at once.
pub fn open_in_viewer(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("{} no longer exists", path.display());
    }

    let mut command = viewer_command(path);
    tracing::debug!("Opening {:?} with {:?}", path, command.get_program());

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("Cannot open {}: {e}", path.display()))?;
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}
