//! The `clipsift models` command for managing the CLIP model files.

use clap::{Args, Subcommand};
use clipsift_core::backend::{
    ClipLoader, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME, VISION_MODEL_FILENAME,
};
use clipsift_core::Config;
use std::path::Path;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP vision encoder, text encoder and tokenizer
    Download {
        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// Hugging Face repository with ONNX exports of CLIP ViT-B/32.
const CLIP_REPO: &str = "Xenova/clip-vit-base-patch32";

/// (remote path in the repo, local filename)
const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/vision_model.onnx", VISION_MODEL_FILENAME),
    ("onnx/text_model.onnx", TEXT_MODEL_FILENAME),
    ("tokenizer.json", TOKENIZER_FILENAME),
];

/// Status of each model file on disk.
pub struct InstalledModel {
    pub vision: bool,
    pub text: bool,
    pub tokenizer: bool,
}

impl InstalledModel {
    /// Returns true if everything needed for classification is present.
    pub fn can_classify(&self) -> bool {
        self.vision && self.text && self.tokenizer
    }
}

/// Check which files of the configured model are installed.
pub fn check_installed(config: &Config) -> InstalledModel {
    let model_path = config.model_path();
    InstalledModel {
        vision: model_path.join(VISION_MODEL_FILENAME).exists(),
        text: model_path.join(TEXT_MODEL_FILENAME).exists(),
        tokenizer: model_path.join(TOKENIZER_FILENAME).exists(),
    }
}

/// Download any missing model files into `{model_dir}/{model.name}/`.
pub async fn download_model(
    config: &Config,
    client: &reqwest::Client,
    force: bool,
) -> anyhow::Result<()> {
    let model_path = config.model_path();
    std::fs::create_dir_all(&model_path)?;

    for (remote, local) in MODEL_FILES {
        let dest = model_path.join(local);

        if dest.exists() && !force {
            tracing::info!("{} already exists at {:?}", local, dest);
            continue;
        }

        let url = format!("https://huggingface.co/{CLIP_REPO}/resolve/main/{remote}");
        tracing::info!("Downloading {}...", local);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            local,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        ModelsCommand::Download { force } => {
            println!("Downloading CLIP ViT-B/32 ({CLIP_REPO}):");
            println!("  vision encoder, text encoder and tokenizer (~600MB, fp32)\n");

            let client = reqwest::Client::new();
            download_model(&config, &client, force).await?;

            tracing::info!("All downloads complete.");
            println!("Model ready at: {}", config.model_path().display());
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `clipsift models download` to download the CLIP model.");
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            let mut names: Vec<String> = std::fs::read_dir(&model_dir)?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            if !names.contains(&config.model.name) {
                names.push(config.model.name.clone());
            }
            names.sort();

            for name in names {
                let path = model_dir.join(&name);
                let default_marker = if name == config.model.name {
                    "  (configured)"
                } else {
                    ""
                };
                println!("  {}{}", name, default_marker);
                print_file_status(&path);
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

fn print_file_status(model_path: &Path) {
    for file in ClipLoader::model_files(model_path) {
        let status = if file.exists() {
            "ready"
        } else {
            "not installed"
        };
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("    - {:30} {}", name, status);
    }
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Bytes go to a `.part` file that is renamed into place only once the
/// stream has ended with the advertised length, so an interrupted download
/// never looks installed.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);

    finish_download(&partial, dest, downloaded, total_size)
}

fn partial_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Move a completed `.part` file into place, or remove it on a short read.
fn finish_download(
    partial: &Path,
    dest: &Path,
    downloaded: u64,
    expected: Option<u64>,
) -> anyhow::Result<()> {
    if let Some(expected) = expected {
        if downloaded != expected {
            let _ = std::fs::remove_file(partial);
            anyhow::bail!(
                "Incomplete download for {}: got {} of {} bytes.\n\
                 Partial file removed, try downloading again.",
                dest.display(),
                downloaded,
                expected
            );
        }
    }

    std::fs::rename(partial, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_appends_suffix() {
        let dest = Path::new("/models/clip/vision_model.onnx");
        assert_eq!(
            partial_path(dest),
            Path::new("/models/clip/vision_model.onnx.part")
        );
    }

    #[test]
    fn test_finish_download_moves_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tokenizer.json");
        let partial = partial_path(&dest);
        std::fs::write(&partial, b"{}").unwrap();

        finish_download(&partial, &dest, 2, Some(2)).unwrap();

        assert!(dest.exists());
        assert!(!partial.exists());
    }

    #[test]
    fn test_finish_download_short_read_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("text_model.onnx");
        let partial = partial_path(&dest);
        std::fs::write(&partial, b"abc").unwrap();

        let err = finish_download(&partial, &dest, 3, Some(10)).unwrap_err();

        assert!(err.to_string().contains("Incomplete download"));
        assert!(!partial.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn test_check_installed_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();

        let installed = check_installed(&config);
        assert!(!installed.can_classify());

        let model_path = config.model_path();
        std::fs::create_dir_all(&model_path).unwrap();
        for (_, local) in MODEL_FILES {
            std::fs::write(model_path.join(local), b"").unwrap();
        }
        assert!(check_installed(&config).can_classify());
    }
}
