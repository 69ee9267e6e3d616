//! `wallet-reader init`: write a default TOML configuration file.

use std::fs;
use std::path::Path;

use wallet_reader::config::generate_default_config;
use wallet_reader::error::Error;

/// Execute the `init` command.
///
/// Refuses to overwrite an existing file unless `force` is `true`. Missing
/// parent directories are created.
///
/// # Errors
///
/// Returns an error if the file already exists (without `--force`) or if
/// creating the directory or writing fails.
#[allow(clippy::print_stderr)]
pub fn run(output: &Path, force: bool) -> Result<(), Error> {
    write_config(output, force)?;
    eprintln!("Config file written to {}", output.display());
    eprintln!("Set rpc_url, then run `wallet-reader --config {} status`.", output.display());
    Ok(())
}

fn write_config(output: &Path, force: bool) -> Result<(), Error> {
    if output.exists() && !force {
        return Err(Error::config(format!(
            "'{}' already exists, use --force to overwrite",
            output.display()
        )));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::config_with(format!("failed to create '{}'", parent.display()), e)
        })?;
    }

    fs::write(output, generate_default_config())
        .map_err(|e| Error::config_with(format!("failed to write '{}'", output.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_reader::config::load_config;

    #[test]
    fn writes_into_missing_directory_and_refuses_overwrite() {
        let root = std::env::temp_dir().join(format!("wallet-reader-init-{}", std::process::id()));
        let output = root.join("nested").join("wallet-reader.toml");

        write_config(&output, false).expect("first write");
        let written = load_config(&output).expect("template loads");
        assert_eq!(written.poll_interval_secs, 4);

        assert!(matches!(write_config(&output, false), Err(Error::Config(_))));
        write_config(&output, true).expect("forced overwrite");

        fs::remove_dir_all(&root).ok();
    }
}
