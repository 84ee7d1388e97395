//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// Prints the effective configuration as TOML, or writes it to `target`
/// (the default config path when none is given).
pub fn execute_config(args: ConfigArgs, config: &Config, target: Option<&Path>, formatter: &Formatter) -> Result<()> {
    let mut config = config.clone();
    if let Some(preset) = args.preset {
        config.engine = preset.into();
    }

    if args.write {
        let path = match target {
            Some(path) => path.to_path_buf(),
            None => Config::path()?,
        };
        config.save_to(&path)?;
        println!("{}", formatter.success(&format!("Configuration written to {}", path.display())));
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
