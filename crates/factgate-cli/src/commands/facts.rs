//! Facts command implementation.

use crate::cli::FactsArgs;
use crate::error::Result;
use crate::output::Formatter;
use factgate_store::FactStore;
use std::fs;

/// Execute the facts command.
pub fn execute_facts(args: FactsArgs, formatter: &Formatter) -> Result<()> {
    let snapshot = fs::read_to_string(&args.snapshot)?;
    let store = FactStore::from_json_str(&snapshot)?;
    println!("{}", formatter.format_facts(&store)?);
    Ok(())
}
