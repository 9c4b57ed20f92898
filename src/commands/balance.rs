//! Balance command handler.

use thread_balancer::{
    format_json, format_table, log_host_environment, BalanceArgs, Balancer, OutputFormat, PinMap,
    ProcessTable, SystemProcessTable,
};

/// Balance against `table` and render the report.
///
/// Returns `None` when the pin file cannot be loaded; the error is printed
/// and the run ends without touching any thread.
pub fn balance_with<T: ProcessTable + ?Sized>(
    table: &T,
    args: &BalanceArgs,
) -> anyhow::Result<Option<String>> {
    let pins = match PinMap::from_file(&args.pinfile) {
        Ok(pins) => pins,
        Err(e) => {
            println!("{e}");
            return Ok(None);
        }
    };
    tracing::info!(
        "Loaded pin file {:?} ({} apps)",
        args.pinfile,
        pins.apps().count()
    );

    let report = Balancer::new(table, &pins).run(&args.process);
    let rendered = match args.output_format {
        OutputFormat::Table => format_table(&report),
        OutputFormat::Json => format_json(&report)?,
    };
    Ok(Some(rendered))
}

/// Run the balance command against the live process table.
pub fn run_balance(args: BalanceArgs) -> anyhow::Result<()> {
    log_host_environment();

    let table = SystemProcessTable::new();
    if let Some(rendered) = balance_with(&table, &args)? {
        println!("{rendered}");
    }
    Ok(())
}
