//! The `run` and `check` commands.
//!
//! `run` drives one waybill end to end: register lookup, manifest
//! transformation, persistence, document download, and pre-alert
//! dispatch. Waybills go strictly one at a time; each is fully saved
//! and dispatched before the next starts, so a halt mid-batch leaves
//! nothing half-sent.

use std::path::PathBuf;

use prefile_config::Settings;
use prefile_engine::waybill::find_in_register;
use prefile_engine::{run_station, Catalog, EngineError, Station, StationRun};
use prefile_grid::Dataset;
use prefile_io::store;

use crate::rate::RateClient;
use crate::{download, exit_codes, forecast, net, prealert, prompt, CliError};

struct RunContext<'a> {
    settings: &'a Settings,
    catalog: &'a Catalog,
    http: reqwest::blocking::Client,
    update: bool,
    dry_run: bool,
    quiet: bool,
    /// Exchange rate, fetched once on the first Belgrade waybill and
    /// reused for the rest of the batch.
    rate: Option<f64>,
}

pub(crate) fn cmd_run(
    awbs: Vec<String>,
    update: bool,
    dry_run: bool,
    keep_going: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = Settings::load().map_err(CliError::settings)?;
    settings.validate().map_err(CliError::settings)?;

    let awbs = if awbs.is_empty() {
        prompt::read_awbs()?
    } else {
        prompt::split_awb_list(&awbs.join(" "))
    };
    if awbs.is_empty() {
        return Err(CliError::usage("no waybill numbers given"));
    }

    let catalog = store::load_catalog(&settings.catalog_path)
        .map_err(|e| CliError::data(e).with_hint("check catalog_path in settings"))?;
    let mut registers = store::load_registers(&settings.register_paths)
        .map_err(|e| CliError::data(e).with_hint("check register_paths in settings"))?;

    let mut ctx = RunContext {
        settings: &settings,
        catalog: &catalog,
        http: net::client(),
        update,
        dry_run,
        quiet,
        rate: None,
    };

    let mut sent = 0usize;
    let mut held = Vec::new();
    for awb in &awbs {
        match process_waybill(&mut ctx, &mut registers, awb) {
            Ok(()) => sent += 1,
            Err(err) if err.code == exit_codes::EXIT_REVIEW && keep_going => {
                eprintln!("error: {}", err.message);
                if let Some(hint) = &err.hint {
                    eprintln!("hint:  {}", hint);
                }
                held.push(awb.clone());
            }
            Err(err) => return Err(err),
        }
    }

    if !held.is_empty() {
        return Err(CliError::review(format!(
            "{} manifest(s) held for classification review: {}",
            held.len(),
            held.join(", ")
        )));
    }
    if !quiet {
        if dry_run {
            eprintln!("{sent} manifest(s) transformed (dry-run)");
        } else {
            eprintln!("{sent} pre-alert(s) dispatched");
        }
    }
    Ok(())
}

fn process_waybill(
    ctx: &mut RunContext<'_>,
    registers: &mut [(Dataset, PathBuf)],
    awb: &str,
) -> Result<(), CliError> {
    // Waybills are split across registers by station; probe each in turn.
    let mut found = None;
    for (idx, (register, _)) in registers.iter().enumerate() {
        if let Some(record) =
            find_in_register(register, awb).map_err(|e| CliError::engine(&e))?
        {
            found = Some((idx, record));
            break;
        }
    }
    let (idx, record) = found.ok_or_else(|| {
        CliError::engine(&EngineError::WaybillNotFound {
            awb: awb.to_string(),
        })
    })?;
    let (register, register_path) = &mut registers[idx];

    let station: Station = record
        .arrival_station
        .parse()
        .map_err(|e| CliError::engine(&e))?;
    let profile = ctx
        .settings
        .profile_for(station.code(), station.default_profile());
    let shrink_cap = if station == Station::Beg {
        beg_shrink_cap(ctx)?
    } else {
        0.0
    };

    let manifest_path = ctx.settings.manifest_dir.join(format!("{awb}.xlsx"));
    let mut data = store::load_sheet(&manifest_path, None).map_err(|e| {
        CliError::data(e).with_hint(format!(
            "expected the flight manifest at {}",
            manifest_path.display()
        ))
    })?;

    let run = StationRun {
        station,
        profile,
        catalog: ctx.catalog,
        buyer_cap: ctx.settings.caps.buyer_cap,
        shrink_cap,
    };
    let report = match run_station(&run, &mut data, register, &record) {
        Ok(report) => report,
        Err(err @ EngineError::ClassificationReview { .. }) => {
            // The unmatched sentinels are already in the dataset; persist
            // them so the operator can finish the matching by hand.
            store::save_sheet(&manifest_path, &data).map_err(CliError::data)?;
            return Err(CliError::engine(&err).with_hint(format!(
                "manifest saved for manual matching: {}",
                manifest_path.display()
            )));
        }
        Err(err) => return Err(CliError::engine(&err)),
    };

    if !ctx.quiet {
        eprintln!(
            "{awb}: {} data rows transformed ({} pipeline)",
            report.data_rows,
            station.code()
        );
    }
    if report.fallback_applied {
        eprintln!(
            "warning: {awb}: {} unmatched description(s) classified by fallback",
            report.unmatched_rows
        );
    }

    match &report.package_view {
        Some(package) => store::save_with_package(&manifest_path, &data, package),
        None => store::save_sheet(&manifest_path, &data),
    }
    .map_err(CliError::data)?;

    if report.register_dirty && !ctx.dry_run {
        store::save_sheet(register_path, register).map_err(CliError::data)?;
    }

    let mut attachments = Vec::new();
    if ctx.dry_run {
        if station == Station::Lgg {
            forecast::write(&record, &ctx.settings.manifest_dir)?;
        }
        if !ctx.quiet {
            eprintln!("{awb}: dry-run, skipped download and pre-alert");
        }
        return Ok(());
    }

    attachments.push(download::download_document(
        &ctx.http,
        &record.download_url,
        &ctx.settings.manifest_dir,
        awb,
    )?);
    attachments.push(manifest_path.clone());
    if station == Station::Lgg {
        attachments.push(forecast::write(&record, &ctx.settings.manifest_dir)?);
    }

    let recipients = ctx
        .settings
        .recipients_for(station.code())
        .filter(|r| !r.to.is_empty() || !r.cc.is_empty())
        .ok_or_else(|| {
            CliError::config(format!(
                "no recipients configured for station {}",
                station.code()
            ))
            .with_hint(format!(
                "add a [recipients.{}] section to {}",
                station.code(),
                Settings::path().display()
            ))
        })?;
    let password = ctx.settings.smtp_password().map_err(CliError::settings)?;

    // The router may have rewritten the sorting cell this run; the mail
    // quotes the current value either way.
    let sorting = report
        .sorting_info
        .as_deref()
        .unwrap_or(&record.sorting_info);
    let mail = prealert::compose(station, &record, sorting, ctx.update);
    prealert::send(
        station,
        &mail,
        &attachments,
        recipients,
        &ctx.settings.smtp,
        &password,
    )?;
    if !ctx.quiet {
        eprintln!(
            "{awb}: pre-alert sent ({} to, {} cc)",
            recipients.to.len(),
            recipients.cc.len()
        );
    }
    Ok(())
}

/// Belgrade cap in dinars: configured unit price times the fetched rate.
fn beg_shrink_cap(ctx: &mut RunContext<'_>) -> Result<f64, CliError> {
    let rate = match ctx.rate {
        Some(rate) => rate,
        None => {
            let fetched = RateClient::new(&ctx.settings.rate_url).fetch()?;
            if !ctx.quiet {
                eprintln!("exchange rate: {fetched}");
            }
            ctx.rate = Some(fetched);
            fetched
        }
    };
    Ok(ctx.settings.caps.unit_price * rate)
}

pub(crate) fn cmd_check() -> Result<(), CliError> {
    let settings = Settings::load().map_err(CliError::settings)?;
    settings.validate().map_err(CliError::settings)?;

    let catalog = store::load_catalog(&settings.catalog_path)
        .map_err(|e| CliError::data(e).with_hint("check catalog_path in settings"))?;
    println!(
        "catalog: {} entries ({})",
        catalog.len(),
        settings.catalog_path.display()
    );

    let registers = store::load_registers(&settings.register_paths)
        .map_err(|e| CliError::data(e).with_hint("check register_paths in settings"))?;
    for (register, path) in &registers {
        println!(
            "register: {} waybill(s) ({})",
            register.row_count().saturating_sub(1),
            path.display()
        );
    }

    println!(
        "recipients: {} station(s) configured",
        settings.recipients.len()
    );
    println!("settings ok");
    Ok(())
}
