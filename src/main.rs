//! vehpack - package loose GTA V vehicle mods into DLC archives
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse the command line
//! 2. Load `VehPack Data/VehPack Config.yaml` (defaults when missing) and apply flag overrides
//! 3. Initialize logging → `<log dir>/vehpack.<date>`
//! 4. Scan the input tree once and resolve entities and associations
//! 5. `scan`: print the per-entity classification and exit
//! 6. `pack`: drive the packager on a current-thread tokio runtime, then log the run summary

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use std::time::Duration;
use vehpack::cli::{Cli, Command, ScanArgs};
use vehpack::services::{
    DescriptorScanner, GtaUtilArchiver, PackageStatus, Packager, PackagerOptions, plan_entity,
    resolve,
};
use vehpack::{APP_NAME, ConfigManager, PackSettings, UserConfig, VERSION};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_manager = ConfigManager::new(&cli.config_dir);

    if let Some(Command::Init { force }) = cli.command {
        return init_config(&config_manager, force);
    }

    let mut settings = config_manager.load_user_config()?.settings;
    if cli.debug {
        settings.debug_mode = true;
    }
    match &cli.command {
        Some(Command::Scan(args)) => args.apply(&mut settings),
        Some(Command::Pack(args)) => args.apply(&mut settings),
        _ => {}
    }

    let _guard = vehpack::logging::setup_logging_with_console(
        Utf8Path::new(&settings.log_dir),
        APP_NAME,
        settings.debug_mode,
        true,
    )?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::debug!("Effective settings: {:?}", settings);

    match cli.command {
        Some(Command::Scan(args)) => report_scan(&settings, &args),
        _ => pack(&settings),
    }
}

fn init_config(config_manager: &ConfigManager, force: bool) -> Result<()> {
    if config_manager.config_path().exists() && !force {
        println!(
            "{} already exists; pass --force to overwrite it",
            config_manager.config_path()
        );
        return Ok(());
    }
    config_manager.save_user_config(&UserConfig::default())?;
    println!("Wrote default configuration to {}", config_manager.config_path());
    Ok(())
}

fn pack(settings: &PackSettings) -> Result<()> {
    let options = PackagerOptions::from(settings);
    let scan = DescriptorScanner::new().scan(&options.input_dir);
    let associations = resolve(&scan);

    if associations.entity_names.is_empty() {
        tracing::warn!("No vehicles.meta records found under {}", options.input_dir);
        return Ok(());
    }
    tracing::info!(
        "Found {} vehicle(s): {}",
        associations.entity_names.len(),
        associations.entity_names.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let archiver = GtaUtilArchiver::new(
        settings.archiver_path.as_str(),
        Duration::from_secs(settings.archiver_timeout),
    );
    let packager = Packager::new(options, archiver);
    let reports = runtime.block_on(packager.run(&scan, &associations));

    packager.metrics().log_summary();

    let failed: Vec<_> = reports.iter().filter(|r| !r.is_built()).collect();
    for report in &failed {
        let reason = match &report.status {
            PackageStatus::ArchiverFailed(reason) | PackageStatus::AssemblyFailed(reason) => reason,
            PackageStatus::Built => continue,
        };
        tracing::error!(
            "{} package for {} failed ({}): {}",
            report.kind,
            report.entity,
            report.package_dir,
            reason
        );
    }

    println!(
        "Packaged {} vehicle(s): {} package(s) built, {} failed",
        associations.entity_names.len(),
        reports.len() - failed.len(),
        failed.len()
    );
    Ok(())
}

fn report_scan(settings: &PackSettings, args: &ScanArgs) -> Result<()> {
    let input_dir = Utf8Path::new(&settings.input_dir);
    let scan = DescriptorScanner::new().scan(input_dir);
    let associations = resolve(&scan);

    println!(
        "{}: {} vehicles.meta, {} carcols.meta, {} vehicle(s)",
        input_dir,
        scan.vehicles.len(),
        scan.paints.len(),
        associations.entity_names.len()
    );

    let entities = associations
        .entity_names
        .iter()
        .filter(|name| args.entity.as_ref().is_none_or(|wanted| wanted == *name));

    for entity in entities {
        let plan = plan_entity(input_dir, &scan, &associations, entity);

        println!("\n{}", plan.entity);
        if !plan.mods.is_empty() {
            println!("  mods: {}", plan.mods.iter().cloned().collect::<Vec<_>>().join(", "));
        }
        if !plan.audio_hashes.is_empty() {
            println!("  audio hashes: {}", plan.audio_hashes.join(", "));
        }
        if plan.needs_audio_patch {
            println!("  audioNameHash would be filled with '{}'", entity.to_lowercase());
        }
        for (category, files) in &plan.categories {
            println!("  {} ({}):", category.label(), files.len());
            for file in files {
                let shown = file.strip_prefix(input_dir).unwrap_or(file);
                println!("    {}", shown);
            }
        }
    }

    Ok(())
}
