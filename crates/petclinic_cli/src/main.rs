//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration, open the database and bind the storage profile.
//! - Print a deterministic summary of what the bound backend can see.
//!
//! Usage: `petclinic_cli [config.toml]`. Without a path the defaults apply,
//! with `PETCLINIC_PROFILE` still honored.

use log::error;
use petclinic_core::{init_from_config, ClinicConfig, ClinicService, Repositories};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("petclinic: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ClinicConfig::load(&path)?,
        None => ClinicConfig::from_env()?,
    };
    init_from_config(&config.logging)?;

    let conn = config.open_database()?;
    let repos = Repositories::bind(config.profile, &conn);
    let clinic = ClinicService::new(&repos);

    println!("petclinic_core version={}", petclinic_core::core_version());
    println!("profile={}", clinic.profile());
    println!("owners={}", clinic.find_all_owners()?.len());
    println!("pets={}", clinic.find_all_pets()?.len());
    println!("vets={}", clinic.find_all_vets()?.len());
    println!("pet_types={}", clinic.find_pet_types()?.len());
    Ok(())
}
