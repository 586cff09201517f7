use clap::Parser;
use vet_clinic::report::OutputFormat;
use vet_clinic::store::{StoreConfig, DEFAULT_DB_PATH};

#[derive(Parser, Debug)]
#[command(name = "vet-clinic")]
#[command(about = "Create, seed and exercise the veterinary clinic database")]
#[command(version)]
pub struct Cli {
    /// Database file (":memory:" for a throwaway store)
    #[arg(long, env = "VET_CLINIC_DB", default_value = DEFAULT_DB_PATH)]
    pub db: String,

    /// Drop the clinic tables before creating them
    #[arg(long)]
    pub fresh: bool,

    /// Output format: table or json
    #[arg(long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Skip application-side validation and rely on the store's constraints
    #[arg(long)]
    pub store_checks_only: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::new(self.db.clone());
        if self.store_checks_only {
            config.store_checks_only()
        } else {
            config
        }
    }
}
