pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::RawInputs;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "fx-reimburse")]
#[command(about = "Recalculate a reimbursement after a currency change")]
pub struct CliConfig {
    #[arg(long, default_value = "", help = "Currency the plan was submitted in")]
    pub old_ccy: String,

    #[arg(long, default_value = "", help = "Currency the remaining balance is paid in")]
    pub new_ccy: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub original: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub reimbursed: String,

    #[arg(long, allow_hyphen_values = true, help = "Manual exchange rate; skips the live lookup")]
    pub fx: Option<String>,

    #[arg(long, default_value = "2", allow_hyphen_values = true)]
    pub decimals: String,

    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Directory holding the rate cache")]
    pub cache_dir: Option<String>,

    #[arg(long, help = "Keep cached rates in memory only")]
    pub no_cache: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔（沒有指定時用預設值），命令列的 --cache-dir 優先
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(cache_dir) = &self.cache_dir {
            config.cache.directory = Some(cache_dir.clone());
        }
        Ok(config)
    }

    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs {
            old_ccy: self.old_ccy.clone(),
            new_ccy: self.new_ccy.clone(),
            original: self.original.clone(),
            reimbursed: self.reimbursed.clone(),
            rate: self.fx.clone().unwrap_or_default(),
            decimals: self.decimals.clone(),
        }
    }
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::validate_non_empty_string;

        if let Some(path) = &self.config {
            validate_non_empty_string("config", path)?;
        }
        if let Some(cache_dir) = &self.cache_dir {
            validate_non_empty_string("cache_dir", cache_dir)?;
        }
        Ok(())
    }
}
