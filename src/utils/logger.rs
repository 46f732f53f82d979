use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌輸出格式：終端機用 compact，給其他工具收集時用 JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "fx_reimburse=debug,info"
    } else {
        "fx_reimburse=info"
    }
}

/// `RUST_LOG` 優先，未設定時依 verbose 決定等級
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// 日誌一律寫到 stderr，stdout 只留給計算結果
pub fn init_logger(verbose: bool, format: LogFormat) {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    match format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_debug_for_this_crate_only() {
        assert_eq!(default_directive(true), "fx_reimburse=debug,info");
        assert_eq!(default_directive(false), "fx_reimburse=info");
    }

    #[test]
    fn test_format_from_json_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Compact);
    }
}
