use log::LevelFilter;

/// `RUST_LOG` when set, otherwise `info`; `--verbose` forces `debug`.
pub fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp_secs().format_target(false).init();
}
