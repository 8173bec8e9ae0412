use log::LevelFilter;

pub struct Logger;

impl Logger {
    /// Installs the global colored logger. Third-party crates are capped at
    /// `warn` so request noise from the HTTP stack stays out of the way.
    pub fn init(level: LevelFilter) {
        let mut builder: env_logger::Builder = colog::default_builder();
        builder
            .filter_level(level.min(LevelFilter::Warn))
            .filter_module(env!("CARGO_CRATE_NAME"), level);

        if let Err(e) = builder.try_init() {
            eprintln!("logger already initialized: {}", e);
        }
    }
}
