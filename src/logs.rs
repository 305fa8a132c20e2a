use log::LevelFilter;
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}\n";

/// Logs Info and above to stderr. When `LOG_FILE_PATH` is set, Debug and
/// above also go to a size-rolled file archived via `LOG_ARCHIVE_PATTERN`.
pub fn init_logger() -> Result<(), Box<dyn std::error::Error>> {
    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let mut config = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(stderr_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Ok(file_path) = std::env::var("LOG_FILE_PATH") {
        let archive_pattern = std::env::var("LOG_ARCHIVE_PATTERN")
            .unwrap_or_else(|_| format!("{}.{{}}.gz", file_path));

        let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
        let roller = FixedWindowRoller::builder().build(&archive_pattern, LOG_FILE_COUNT)?;
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

        let logfile = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(file_path, Box::new(policy))?;

        config = config.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        );
        root = root.appender("logfile");
    }

    let config = config.build(root.build(LevelFilter::Debug))?;
    log4rs::init_config(config)?;
    Ok(())
}
