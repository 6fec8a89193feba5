use std::env;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
}

impl Level {
    fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" | "debug" => Self::Info,
            _ => Self::Warn,
        }
    }
}

static PGNSORT_LOG: LazyLock<Level> = LazyLock::new(|| {
    env::var("PGNSORT_LOG")
        .map(|s| Level::from_str(&s))
        .unwrap_or(Level::Warn)
});

macro_rules! log {
    ($level:expr, $prefix:expr, $msg:expr) => {
        if *PGNSORT_LOG >= $level {
            eprintln!(concat!($prefix, ": {}"), $msg.as_ref());
        }
    };
}

pub fn error(msg: impl AsRef<str>) {
    log!(Level::Error, "ERROR", msg);
}

pub fn warn(msg: impl AsRef<str>) {
    log!(Level::Warn, "WARN", msg);
}

pub fn info(msg: impl AsRef<str>) {
    log!(Level::Info, "INFO", msg);
}

#[cfg(test)]
mod tests {
    use super::Level;

    #[test]
    fn test_level_from_str_aliases() {
        assert_eq!(Level::from_str("err"), Level::Error);
        assert_eq!(Level::from_str("WARNING"), Level::Warn);
        assert_eq!(Level::from_str(" info "), Level::Info);
    }

    #[test]
    fn test_level_from_str_unknown_defaults_to_warn() {
        assert_eq!(Level::from_str("verbose"), Level::Warn);
        assert!(Level::Info > Level::Warn);
    }
}
