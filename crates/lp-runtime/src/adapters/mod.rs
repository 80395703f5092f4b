pub mod ui;

pub use ui::LoggingReadinessUi;
