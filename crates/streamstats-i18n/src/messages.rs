//! Typed message accessors over the Fluent resources.

use crate::loader::Localizer;
use fluent_bundle::FluentArgs;

/// Weekday message ids, Sunday first.
pub const WEEKDAY_MESSAGE_IDS: [&str; 7] = [
    "weekday-sun",
    "weekday-mon",
    "weekday-tue",
    "weekday-wed",
    "weekday-thu",
    "weekday-fri",
    "weekday-sat",
];

/// Every message id the application formats. Each locale must define all of
/// them.
pub const MESSAGE_IDS: &[&str] = &[
    "weekday-sun",
    "weekday-mon",
    "weekday-tue",
    "weekday-wed",
    "weekday-thu",
    "weekday-fri",
    "weekday-sat",
    "hour-label",
    "status-pending",
    "status-processing",
    "status-success",
    "status-error",
    "import-error-unreadable",
    "import-error-no-valid-records",
    "import-error-invalid-selection",
    "import-error-timeout",
    "import-error-cancelled",
    "import-error-not-pending",
    "import-no-data",
    "summary-title",
    "summary-total-streams",
    "summary-total-minutes",
    "summary-listening-hours",
    "summary-unique-tracks",
    "summary-unique-artists",
    "summary-top-tracks",
    "summary-top-artists",
    "summary-monthly",
    "summary-daily",
    "summary-hourly",
    "summary-weekday",
    "summary-plays",
    "summary-minutes",
    "filter-matching",
    "artwork-found",
    "artwork-none",
];

impl Localizer {
    /// Short weekday labels, Sunday first.
    pub fn weekday_labels(&self) -> [String; 7] {
        WEEKDAY_MESSAGE_IDS.map(|id| self.format(id, None))
    }

    /// Label of an hour-of-day slot, e.g. `7h`.
    pub fn hour_label(&self, hour: u32) -> String {
        let mut args = FluentArgs::new();
        args.set("hour", hour);
        self.format("hour-label", Some(&args))
    }

    /// Status text for a file that parsed into `count` records.
    pub fn status_success(&self, count: usize) -> String {
        let mut args = FluentArgs::new();
        args.set("count", count);
        self.format("status-success", Some(&args))
    }

    /// Status text for a failed file.
    pub fn status_error(&self, reason: &str) -> String {
        let mut args = FluentArgs::new();
        args.set("reason", reason);
        self.format("status-error", Some(&args))
    }

    /// `N plays`, pluralized.
    pub fn plays(&self, count: u64) -> String {
        let mut args = FluentArgs::new();
        args.set("count", count);
        self.format("summary-plays", Some(&args))
    }

    /// `N min`.
    pub fn minutes(&self, minutes: u64) -> String {
        let mut args = FluentArgs::new();
        args.set("minutes", minutes);
        self.format("summary-minutes", Some(&args))
    }

    /// `M of N plays match the filters`.
    pub fn filter_matching(&self, matching: usize, total: usize) -> String {
        let mut args = FluentArgs::new();
        args.set("matching", matching);
        args.set("total", total);
        self.format("filter-matching", Some(&args))
    }

    /// Line announcing a resolved image URL.
    pub fn artwork_found(&self, url: &str) -> String {
        let mut args = FluentArgs::new();
        args.set("url", url);
        self.format("artwork-found", Some(&args))
    }
}
