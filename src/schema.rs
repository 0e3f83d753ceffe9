/// Default column-name constants for phenokit tables.
/// Single source of truth - exported to Python via PyO3.

// ── Weather observation columns ─────────────────────────────────────────────
pub mod weather {
    pub const LOCATION: &str = "location";
    pub const YEAR: &str = "year";
    pub const TIME: &str = "time";
    pub const TEMPERATURE: &str = "temperature";

    pub const DEFAULT_GROUP_VARS: [&str; 2] = [LOCATION, YEAR];
}

// ── Daily resampling output ─────────────────────────────────────────────────
pub mod daily {
    pub const DATE: &str = "date";
}

// ── Derived unit columns ────────────────────────────────────────────────────
pub mod units {
    pub const GDU: &str = "gdu";
    pub const SDU: &str = "sdu";
    pub const CDU: &str = "cdu";

    pub const CUMULATIVE_PREFIX: &str = "cumulative_";
}

// ── Growth stage output ─────────────────────────────────────────────────────
pub mod stage {
    pub const GROWTH_STAGE: &str = "growth_stage";
}

/// Default name of the running-total column for `unit_col`.
pub fn cumulative_name(unit_col: &str) -> String {
    format!("{}{unit_col}", units::CUMULATIVE_PREFIX)
}
