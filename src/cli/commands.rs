// ============================================================
// Layer 1 — CLI Methods
// ============================================================
// The positional `method` argument and what each one means.
//
// clap's ValueEnum derive generates the accepted values
// (`server`, `seeddb`, `analyze`) and the error message for
// anything else.
//
// Reference: Rust Book §12 (Building a CLI Program)
//            clap documentation (ValueEnum)

use clap::ValueEnum;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Run the visualisation server (served by the separate front-end)
    Server,

    /// Initialise the database from config/db/sp.yml
    Seeddb,

    /// Summarise recorded hidden states per config/analysis.yml
    Analyze,
}
