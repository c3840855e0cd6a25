//! Compiles the units `sqlcraft-codegen` emits for `manifest.toml`.
//!
//! `build.rs` generates the repository, builder and repository tests into
//! `OUT_DIR`; they are included here as modules, so `cargo test` both
//! type-checks the emitted source and runs the emitted tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: Decimal,
    pub tier: u16,
    pub opened: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: i64,
    pub manager: String,
}

pub mod account_builder {
    include!(concat!(env!("OUT_DIR"), "/account_builder.rs"));
}

pub mod account_repository {
    include!(concat!(env!("OUT_DIR"), "/account_repository.rs"));

}

pub mod branch_builder {
    include!(concat!(env!("OUT_DIR"), "/branch_builder.rs"));
}

pub mod branch_repository {
    include!(concat!(env!("OUT_DIR"), "/branch_repository.rs"));
}
