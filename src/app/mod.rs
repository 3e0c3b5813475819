//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{
    load_configuration,
    configure_logging,
    build_collector_config
};
pub use execution::{
    collect,
    collect_with_cancellation,
    resolve_targets,
    run_collection,
    RunOutcome
};
