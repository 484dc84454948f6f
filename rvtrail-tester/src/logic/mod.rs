pub mod aggregate;
pub mod narrators;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use aggregate::{StrategyAggregate, aggregate_records};
pub use narrators::{NarratorKind, NarratorSource};
pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{DEFAULT_MAX_DAYS, RunRecord};
pub use tester::{BalanceTester, build_plan};
