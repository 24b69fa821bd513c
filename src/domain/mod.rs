mod alerts;
mod bucket;
mod calendar;
mod filter;
mod growth;
mod kpi;
mod money;
mod record;

pub use alerts::*;
pub use bucket::*;
pub use calendar::*;
pub use filter::*;
pub use growth::*;
pub use kpi::*;
pub use money::*;
pub use record::*;
