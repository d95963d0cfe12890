// Pure query composition: no I/O happens in here.
pub mod array_text;
pub mod filter;
pub mod pagination;

pub use filter::{build, build_by_id, link_base, BindValue, FilterField, FilterSpec, QueryPlan, StatementMode};
pub use pagination::{paginate, PageMeta, PageRequest};
