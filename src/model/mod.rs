pub use self::{
    entity::{ChefVersion, Entity, Listing, PartitionId},
    metric_result::MetricResult,
    pair::{FarmListItem, PairInfo},
};

mod entity;
mod metric_result;
mod pair;
